//! Outbound HTTP transport
//!
//! `enqueue_post` returns immediately; the request runs on the tokio runtime
//! captured at construction and its outcome is handed to the completion
//! callback. Nothing awaits the callback, and it may run long after later
//! deposits have been credited.

use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tokio::runtime::Handle;

/// A POST to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    /// Endpoint
    pub url: String,

    /// JSON body
    pub body: String,

    /// Extra headers (`Content-Type: application/json` is always sent)
    pub headers: Vec<(String, String)>,
}

/// What the endpoint answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

impl WebhookResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Invoked once with the outcome of a submitted request
pub type CompletionCallback = Box<dyn FnOnce(Result<WebhookResponse>) + Send + 'static>;

/// Fire-and-forget POST submission
pub trait WebhookTransport: Send + Sync {
    /// Submit `request` without waiting; `on_complete` receives the outcome
    fn enqueue_post(&self, request: WebhookRequest, on_complete: CompletionCallback);
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    runtime: Handle,
}

impl HttpTransport {
    /// Create a transport on the current tokio runtime
    pub fn new(timeout: Duration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        Self::with_runtime(timeout, runtime)
    }

    /// Create a transport that submits on `runtime`
    pub fn with_runtime(timeout: Duration, runtime: Handle) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, runtime })
    }

    async fn post(client: Client, request: WebhookRequest) -> Result<WebhookResponse> {
        let headers = build_headers(&request.headers)?;

        let response = client
            .post(&request.url)
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(WebhookResponse { status, body })
    }
}

impl WebhookTransport for HttpTransport {
    fn enqueue_post(&self, request: WebhookRequest, on_complete: CompletionCallback) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let outcome = HttpTransport::post(client, request).await;
            on_complete(outcome);
        });
    }
}

fn build_headers(extra: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(name.to_string()))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_headers() {
        let headers = build_headers(&[("X-Token".to_string(), "abc".to_string())]).unwrap();

        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get("x-token").unwrap(), "abc");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let err = build_headers(&[("bad header".to_string(), "v".to_string())]).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));

        let err = build_headers(&[("X-Ok".to_string(), "line\nbreak".to_string())]).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(matches!(
            HttpTransport::new(Duration::from_secs(1)),
            Err(Error::Runtime(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_error() {
        let transport = HttpTransport::new(Duration::from_millis(500)).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        transport.enqueue_post(
            WebhookRequest {
                // Port 9 (discard) on loopback is closed in test environments.
                url: "http://127.0.0.1:9/hook".to_string(),
                body: "{}".to_string(),
                headers: Vec::new(),
            },
            Box::new(move |outcome| {
                let _ = tx.send(outcome.is_err());
            }),
        );

        assert!(rx.await.unwrap());
    }

    #[test]
    fn test_response_success_range() {
        let ok = WebhookResponse { status: 204, body: String::new() };
        let bad = WebhookResponse { status: 429, body: String::new() };

        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}

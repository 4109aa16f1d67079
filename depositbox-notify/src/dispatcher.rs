//! Best-effort notification of credited deposits
//!
//! The ledger is already committed when `notify` runs. Delivery failures are
//! logged and counted, never retried, and never reported back to the credit
//! path.

use crate::transport::{WebhookRequest, WebhookResponse, WebhookTransport};
use crate::Result;
use depositbox_ledger::{DepositorId, WebhookConfig};
use prometheus::IntCounter;
use serde::Serialize;
use std::sync::Arc;

/// Message body, compatible with common chat webhooks
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Configured endpoint
#[derive(Debug, Clone)]
struct Endpoint {
    url: String,
    username: Option<String>,
    headers: Vec<(String, String)>,
}

/// Sends one webhook per credited deposit
pub struct NotificationDispatcher {
    endpoint: Option<Endpoint>,
    transport: Option<Arc<dyn WebhookTransport>>,
    failures: Option<IntCounter>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("endpoint", &self.endpoint)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl NotificationDispatcher {
    /// Dispatcher for `config`; without a URL every `notify` is a no-op
    pub fn new(config: &WebhookConfig, transport: Arc<dyn WebhookTransport>) -> Self {
        let endpoint = config.url.as_ref().map(|url| Endpoint {
            url: url.clone(),
            username: config.username.clone(),
            headers: config
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        });

        Self {
            endpoint,
            transport: Some(transport),
            failures: None,
        }
    }

    /// Dispatcher that never sends
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            transport: None,
            failures: None,
        }
    }

    /// Count failed deliveries on `counter`
    pub fn with_failure_counter(mut self, counter: IntCounter) -> Self {
        self.failures = Some(counter);
        self
    }

    /// True if an endpoint and transport are configured
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some() && self.transport.is_some()
    }

    /// Report a credited deposit; returns immediately
    pub fn notify(&self, depositor: &DepositorId, amount: u64, new_total: u64) {
        let (endpoint, transport) = match (&self.endpoint, &self.transport) {
            (Some(endpoint), Some(transport)) => (endpoint, transport),
            _ => return,
        };

        let body = match compose_body(endpoint, depositor, amount, new_total) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%depositor, error = %e, "Could not compose deposit notification");
                return;
            }
        };

        let request = WebhookRequest {
            url: endpoint.url.clone(),
            body,
            headers: endpoint.headers.clone(),
        };

        let failures = self.failures.clone();
        let depositor = depositor.clone();

        transport.enqueue_post(
            request,
            Box::new(move |outcome: Result<WebhookResponse>| match outcome {
                Ok(response) if response.is_success() => {
                    tracing::debug!(%depositor, status = response.status, "Deposit notification delivered");
                }
                Ok(response) => {
                    let err = crate::Error::Status {
                        status: response.status,
                        body: response.body,
                    };
                    tracing::warn!(%depositor, error = %err, "Deposit notification rejected");
                    if let Some(failures) = failures {
                        failures.inc();
                    }
                }
                Err(e) => {
                    tracing::warn!(%depositor, error = %e, "Deposit notification failed");
                    if let Some(failures) = failures {
                        failures.inc();
                    }
                }
            }),
        );
    }
}

fn compose_body(
    endpoint: &Endpoint,
    depositor: &DepositorId,
    amount: u64,
    new_total: u64,
) -> Result<String> {
    let message = WebhookMessage {
        content: format!(
            "Deposit recorded: {} deposited {} (total {})",
            depositor, amount, new_total
        ),
        username: endpoint.username.as_deref(),
    };
    Ok(serde_json::to_string(&message)?)
}

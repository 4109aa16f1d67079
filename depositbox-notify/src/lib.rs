//! DepositBox Notifications
//!
//! Fire-and-forget webhook delivery for credited deposits.
//!
//! - [`NotificationDispatcher`] composes one message per credited deposit and
//!   hands it to a transport; it is a no-op without a configured endpoint.
//! - [`WebhookTransport`] submits a POST and reports its outcome through a
//!   completion callback; [`HttpTransport`] implements it with `reqwest` on
//!   tokio.
//!
//! Delivery outcomes are only logged. The ledger never waits on, or learns
//! about, a notification.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod dispatcher;
pub mod error;
pub mod transport;

// Re-exports
pub use dispatcher::NotificationDispatcher;
pub use error::{Error, Result};
pub use transport::{
    CompletionCallback, HttpTransport, WebhookRequest, WebhookResponse, WebhookTransport,
};

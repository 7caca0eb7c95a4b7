//! Cart service errors.
//!
//! These never cross the facade: [`crate::CartFacade`] reduces every
//! variant to a `{success: false, message}` result.

use reqwest::StatusCode;
use storecart_core::EntryKey;
use thiserror::Error;

/// Errors that can occur when talking to the cart service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response reached us (connection, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Cart service rejected the request ({status}){}", format_message(.message.as_deref()))]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },

    /// A cart body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A mutation named a line the account cart does not hold.
    #[error("No cart line matches {0}")]
    LineNotFound(EntryKey),

    /// A remote call was attempted without an authenticated session.
    #[error("No authenticated session")]
    Unauthenticated,

    /// The session changed while a fetch was in flight; its result was
    /// discarded.
    #[error("Session changed during fetch")]
    SessionChanged,
}

impl GatewayError {
    /// Message suitable for showing to the shopper, if the error carries one.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::LineNotFound(_) => Some("Item not found in cart".to_string()),
            Self::Transport(_) | Self::Parse(_) | Self::Unauthenticated | Self::SessionChanged => {
                None
            }
        }
    }
}

fn format_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(": {m}"))
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": "..."}`, `{"error": "..."}` and `{"detail": "..."}`.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|field| value.get(field).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
}

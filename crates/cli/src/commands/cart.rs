//! Cart commands.
//!
//! # Environment Variables
//!
//! - `STORECART_API_URL` - Cart service base URL (required)
//! - `STORECART_STORAGE_DIR` - Where the guest cart is kept (default `.storecart`)
//! - `STORECART_ACCESS_TOKEN` - Bearer token; selects the account cart when set
//! - `STORECART_CACHE_TTL_SECS` - Account cart cache lifetime (default 300)
//! - `STORECART_HTTP_TIMEOUT_SECS` - Optional request timeout

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use storecart::{
    CartConfig, CartFacade, CartInput, CartResult, CartView, ConfigError, GatewayError,
    SessionHandle,
};
use storecart_core::EntryKey;
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cart engine could not be started.
    #[error("Failed to start cart engine: {0}")]
    Engine(#[from] GatewayError),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The cart rejected the mutation.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a CartResult>,
    cart: &'a CartView,
}

/// Build the facade, signed in when a token is given or configured.
pub fn open(token: Option<String>) -> Result<CartFacade, CommandError> {
    let config = CartConfig::from_env()?;

    let token = token
        .map(SecretString::from)
        .or_else(|| config.access_token.clone());

    let session = match token {
        Some(token) => {
            tracing::info!("Using account cart");
            SessionHandle::authenticated(token)
        }
        None => {
            tracing::info!(dir = %config.storage_dir.display(), "Using guest cart");
            SessionHandle::guest()
        }
    };

    Ok(CartFacade::new(&config, Arc::new(session))?)
}

/// Print the current cart.
pub async fn show(facade: &CartFacade) -> Result<(), CommandError> {
    let view = facade.refresh().await;
    print(&Output {
        result: None,
        cart: &view,
    })
}

/// Add an item.
pub async fn add(
    facade: &CartFacade,
    input: CartInput,
    quantity: u32,
) -> Result<(), CommandError> {
    let result = facade.add_to_cart(input, quantity).await;
    report(facade, &result).await
}

/// Set a line's quantity.
pub async fn update(
    facade: &CartFacade,
    key: EntryKey,
    quantity: i64,
) -> Result<(), CommandError> {
    let result = facade.update_cart_item(key, quantity).await;
    report(facade, &result).await
}

/// Remove a line.
pub async fn remove(facade: &CartFacade, key: EntryKey) -> Result<(), CommandError> {
    let result = facade.remove_from_cart(key).await;
    report(facade, &result).await
}

/// Empty the cart.
pub async fn clear(facade: &CartFacade) -> Result<(), CommandError> {
    let result = facade.clear_cart().await;
    report(facade, &result).await
}

/// Print the outcome with the settled cart, failing the command if the
/// mutation was rejected.
async fn report(facade: &CartFacade, result: &CartResult) -> Result<(), CommandError> {
    let view = facade.refresh().await;
    print(&Output {
        result: Some(result),
        cart: &view,
    })?;

    if result.success {
        Ok(())
    } else {
        Err(CommandError::Rejected(result.message.clone().unwrap_or_default()))
    }
}

#[allow(clippy::print_stdout)]
fn print(output: &Output<'_>) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

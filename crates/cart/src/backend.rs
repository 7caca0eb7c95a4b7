//! One capability interface over the guest and account carts.

use std::convert::Infallible;
use std::future::Future;

use storecart_core::EntryKey;
use tracing::debug;

use crate::error::GatewayError;
use crate::local::{LocalBackend, add_local, clear_local, remove_local, update_local};
use crate::normalize::{CartInput, to_local_merchandise, to_remote_payload};
use crate::remote::CartGateway;
use crate::view::CartView;

/// Cart mutations and the current projection, whichever backend holds the cart.
///
/// Keys come from [`CartView`] entries. A key that matches no line is a
/// no-op for the guest cart and an error for the account cart.
pub trait CartBackend {
    type Error: std::error::Error;

    /// Add `quantity` units of `input`. Zero adds nothing.
    fn add(
        &self,
        input: &CartInput,
        quantity: u32,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Set the quantity of a line. Zero or below removes it.
    fn update(
        &self,
        key: EntryKey,
        quantity: i64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Remove a line.
    fn remove(&self, key: EntryKey) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Remove every line.
    fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// What the backend currently holds, as a view.
    fn snapshot(&self) -> CartView;
}

impl CartBackend for LocalBackend {
    type Error = Infallible;

    async fn add(&self, input: &CartInput, quantity: u32) -> Result<(), Infallible> {
        let merchandise = to_local_merchandise(input);
        self.apply(|cart| add_local(cart, merchandise, quantity));
        Ok(())
    }

    async fn update(&self, key: EntryKey, quantity: i64) -> Result<(), Infallible> {
        match key {
            EntryKey::Item(item_key) => {
                self.apply(|cart| update_local(cart, item_key, quantity));
            }
            EntryKey::Line(id) => debug!(line_id = %id, "Line key ignored by guest cart"),
        }
        Ok(())
    }

    async fn remove(&self, key: EntryKey) -> Result<(), Infallible> {
        match key {
            EntryKey::Item(item_key) => {
                self.apply(|cart| remove_local(cart, item_key));
            }
            EntryKey::Line(id) => debug!(line_id = %id, "Line key ignored by guest cart"),
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), Infallible> {
        self.apply(clear_local);
        Ok(())
    }

    fn snapshot(&self) -> CartView {
        self.observe(CartView::from_guest)
    }
}

impl CartBackend for CartGateway {
    type Error = GatewayError;

    async fn add(&self, input: &CartInput, quantity: u32) -> Result<(), GatewayError> {
        if quantity == 0 {
            return Ok(());
        }
        self.add_line(&to_remote_payload(input, quantity)).await
    }

    async fn update(&self, key: EntryKey, quantity: i64) -> Result<(), GatewayError> {
        let id = self.resolve_line(key).await?;
        if quantity <= 0 {
            return self.remove_line(id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.update_line(id, quantity).await
    }

    async fn remove(&self, key: EntryKey) -> Result<(), GatewayError> {
        let id = self.resolve_line(key).await?;
        self.remove_line(id).await
    }

    async fn clear(&self) -> Result<(), GatewayError> {
        self.clear_cart().await
    }

    fn snapshot(&self) -> CartView {
        CartView::from_account(self.cache().last_known().as_ref(), false)
    }
}

/// The backend selected for one call.
#[derive(Debug, Clone, Copy)]
pub enum Backend<'a> {
    /// No authenticated session: the device-persisted guest cart.
    Local(&'a LocalBackend),
    /// Authenticated: the account cart behind the cart service.
    Remote(&'a CartGateway),
}

impl Backend<'_> {
    /// View of whatever the selected backend holds.
    #[must_use]
    pub fn snapshot(&self) -> CartView {
        match self {
            Self::Local(local) => CartBackend::snapshot(*local),
            Self::Remote(gateway) => CartBackend::snapshot(*gateway),
        }
    }
}

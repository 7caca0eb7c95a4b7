//! The cart facade.
//!
//! Consumers talk only to [`CartFacade`]. Each call asks the session whether
//! someone is signed in and dispatches to the guest cart or the account cart.
//! Failures are reported as a [`CartResult`], never raised.
//!
//! The current [`CartView`] is published on a `watch` channel. Guest
//! mutations publish the new view immediately. Account mutations only
//! invalidate the cached cart and start a background refetch; the view
//! changes when that refetch lands.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use storecart_core::EntryKey;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, CartBackend};
use crate::config::CartConfig;
use crate::error::GatewayError;
use crate::local::{FileStore, LocalBackend};
use crate::normalize::CartInput;
use crate::remote::CartGateway;
use crate::session::AuthSession;
use crate::view::CartView;

const ADD_FAILED: &str = "Failed to add item";
const UPDATE_FAILED: &str = "Failed to update item";
const REMOVE_FAILED: &str = "Failed to remove item";
const CLEAR_FAILED: &str = "Failed to clear cart";

/// Outcome of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CartResult {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// CartFacade
// =============================================================================

/// Single entry point for cart operations.
///
/// Cheap to clone; clones share both backends and the published view.
#[derive(Clone)]
pub struct CartFacade {
    inner: Arc<FacadeInner>,
}

struct FacadeInner {
    local: LocalBackend,
    gateway: CartGateway,
    session: Arc<dyn AuthSession>,
    view: watch::Sender<CartView>,
    seen_generation: AtomicU64,
}

impl CartFacade {
    /// Build a facade from configuration, with the guest cart stored on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CartConfig, session: Arc<dyn AuthSession>) -> Result<Self, GatewayError> {
        let store = Arc::new(FileStore::new(&config.storage_dir));
        let gateway = CartGateway::new(&config.service, Arc::clone(&session))?;
        Ok(Self::with_parts(LocalBackend::open(store), gateway, session))
    }

    /// Build a facade from already constructed backends.
    #[must_use]
    pub fn with_parts(
        local: LocalBackend,
        gateway: CartGateway,
        session: Arc<dyn AuthSession>,
    ) -> Self {
        let initial = if session.is_authenticated() {
            Backend::Remote(&gateway)
        } else {
            Backend::Local(&local)
        };
        let (view, _) = watch::channel(initial.snapshot());

        Self {
            inner: Arc::new(FacadeInner {
                seen_generation: AtomicU64::new(session.generation()),
                local,
                gateway,
                session,
                view,
            }),
        }
    }

    /// The latest published view.
    #[must_use]
    pub fn view(&self) -> CartView {
        self.inner.view.borrow().clone()
    }

    /// Subscribe to view changes.
    ///
    /// Mounting a consumer always refetches the account cart, so a cart
    /// cached for another session is never shown. The refetch runs in the
    /// background; the receiver sees `is_loading` flip back when it lands.
    pub async fn subscribe(&self) -> watch::Receiver<CartView> {
        let receiver = self.inner.view.subscribe();
        if let Backend::Remote(gateway) = self.backend().await {
            gateway.cache().invalidate().await;
            self.start_refetch();
        } else {
            self.publish_guest();
        }
        receiver
    }

    /// Refetch the account cart (or re-read the guest cart) and wait for the
    /// result.
    pub async fn refresh(&self) -> CartView {
        if let Backend::Remote(gateway) = self.backend().await {
            gateway.cache().invalidate().await;
            self.publish(CartBackend::snapshot(gateway).loading(true));
            self.refetch(self.inner.session.generation()).await;
        } else {
            self.publish_guest();
        }
        self.view()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of a product or album.
    #[instrument(skip(self, input), fields(item_type = %input.item_type()))]
    pub async fn add_to_cart(&self, input: CartInput, quantity: u32) -> CartResult {
        match self.backend().await {
            Backend::Local(local) => {
                let Ok(()) = local.add(&input, quantity).await;
                self.publish_guest();
                CartResult::ok()
            }
            Backend::Remote(gateway) => {
                self.finish_remote(gateway.add(&input, quantity).await, ADD_FAILED)
            }
        }
    }

    /// Set the quantity of the line identified by `key`. Zero or below removes it.
    #[instrument(skip(self))]
    pub async fn update_cart_item(&self, key: EntryKey, quantity: i64) -> CartResult {
        match self.backend().await {
            Backend::Local(local) => {
                let Ok(()) = local.update(key, quantity).await;
                self.publish_guest();
                CartResult::ok()
            }
            Backend::Remote(gateway) => {
                self.finish_remote(gateway.update(key, quantity).await, UPDATE_FAILED)
            }
        }
    }

    /// Remove the line identified by `key`.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, key: EntryKey) -> CartResult {
        match self.backend().await {
            Backend::Local(local) => {
                let Ok(()) = local.remove(key).await;
                self.publish_guest();
                CartResult::ok()
            }
            Backend::Remote(gateway) => {
                self.finish_remote(gateway.remove(key).await, REMOVE_FAILED)
            }
        }
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> CartResult {
        match self.backend().await {
            Backend::Local(local) => {
                let Ok(()) = local.clear().await;
                self.publish_guest();
                CartResult::ok()
            }
            Backend::Remote(gateway) => self.finish_remote(gateway.clear().await, CLEAR_FAILED),
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Pick the backend for this call, handling a session change first.
    async fn backend(&self) -> Backend<'_> {
        self.sync_session().await;
        if self.inner.session.is_authenticated() {
            Backend::Remote(&self.inner.gateway)
        } else {
            Backend::Local(&self.inner.local)
        }
    }

    /// Drop account state left over from a previous session.
    async fn sync_session(&self) {
        let generation = self.inner.session.generation();
        let previous = self.inner.seen_generation.swap(generation, Ordering::SeqCst);
        if previous == generation {
            return;
        }

        self.inner.gateway.cache().reset().await;

        let authenticated = self.inner.session.is_authenticated();
        info!(authenticated, "Session changed; cached account cart dropped");

        if authenticated {
            let guest_lines = self.inner.local.observe(|cart| cart.items.len());
            if guest_lines > 0 {
                info!(
                    guest_lines,
                    "Signed in with a non-empty guest cart; guest lines stay on this device"
                );
            }
            self.publish(CartView::from_account(None, false));
        } else {
            self.publish_guest();
        }
    }

    fn finish_remote(&self, result: Result<(), GatewayError>, fallback: &str) -> CartResult {
        match result {
            Ok(()) => {
                self.start_refetch();
                CartResult::ok()
            }
            Err(e) => {
                warn!(error = %e, "Account cart mutation failed");
                CartResult::failed(e.user_message().unwrap_or_else(|| fallback.to_string()))
            }
        }
    }

    // =========================================================================
    // View publishing
    // =========================================================================

    fn publish(&self, view: CartView) {
        self.inner.view.send_replace(view);
    }

    /// Publish the guest cart, ordered with respect to guest mutations.
    fn publish_guest(&self) {
        self.inner
            .local
            .observe(|cart| self.publish(CartView::from_guest(cart)));
    }

    /// Mark the view loading and refetch the account cart in the background.
    ///
    /// The task is detached and completes even if the caller goes away.
    fn start_refetch(&self) {
        self.publish(CartBackend::snapshot(&self.inner.gateway).loading(true));

        let facade = self.clone();
        let generation = self.inner.session.generation();
        tokio::spawn(async move {
            facade.refetch(generation).await;
        });
    }

    /// Fetch the account cart and publish it, unless the session changed in
    /// the meantime.
    async fn refetch(&self, generation: u64) {
        let result = self.inner.gateway.read_cart().await;

        let session = &self.inner.session;
        if !session.is_authenticated() || session.generation() != generation {
            debug!("Session changed during refetch; discarding result");
            return;
        }

        match result {
            Ok(cart) => self.publish(CartView::from_account(Some(&cart), false)),
            Err(e) => {
                warn!(error = %e, "Failed to refresh account cart");
                self.publish(CartBackend::snapshot(&self.inner.gateway));
            }
        }
    }
}

impl std::fmt::Debug for CartFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartFacade")
            .field("authenticated", &self.inner.session.is_authenticated())
            .field("gateway", &self.inner.gateway)
            .finish_non_exhaustive()
    }
}

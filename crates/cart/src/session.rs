//! Authentication signal consumed by the cart engine.
//!
//! The engine never authenticates anyone. It asks one question on every
//! call - "is there an authenticated session right now?" - and, for the
//! account cart, needs the session's bearer token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;

/// Source of the current authentication state.
pub trait AuthSession: Send + Sync {
    /// Whether an authenticated session exists. Evaluated fresh on every call.
    fn is_authenticated(&self) -> bool;

    /// Bearer token for the cart service.
    fn access_token(&self) -> Option<SecretString>;

    /// Counter that changes whenever the session changes hands.
    ///
    /// Used to drop a cached account cart that belongs to a previous session.
    fn generation(&self) -> u64 {
        0
    }
}

/// Shared, mutable session state.
///
/// Clones share the same session; sign-in on one clone is seen by all.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    token: RwLock<Option<SecretString>>,
    generation: AtomicU64,
}

impl SessionHandle {
    /// A signed-out session.
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    /// A session signed in with `token`.
    #[must_use]
    pub fn authenticated(token: SecretString) -> Self {
        let handle = Self::default();
        handle.sign_in(token);
        handle
    }

    /// Start an authenticated session.
    pub fn sign_in(&self, token: SecretString) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// End the authenticated session.
    pub fn sign_out(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("authenticated", &self.is_authenticated())
            .field("generation", &self.generation())
            .finish()
    }
}

impl AuthSession for SessionHandle {
    fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn access_token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }
}

//! Storecart - dual-backend shopping cart engine.
//!
//! A shopper's cart lives in one of two places depending on whether they are
//! signed in:
//!
//! - guests get a cart persisted on the device ([`local`])
//! - signed-in shoppers get the account cart held by the cart service,
//!   read through a cache ([`remote`])
//!
//! [`CartFacade`] hides the difference. It evaluates the session on every
//! call, dispatches to the right backend and publishes a [`CartView`] that
//! looks the same either way.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`session`] - Authentication signal
//! - [`local`] - Guest cart algebra and storage
//! - [`remote`] - Account cart gateway and cache
//! - [`normalize`] - Shape conversions between consumers and backends
//! - [`backend`] - Capability trait shared by both backends
//! - [`view`] - Display projection
//! - [`facade`] - The single entry point

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod facade;
pub mod local;
pub mod normalize;
pub mod remote;
pub mod session;
pub mod view;

pub use backend::{Backend, CartBackend};
pub use config::{CartConfig, CartServiceConfig, ConfigError};
pub use error::GatewayError;
pub use facade::{CartFacade, CartResult};
pub use local::{CartStore, FileStore, LocalBackend, MemoryStore, StoreError};
pub use normalize::CartInput;
pub use remote::{CartCache, CartGateway};
pub use session::{AuthSession, SessionHandle};
pub use view::{CartEntry, CartView};

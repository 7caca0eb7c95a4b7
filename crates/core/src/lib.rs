//! storecart core - shared cart types.
//!
//! This crate provides the data model used by every storecart component:
//! - `storecart` - the dual-backend cart engine (guest + account carts)
//! - `storecart-cli` - command-line front end for the engine
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, pricing, line items, cart state and entry keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

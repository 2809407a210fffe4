//! Phanto storefront client library.
//!
//! Typed access to the Phanto REST backend: catalog browsing with caching,
//! a cart synchronizer with optimistic updates and rollback, session auth,
//! order history and checkout.
//!
//! [`Storefront`] wires every service over one backend session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orders;
pub mod state;

pub use error::{AppError, Result, ValidationError};
pub use state::Storefront;

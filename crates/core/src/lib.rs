//! Phanto Core - Shared domain types.
//!
//! This crate provides the plain types shared by the Phanto crates:
//! - `storefront` - REST client, catalog cache and cart synchronizer
//! - `cli` - Command-line front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no async runtime. This keeps it usable from any layer.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, quantities, emails and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

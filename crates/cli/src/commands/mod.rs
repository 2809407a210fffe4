//! Command implementations.
//!
//! Data goes to stdout; progress and errors go through `tracing` (stderr).

pub mod cart;
pub mod catalog;
pub mod orders;

use phanto_storefront::AppError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A storefront operation failed.
    #[error(transparent)]
    Storefront(#[from] AppError),

    /// A local file could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

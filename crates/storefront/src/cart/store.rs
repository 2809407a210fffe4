//! Persistence port for the cart mirror.
//!
//! The stored copy only gives a restarted client something to show before
//! the first fetch completes. It is never authoritative: the synchronizer
//! overwrites it after every reconciliation and drops it on logout.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use phanto_core::CartId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::api::Cart;

/// Errors that can occur while persisting the mirror.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A persisted mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCart {
    /// Server id of the cart, when known.
    pub cart_id: Option<CartId>,
    pub cart: Cart,
    pub saved_at: DateTime<Utc>,
}

impl PersistedCart {
    /// Stamp a cart with the current time.
    #[must_use]
    pub fn now(cart: Cart) -> Self {
        Self {
            cart_id: cart.id,
            cart,
            saved_at: Utc::now(),
        }
    }
}

/// Storage for the cart mirror.
///
/// Every call is synchronous and made while the synchronizer holds its mirror
/// lock, from inside async cart operations. That keeps saves ordered with
/// [`CartStore::clear`] on logout, but it also blocks a runtime worker for the
/// duration of the call. Implementations must stay cheap: a small local file
/// or memory, never a network round trip.
pub trait CartStore: Send + Sync {
    /// Read the last saved mirror, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or decoded.
    fn load(&self) -> Result<Option<PersistedCart>, StoreError>;

    /// Replace the saved mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, cart: &PersistedCart) -> Result<(), StoreError>;

    /// Forget the saved mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    /// Store the mirror at `path`; parent directories are created on save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the mirror file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for FileCartStore {
    fn load(&self) -> Result<Option<PersistedCart>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(cart)?)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), items = cart.cart.items.len(), "Saved cart mirror");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    slot: Mutex<Option<PersistedCart>>,
}

impl MemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Option<PersistedCart>, StoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, cart: &PersistedCart) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(cart.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

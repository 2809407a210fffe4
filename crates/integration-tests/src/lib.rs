//! Integration tests for Phanto.
//!
//! Every test runs the real client against a `wiremock` backend, so nothing
//! external is needed:
//!
//! ```bash
//! cargo test -p phanto-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart synchronizer: optimistic writes, rollback, ordering
//! - `auth` - Login, registration, logout and the cart's reaction to them
//! - `catalog` - Catalog caching
//! - `orders` - Order history and checkout

use std::sync::Arc;
use std::time::Duration;

use phanto_storefront::Storefront;
use phanto_storefront::cart::{CartStore, MemoryCartStore};
use phanto_storefront::config::StorefrontConfig;
use serde_json::{Value, json};
use wiremock::MockServer;

/// A mock backend and a client wired to it.
pub struct TestContext {
    pub server: MockServer,
    pub storefront: Storefront,
    pub store: Arc<MemoryCartStore>,
}

impl TestContext {
    /// Start a mock backend and an anonymous client with an in-memory store.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    pub async fn new() -> Self {
        Self::with_vars(&[]).await
    }

    /// Like [`TestContext::new`] with extra configuration variables.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid or the client cannot be built.
    pub async fn with_vars(vars: &[(&str, &str)]) -> Self {
        let server = MockServer::start().await;
        let config = config_for(&server.uri(), vars);
        let store = Arc::new(MemoryCartStore::new());
        let storefront = Storefront::with_store(config, store.clone() as Arc<dyn CartStore>)
            .expect("Failed to build storefront");
        Self {
            server,
            storefront,
            store,
        }
    }
}

/// Configuration pointing at `uri`, with the file mirror disabled.
///
/// # Panics
///
/// Panics if the variables do not form a valid configuration.
#[must_use]
pub fn config_for(uri: &str, vars: &[(&str, &str)]) -> StorefrontConfig {
    let uri = uri.to_string();
    let extra: Vec<(String, String)> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    StorefrontConfig::from_vars(|key| {
        if let Some((_, value)) = extra.iter().find(|(k, _)| k == key) {
            return Some(value.clone());
        }
        match key {
            "PHANTO_API_URL" => Some(uri.clone()),
            "PHANTO_CART_MIRROR_PATH" => Some(String::new()),
            _ => None,
        }
    })
    .expect("Invalid test configuration")
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

// =============================================================================
// Fixtures
// =============================================================================

/// A product as the backend serializes it.
#[must_use]
pub fn product_json(id: i64, name: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": "",
        "price": price,
        "final_price": price,
        "stock": 10,
        "category": {"id": 1, "name": "Polos", "slug": "polos"},
        "image": null
    })
}

/// A cart line with an embedded product.
#[must_use]
pub fn line_json(id: i64, product_id: i64, quantity: u32, price: &str) -> Value {
    json!({
        "id": id,
        "product": product_json(product_id, &format!("Producto {product_id}"), price),
        "quantity": quantity
    })
}

/// A full cart.
#[must_use]
pub fn cart_json(lines: &[Value], total_items: u32, total_price: &str) -> Value {
    json!({
        "id": 1,
        "items": lines,
        "total_items": total_items,
        "total_price": total_price
    })
}

/// The cart with one line of two units at 100.
#[must_use]
pub fn two_units_cart() -> Value {
    cart_json(&[line_json(1, 5, 2, "100.00")], 2, "200.00")
}

//! Client state shared across commands.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::{ApiClient, User};
use crate::auth::{AuthEvents, AuthService, SessionCredentials};
use crate::cart::{CartStore, CartSynchronizer, FileCartStore, MemoryCartStore};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::orders::{Checkout, Orders};

/// Every storefront service over one backend session.
///
/// This struct is cheaply cloneable via `Arc`. The cart synchronizer follows
/// the session's auth events for as long as the last clone is alive.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    auth: AuthService,
    cart: CartSynchronizer,
    catalog: Catalog,
    orders: Orders,
    checkout: Checkout,
    cart_listener: JoinHandle<()>,
}

impl Drop for StorefrontInner {
    fn drop(&mut self) {
        self.cart_listener.abort();
    }
}

impl Storefront {
    /// Build the services, persisting the cart mirror where the config says.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let store: Arc<dyn CartStore> = match &config.cart_mirror_path {
            Some(path) => Arc::new(FileCartStore::new(path)),
            None => Arc::new(MemoryCartStore::new()),
        };
        Self::with_store(config, store)
    }

    /// Build the services over an explicit cart store.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_store(config: StorefrontConfig, store: Arc<dyn CartStore>) -> Result<Self> {
        let credentials = Arc::new(
            config
                .api
                .token
                .clone()
                .map_or_else(SessionCredentials::new, SessionCredentials::with_token),
        );
        let api = ApiClient::new(&config.api, credentials.clone())?;
        let events = AuthEvents::default();

        let auth = AuthService::new(api.clone(), credentials, events.clone());
        let cart = CartSynchronizer::new(api.clone(), store);
        let cart_listener = cart.listen(&events);
        if cart.restore() {
            debug!("Showing persisted cart until the first fetch");
        }

        let catalog = Catalog::new(api.clone(), &config.cache);
        let orders = Orders::new(api.clone());
        let checkout = Checkout::new(api.clone(), cart.clone());

        info!(base_url = %api.base_url(), "Storefront client ready");

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                auth,
                cart,
                catalog,
                orders,
                checkout,
                cart_listener,
            }),
        })
    }

    /// Log in with the configured credentials, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured credentials are rejected.
    pub async fn login_from_config(&self) -> Result<Option<User>> {
        let Some(login) = &self.inner.config.login else {
            return Ok(None);
        };
        let user = self.inner.auth.login(&login.email, &login.password).await?;
        Ok(Some(user))
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the REST client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the auth service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the cart synchronizer.
    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the order history.
    #[must_use]
    pub fn orders(&self) -> &Orders {
        &self.inner.orders
    }

    /// Get a reference to checkout.
    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }
}

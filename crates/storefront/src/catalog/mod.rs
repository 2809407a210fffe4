//! Catalog reads with in-memory caching.
//!
//! Product lookups are cached for 5 minutes and categories for 10 (both
//! configurable) using `moka`. Searches always go to the backend.

mod cache;

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, instrument};

use crate::api::{ApiClient, Category, Product, ProductFilter};
use crate::config::CacheConfig;
use crate::error::Result;

use cache::{CacheKey, CacheValue};

/// Cached catalog client.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    products: Cache<CacheKey, CacheValue>,
    categories: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create a catalog over `api` with the given cache lifetimes.
    #[must_use]
    pub fn new(api: ApiClient, config: &CacheConfig) -> Self {
        let products = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.product_ttl)
            .build();
        let categories = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.category_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                api,
                products,
                categories,
            }),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let key = CacheKey::Products(filter.clone());

        // Only non-search listings are cached
        if !filter.is_search()
            && let Some(CacheValue::Products(products)) = self.inner.products.get(&key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = self.inner.api.list_products(filter).await?;

        if !filter.is_search() {
            self.inner
                .products
                .insert(key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Product> {
        let key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.products.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.inner.api.get_product(slug).await?;
        self.inner
            .products
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Products related to `slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn related(&self, slug: &str) -> Result<Vec<Product>> {
        let key = CacheKey::Related(slug.to_string());

        if let Some(CacheValue::Products(products)) = self.inner.products.get(&key).await {
            debug!("Cache hit for related products");
            return Ok(products);
        }

        let products = self.inner.api.related_products(slug).await?;
        self.inner
            .products
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.categories.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = self.inner.api.list_categories().await?;
        self.inner
            .categories
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not found or the API request fails.
    #[instrument(skip(self))]
    pub async fn category(&self, slug: &str) -> Result<Category> {
        let key = CacheKey::Category(slug.to_string());

        if let Some(CacheValue::Category(category)) = self.inner.categories.get(&key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let category = self.inner.api.get_category(slug).await?;
        self.inner
            .categories
            .insert(key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    /// Products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn category_products(&self, slug: &str) -> Result<Vec<Product>> {
        let key = CacheKey::CategoryProducts(slug.to_string());

        if let Some(CacheValue::Products(products)) = self.inner.products.get(&key).await {
            debug!("Cache hit for category products");
            return Ok(products);
        }

        let products = self.inner.api.category_products(slug).await?;
        self.inner
            .products
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.inner.products.invalidate_all();
        self.inner.categories.invalidate_all();
        debug!("Catalog cache invalidated");
    }
}

//! Catalog Service endpoints (products and categories).

use tracing::instrument;
use url::form_urlencoded;

use super::{ApiClient, ApiError, Category, Listing, Product};

const PRODUCTS: &str = "api/products/";
const CATEGORIES: &str = "api/products/categories/";

/// Query parameters for the product list.
///
/// Unset and empty values are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    /// Free-text search.
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Ordering field, e.g. `price` or `-created_at`.
    pub ordering: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl ProductFilter {
    /// Whether this filter carries a search term.
    #[must_use]
    pub fn is_search(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Encode as a query string (without the leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        let page = self.page.map(|p| p.to_string());
        let pairs = [
            ("search", self.search.as_deref()),
            ("category", self.category.as_deref()),
            ("ordering", self.ordering.as_deref()),
            ("page", page.as_deref()),
        ];

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in pairs {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl ApiClient {
    /// List products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let query = filter.to_query();
        let endpoint = if query.is_empty() {
            PRODUCTS.to_string()
        } else {
            format!("{PRODUCTS}?{query}")
        };
        let listing: Listing<Product> = self.get_json(&endpoint).await?;
        Ok(listing.into_vec())
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, ApiError> {
        self.get_json(&format!("{PRODUCTS}{slug}/")).await
    }

    /// Products related to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn related_products(&self, slug: &str) -> Result<Vec<Product>, ApiError> {
        let listing: Listing<Product> = self.get_json(&format!("{PRODUCTS}{slug}/related/")).await?;
        Ok(listing.into_vec())
    }

    /// List categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let listing: Listing<Category> = self.get_json(CATEGORIES).await?;
        Ok(listing.into_vec())
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the category does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_category(&self, slug: &str) -> Result<Category, ApiError> {
        self.get_json(&format!("{CATEGORIES}{slug}/")).await
    }

    /// Products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn category_products(&self, slug: &str) -> Result<Vec<Product>, ApiError> {
        let listing: Listing<Product> = self
            .get_json(&format!("{CATEGORIES}{slug}/products/"))
            .await?;
        Ok(listing.into_vec())
    }
}

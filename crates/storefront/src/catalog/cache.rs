//! Cache types for catalog responses.

use crate::api::{Category, Product, ProductFilter};

/// Cache key for products and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products(ProductFilter),
    Product(String),
    Related(String),
    Categories,
    Category(String),
    CategoryProducts(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
}

//! Wire types for the Phanto backend.
//!
//! These mirror the JSON the backend produces. Fields that are not always
//! present are defaulted so that a trimmed payload (as returned by some
//! mutation endpoints) still decodes.

use chrono::{DateTime, Utc};
use phanto_core::{
    CartId, CartItemId, CategoryId, Email, Money, OrderItemId, OrderNumber, OrderStatus,
    ProductId, Quantity, UserId,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog
// =============================================================================

/// Category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A product as listed by the catalog and embedded in cart items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    /// Price after any active discount.
    #[serde(default)]
    pub final_price: Option<Money>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// The price a customer pays per unit.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.final_price.unwrap_or(self.price)
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub products_count: Option<u32>,
}

/// A list endpoint reply: either a paginated envelope or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    /// Flatten into the contained items.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Page { results, .. } | Self::Bare(results) => results,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    /// Denormalized product snapshot; absent in trimmed payloads.
    #[serde(default)]
    pub product: Option<Product>,
    pub quantity: u32,
    #[serde(default)]
    pub subtotal: Option<Money>,
}

/// The server-owned cart aggregate.
///
/// `total_items` and `total_price` are always the server's figures; the
/// client never recomputes them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_price: Money,
}

impl Cart {
    /// Find a line by its item ID.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Body of `POST /api/cart/items/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Reply of `POST /api/cart/items/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemResponse {
    pub item: CartItem,
    pub cart_items_count: u32,
    pub cart_total: Money,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `PATCH /api/cart/items/{id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateItemRequest {
    pub quantity: Quantity,
}

/// Reply of the cart mutations that return the whole cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub cart: Option<Cart>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Orders & payments
// =============================================================================

/// A purchased line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    pub product_name: String,
    pub product_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub subtotal: Option<Money>,
}

/// An order in the customer's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_number: OrderNumber,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Money,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Reply of `PUT /api/orders/{number}/cancel/`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of `POST /api/orders/validate-coupon/`.
#[derive(Debug, Clone, Serialize)]
pub struct CouponRequest<'a> {
    pub code: &'a str,
}

/// Reply of `POST /api/orders/validate-coupon/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CouponCheck {
    pub valid: bool,
    pub discount: Money,
    /// `percentage` or `fixed`; absent when the code is invalid.
    #[serde(default, rename = "type")]
    pub discount_type: Option<String>,
}

/// Body of `POST /api/orders/create-payment-intent/`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentRequest {
    /// Amount in minor units.
    pub amount: i64,
}

/// Reply of `POST /api/orders/create-payment-intent/`.
#[derive(Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    #[serde(rename = "paymentIntentId")]
    pub payment_intent_id: String,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("client_secret", &"[REDACTED]")
            .field("payment_intent_id", &self.payment_intent_id)
            .finish()
    }
}

/// One line of an order being placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraftItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub name: String,
    pub price: Money,
}

/// Shipping contact for an order being placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// The `order` part of `POST /api/orders/confirm-payment/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub order_notes: String,
    pub coupon_code: String,
    pub items: Vec<OrderDraftItem>,
}

/// Body of `POST /api/orders/confirm-payment/`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmPaymentRequest<'a> {
    pub payment_intent_id: &'a str,
    pub order: &'a OrderDraft,
}

/// Reply of `POST /api/orders/confirm-payment/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmedOrder {
    #[serde(default)]
    pub message: Option<String>,
    pub order_number: OrderNumber,
    pub order: Order,
}

// =============================================================================
// Users
// =============================================================================

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    /// Name to greet the user with: first name, else username, else email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.first_name, &self.username, &self.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

/// Token pair issued at login.
#[derive(Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    /// Move the tokens into secret storage.
    #[must_use]
    pub fn into_secrets(self) -> (SecretString, SecretString) {
        (SecretString::from(self.access), SecretString::from(self.refresh))
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /api/users/login/`.
///
/// The backend authenticates by username, and users register with their
/// email as username.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Reply of login and (optionally) registration.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub tokens: Option<TokenPair>,
    pub user: User,
}

/// Body of `POST /api/users/register/`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    /// Build a registration that uses the email as username.
    #[must_use]
    pub fn new(email: Email, password: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            username: email.as_str().to_string(),
            email,
            password: password.to_string(),
            password2: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

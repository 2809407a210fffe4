//! Remote Cart Service endpoints.
//!
//! These are plain transport calls; the optimistic mirror lives in
//! [`crate::cart`].

use phanto_core::{CartItemId, ProductId, Quantity};
use reqwest::Method;
use tracing::instrument;

use super::{
    AddItemRequest, AddItemResponse, ApiClient, ApiError, Cart, CartEnvelope, UpdateItemRequest,
};

const CART: &str = "api/cart/";
const CART_ITEMS: &str = "api/cart/items/";
const CART_CLEAR: &str = "api/cart/clear/";

fn item_endpoint(item_id: CartItemId) -> String {
    format!("{CART_ITEMS}{item_id}/")
}

impl ApiClient {
    /// Fetch the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend replies without a
    /// cart.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.get_json(CART).await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend replies without
    /// the created item.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = %quantity))]
    pub async fn add_cart_item(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<AddItemResponse, ApiError> {
        let body = AddItemRequest {
            product_id,
            quantity,
        };
        self.send_json(Method::POST, CART_ITEMS, &body)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(CART_ITEMS.to_string()))
    }

    /// Change the quantity of a cart line.
    ///
    /// Returns `None` when the backend answers `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all, fields(item_id = %item_id, quantity = %quantity))]
    pub async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<Option<CartEnvelope>, ApiError> {
        let body = UpdateItemRequest { quantity };
        self.send_json(Method::PATCH, &item_endpoint(item_id), &body)
            .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all, fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartEnvelope>, ApiError> {
        self.send_empty(Method::DELETE, &item_endpoint(item_id))
            .await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Option<CartEnvelope>, ApiError> {
        self.send_empty(Method::DELETE, CART_CLEAR).await
    }
}

//! Order history and checkout.

use phanto_core::{Money, OrderGroup, OrderNumber};
use tracing::{info, instrument, warn};

use crate::api::{
    ApiClient, Cart, ConfirmedOrder, CouponCheck, Order, OrderDraft, OrderDraftItem,
    PaymentIntent, ShippingDetails,
};
use crate::cart::CartSynchronizer;
use crate::error::{Result, ValidationError};

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 1000;

/// Flat shipping fee below the threshold.
pub const SHIPPING_FEE: i64 = 50;

// =============================================================================
// Order history
// =============================================================================

/// The signed-in customer's orders.
#[derive(Clone)]
pub struct Orders {
    api: ApiClient,
}

impl Orders {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All orders, as the backend sorts them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn list(&self) -> Result<Vec<Order>> {
        Ok(self.api.list_orders().await?)
    }

    /// Orders in one history group.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn group(&self, group: OrderGroup) -> Result<Vec<Order>> {
        Ok(filter_group(self.list().await?, group))
    }

    /// Orders that are paid and on their way.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn in_delivery(&self) -> Result<Vec<Order>> {
        self.group(OrderGroup::InDelivery).await
    }

    /// Delivered or completed orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn completed(&self) -> Result<Vec<Order>> {
        self.group(OrderGroup::Completed).await
    }

    /// One order with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    pub async fn detail(&self, number: &OrderNumber) -> Result<Order> {
        Ok(self.api.get_order(number).await?)
    }

    /// Ask the backend to cancel an order; returns its confirmation message.
    ///
    /// The backend decides whether the order is still cancellable.
    ///
    /// # Errors
    ///
    /// Returns a server error carrying the backend's reason when refused.
    #[instrument(skip_all, fields(order_number = %number))]
    pub async fn cancel(&self, number: &OrderNumber) -> Result<String> {
        let message = self.api.cancel_order(number).await?;
        info!("Order cancelled");
        Ok(message)
    }

    /// Invoice PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn invoice(&self, number: &OrderNumber) -> Result<Vec<u8>> {
        Ok(self.api.order_invoice(number).await?)
    }
}

fn filter_group(orders: Vec<Order>, group: OrderGroup) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| order.status.group() == Some(group))
        .collect()
}

// =============================================================================
// Checkout
// =============================================================================

/// Amounts charged for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutQuote {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    /// `total` in minor units, as the payment endpoint expects.
    pub amount_cents: i64,
}

impl CheckoutQuote {
    /// Price a cart from the server's total.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the total does not fit in minor units.
    pub fn for_cart(cart: &Cart) -> std::result::Result<Self, ValidationError> {
        let subtotal = cart.total_price;
        let shipping = if subtotal >= Money::from(FREE_SHIPPING_THRESHOLD) {
            Money::ZERO
        } else {
            Money::from(SHIPPING_FEE)
        };
        let total = subtotal + shipping;
        let amount_cents = total
            .to_cents()
            .ok_or_else(|| ValidationError::AmountOutOfRange(total.to_string()))?;

        Ok(Self {
            subtotal,
            shipping,
            total,
            amount_cents,
        })
    }

    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

/// Checkout over the synchronized cart.
#[derive(Clone)]
pub struct Checkout {
    api: ApiClient,
    cart: CartSynchronizer,
}

impl Checkout {
    #[must_use]
    pub const fn new(api: ApiClient, cart: CartSynchronizer) -> Self {
        Self { api, cart }
    }

    /// Check a coupon code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn validate_coupon(&self, code: &str) -> Result<CouponCheck> {
        Ok(self.api.validate_coupon(code.trim()).await?)
    }

    /// Price the current cart and open a payment for it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyCart` when there is nothing to pay for,
    /// otherwise the transport error.
    #[instrument(skip(self))]
    pub async fn begin(&self) -> Result<(CheckoutQuote, PaymentIntent)> {
        let cart = self.current_cart().await?;
        let quote = CheckoutQuote::for_cart(&cart)?;
        let intent = self.api.create_payment_intent(quote.amount_cents).await?;

        info!(amount_cents = quote.amount_cents, "Payment intent created");
        Ok((quote, intent))
    }

    /// Record a paid order for the current cart, then empty the cart.
    ///
    /// The order stands even if emptying the cart fails afterwards; that
    /// failure is only logged.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyCart` when there is nothing to order,
    /// otherwise the backend's rejection.
    #[instrument(skip(self, shipping, coupon_code))]
    pub async fn confirm(
        &self,
        payment_intent_id: &str,
        shipping: ShippingDetails,
        coupon_code: Option<&str>,
    ) -> Result<ConfirmedOrder> {
        let cart = self.current_cart().await?;
        let draft = OrderDraft {
            shipping,
            order_notes: String::new(),
            coupon_code: coupon_code.unwrap_or_default().to_string(),
            items: draft_items(&cart),
        };

        let confirmed = self.api.confirm_payment(payment_intent_id, &draft).await?;
        info!(order_number = %confirmed.order_number, "Order confirmed");

        if let Err(e) = self.cart.clear_cart().await {
            warn!(error = %e, "Order confirmed but the cart could not be cleared");
        }

        Ok(confirmed)
    }

    /// The mirror, fetched first if nothing is loaded. Empty carts are refused.
    async fn current_cart(&self) -> Result<Cart> {
        let cart = match self.cart.snapshot() {
            Some(cart) => cart,
            None => self.cart.fetch().await?,
        };
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        Ok(cart)
    }
}

fn draft_items(cart: &Cart) -> Vec<OrderDraftItem> {
    cart.items
        .iter()
        .filter_map(|item| {
            let product = item.product.as_ref()?;
            Some(OrderDraftItem {
                product_id: product.id,
                quantity: item.quantity,
                name: product.name.clone(),
                price: product.unit_price(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use phanto_core::{CartItemId, OrderStatus, ProductId};

    use super::*;
    use crate::api::{CartItem, Product};

    fn cart_with_total(total: i64) -> Cart {
        Cart {
            id: None,
            items: vec![CartItem {
                id: CartItemId::new(1),
                product: Some(Product {
                    id: ProductId::new(5),
                    name: "Polo".to_string(),
                    slug: "polo".to_string(),
                    description: None,
                    price: Money::from(100),
                    final_price: Some(Money::from(80)),
                    stock: 3,
                    category: None,
                    image: None,
                }),
                quantity: 1,
                subtotal: None,
            }],
            total_items: 1,
            total_price: Money::from(total),
        }
    }

    #[test]
    fn test_quote_charges_shipping_below_threshold() {
        let quote = CheckoutQuote::for_cart(&cart_with_total(999)).unwrap();
        assert_eq!(quote.shipping, Money::from(50));
        assert_eq!(quote.total, Money::from(1049));
        assert_eq!(quote.amount_cents, 104_900);
        assert!(!quote.free_shipping());
    }

    #[test]
    fn test_quote_free_shipping_at_threshold() {
        let quote = CheckoutQuote::for_cart(&cart_with_total(1000)).unwrap();
        assert!(quote.free_shipping());
        assert_eq!(quote.amount_cents, 100_000);
    }

    #[test]
    fn test_quote_rounds_to_cents() {
        let mut cart = cart_with_total(0);
        cart.total_price = Money::from_cents(12_345);
        let quote = CheckoutQuote::for_cart(&cart).unwrap();
        assert_eq!(quote.amount_cents, 17_345);
    }

    #[test]
    fn test_draft_items_use_final_price() {
        let items = draft_items(&cart_with_total(80));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(5));
        assert_eq!(items[0].price, Money::from(80));
        assert_eq!(items[0].name, "Polo");
    }

    #[test]
    fn test_filter_group() {
        let order = |number: &str, status: OrderStatus| Order {
            order_number: OrderNumber::from(number),
            status,
            total: Money::from(10),
            created_at: None,
            full_name: None,
            is_paid: true,
            items: Vec::new(),
        };
        let orders = vec![
            order("A", OrderStatus::Pending),
            order("B", OrderStatus::Shipped),
            order("C", OrderStatus::Delivered),
            order("D", OrderStatus::InTransit),
        ];

        let in_delivery = filter_group(orders.clone(), OrderGroup::InDelivery);
        let numbers: Vec<_> = in_delivery.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, ["B", "D"]);

        let completed = filter_group(orders, OrderGroup::Completed);
        assert_eq!(completed.len(), 1);
    }
}

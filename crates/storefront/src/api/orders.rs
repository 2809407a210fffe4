//! Order history, coupon and payment endpoints.

use phanto_core::OrderNumber;
use reqwest::Method;
use tracing::instrument;

use super::{
    ApiClient, ApiError, ConfirmPaymentRequest, ConfirmedOrder, CouponCheck, CouponRequest,
    Listing, MessageResponse, Order, OrderDraft, PaymentIntent, PaymentIntentRequest,
};

const ORDERS: &str = "api/orders/";
const VALIDATE_COUPON: &str = "api/orders/validate-coupon/";
const CREATE_PAYMENT_INTENT: &str = "api/orders/create-payment-intent/";
const CONFIRM_PAYMENT: &str = "api/orders/confirm-payment/";

impl ApiClient {
    /// The signed-in customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let listing: Listing<Order> = self.get_json(ORDERS).await?;
        Ok(listing.into_vec())
    }

    /// A single order with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip_all, fields(order_number = %number))]
    pub async fn get_order(&self, number: &OrderNumber) -> Result<Order, ApiError> {
        self.get_json(&format!("{ORDERS}{number}/")).await
    }

    /// Ask the backend to cancel an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order can no longer be cancelled or the request
    /// fails.
    #[instrument(skip_all, fields(order_number = %number))]
    pub async fn cancel_order(&self, number: &OrderNumber) -> Result<String, ApiError> {
        let endpoint = format!("{ORDERS}{number}/cancel/");
        let reply: Option<MessageResponse> = self.send_empty(Method::PUT, &endpoint).await?;
        Ok(reply.map(|r| r.message).unwrap_or_default())
    }

    /// Download the invoice PDF for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(order_number = %number))]
    pub async fn order_invoice(&self, number: &OrderNumber) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&format!("{ORDERS}{number}/invoice/")).await
    }

    /// Check a coupon code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn validate_coupon(&self, code: &str) -> Result<CouponCheck, ApiError> {
        self.send_json(Method::POST, VALIDATE_COUPON, &CouponRequest { code })
            .await?
            .ok_or_else(|| ApiError::EmptyBody(VALIDATE_COUPON.to_string()))
    }

    /// Open a payment for `amount` minor units.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(&self, amount: i64) -> Result<PaymentIntent, ApiError> {
        self.send_json(
            Method::POST,
            CREATE_PAYMENT_INTENT,
            &PaymentIntentRequest { amount },
        )
        .await?
        .ok_or_else(|| ApiError::EmptyBody(CREATE_PAYMENT_INTENT.to_string()))
    }

    /// Record a paid order.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment did not succeed or the order is
    /// rejected.
    #[instrument(skip(self, order))]
    pub async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        order: &OrderDraft,
    ) -> Result<ConfirmedOrder, ApiError> {
        let body = ConfirmPaymentRequest {
            payment_intent_id,
            order,
        };
        self.send_json(Method::POST, CONFIRM_PAYMENT, &body)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(CONFIRM_PAYMENT.to_string()))
    }
}

//! Unified error handling.
//!
//! Every public operation of the library returns [`Result<T>`]. Module errors
//! convert into [`AppError`] with `?`.

use phanto_core::{CartItemId, QuantityError};
use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::config::ConfigError;

/// Caller input rejected before any request is sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Quantity below one or above the allowed maximum.
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    /// The item is not in the local cart.
    #[error("cart item {0} is not in the cart")]
    UnknownItem(CartItemId),

    /// Checkout needs at least one line.
    #[error("the cart is empty")]
    EmptyCart,

    /// The order total does not fit in a payment amount.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Bad caller input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A cart read was superseded by a mutation and discarded.
    #[error("Cart read cancelled by a newer mutation")]
    Cancelled,

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<QuantityError> for AppError {
    fn from(err: QuantityError) -> Self {
        Self::Validation(ValidationError::Quantity(err))
    }
}

impl AppError {
    /// Whether the request never reached the backend.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Api(ApiError::Network(_)))
    }

    /// HTTP status of a backend rejection.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => err.status(),
            _ => None,
        }
    }

    /// Whether the input was rejected locally.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for storefront operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_error_is_validation() {
        let err: AppError = QuantityError::NotPositive(0).into();
        assert!(err.is_validation());
        assert!(!err.is_network());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_server_status_passes_through() {
        let err: AppError = ApiError::Server {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Server error 500: boom");
    }

    #[test]
    fn test_unknown_item_message() {
        let err = AppError::from(ValidationError::UnknownItem(CartItemId::new(7)));
        assert_eq!(
            err.to_string(),
            "Validation error: cart item 7 is not in the cart"
        );
    }
}

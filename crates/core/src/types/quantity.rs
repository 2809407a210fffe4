//! Cart line quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative. Removing a line is a separate operation.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// Does not fit in a cart line.
    #[error("quantity {0} is out of range")]
    OutOfRange(i64),
}

/// A strictly positive number of units on a cart line.
///
/// Callers hand in signed integers (user input, CLI arguments) so that a zero
/// or negative value can be rejected up front instead of wrapping.
///
/// ```
/// use phanto_core::Quantity;
///
/// assert_eq!(Quantity::new(3).unwrap().get(), 3);
/// assert!(Quantity::new(0).is_err());
/// assert!(Quantity::new(-2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Validate a caller-supplied quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is below 1 or does not fit in a `u32`.
    /// Stock limits are left to the backend.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::OutOfRange(value))
    }

    /// The number of units.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-5), Err(QuantityError::NotPositive(-5)));
    }

    #[test]
    fn test_large_quantities_accepted() {
        assert_eq!(Quantity::new(10_001).unwrap().get(), 10_001);
        assert_eq!(Quantity::new(i64::from(u32::MAX)).unwrap().get(), u32::MAX);
        assert_eq!(
            Quantity::new(i64::from(u32::MAX) + 1),
            Err(QuantityError::OutOfRange(i64::from(u32::MAX) + 1))
        );
    }

    #[test]
    fn test_serde_validates() {
        let q: Quantity = serde_json::from_str("2").unwrap();
        assert_eq!(q.get(), 2);
        assert_eq!(serde_json::to_string(&q).unwrap(), "2");
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            QuantityError::NotPositive(0).to_string(),
            "quantity must be at least 1 (got 0)"
        );
    }
}

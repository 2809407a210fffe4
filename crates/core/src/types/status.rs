//! Order status values reported by the backend.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Unknown values from a newer backend deserialize to [`OrderStatus::Other`]
/// instead of failing the whole order history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
    #[serde(untagged)]
    Other(String),
}

/// Grouping used by the order history views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderGroup {
    /// Paid and on its way: processing, shipped, in transit.
    InDelivery,
    /// Delivered or completed.
    Completed,
}

impl OrderStatus {
    /// The history group this status belongs to, if any.
    #[must_use]
    pub const fn group(&self) -> Option<OrderGroup> {
        match self {
            Self::Processing | Self::Shipped | Self::InTransit => Some(OrderGroup::InDelivery),
            Self::Delivered | Self::Completed => Some(OrderGroup::Completed),
            _ => None,
        }
    }

    /// Whether the backend will accept a cancellation for this status.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(other) => other,
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OrderGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-delivery" | "in_delivery" => Ok(Self::InDelivery),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid order group: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_groups() {
        assert_eq!(OrderStatus::Shipped.group(), Some(OrderGroup::InDelivery));
        assert_eq!(OrderStatus::InTransit.group(), Some(OrderGroup::InDelivery));
        assert_eq!(OrderStatus::Delivered.group(), Some(OrderGroup::Completed));
        assert_eq!(OrderStatus::Pending.group(), None);
        assert_eq!(OrderStatus::Cancelled.group(), None);
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let status: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, OrderStatus::Other("refunded".to_string()));
        assert_eq!(status.to_string(), "refunded");
        assert_eq!(status.group(), None);
    }

    #[test]
    fn test_known_status_roundtrip() {
        let status: OrderStatus = serde_json::from_str("\"in_transit\"").unwrap();
        assert_eq!(status, OrderStatus::InTransit);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in_transit\"");
    }

    #[test]
    fn test_cancellable() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
    }

    #[test]
    fn test_group_from_str() {
        assert_eq!("in-delivery".parse::<OrderGroup>(), Ok(OrderGroup::InDelivery));
        assert_eq!("completed".parse::<OrderGroup>(), Ok(OrderGroup::Completed));
        assert!("nope".parse::<OrderGroup>().is_err());
    }
}

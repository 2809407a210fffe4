//! Display projection of the cart.
//!
//! Derived from the mirror on demand and never written back into it.

use phanto_core::{CartItemId, Money, ProductId};

use crate::api::{Cart, CartItem};

/// One cart line as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub slug: Option<String>,
    pub category: Option<String>,
    /// Final price when discounted, else list price.
    pub unit_price: Money,
    pub quantity: u32,
    pub stock: Option<i64>,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        let product = item.product.as_ref();
        Self {
            item_id: item.id,
            product_id: product.map(|p| p.id),
            name: product.map(|p| p.name.clone()).unwrap_or_default(),
            slug: product.map(|p| p.slug.clone()),
            category: product
                .and_then(|p| p.category.as_ref())
                .map(|c| c.name.clone()),
            unit_price: product.map_or(Money::ZERO, |p| p.unit_price()),
            quantity: item.quantity,
            stock: product.map(|p| p.stock),
        }
    }
}

/// All lines of a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
}

impl CartView {
    /// Units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .map(|l| l.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Sum of line totals at current unit prices.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.items.iter().map(CartLine::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use phanto_core::CategoryId;

    use super::*;
    use crate::api::{CategoryRef, Product};

    fn product(id: i64, price: i64, final_price: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            slug: format!("producto-{id}"),
            description: None,
            price: Money::from(price),
            final_price: final_price.map(Money::from),
            stock: 10,
            category: Some(CategoryRef {
                id: Some(CategoryId::new(1)),
                name: "Ropa".to_string(),
                slug: Some("ropa".to_string()),
            }),
            image: None,
        }
    }

    #[test]
    fn test_line_uses_final_price() {
        let item = CartItem {
            id: CartItemId::new(1),
            product: Some(product(5, 100, Some(80))),
            quantity: 2,
            subtotal: None,
        };
        let line = CartLine::from(&item);
        assert_eq!(line.unit_price, Money::from(80));
        assert_eq!(line.line_total(), Money::from(160));
        assert_eq!(line.category.as_deref(), Some("Ropa"));
        assert_eq!(line.slug.as_deref(), Some("producto-5"));
    }

    #[test]
    fn test_count_saturates() {
        let line = |id: i64, quantity: u32| {
            CartLine::from(&CartItem {
                id: CartItemId::new(id),
                product: None,
                quantity,
                subtotal: None,
            })
        };
        let view = CartView {
            lines: vec![line(1, u32::MAX), line(2, 5)],
        };
        assert_eq!(view.count(), u32::MAX);
    }

    #[test]
    fn test_view_totals() {
        let cart = Cart {
            id: None,
            items: vec![
                CartItem {
                    id: CartItemId::new(1),
                    product: Some(product(5, 100, None)),
                    quantity: 2,
                    subtotal: None,
                },
                CartItem {
                    id: CartItemId::new(2),
                    product: Some(product(6, 10, Some(7))),
                    quantity: 3,
                    subtotal: None,
                },
            ],
            // Server figures are ignored by the view
            total_items: 99,
            total_price: Money::ZERO,
        };
        let view = CartView::from(&cart);
        assert_eq!(view.count(), 5);
        assert_eq!(view.total_price(), Money::from(221));
    }

    #[test]
    fn test_line_without_product() {
        let item = CartItem {
            id: CartItemId::new(3),
            product: None,
            quantity: 1,
            subtotal: None,
        };
        let line = CartLine::from(&item);
        assert_eq!(line.product_id, None);
        assert_eq!(line.unit_price, Money::ZERO);
        assert!(CartView::default().is_empty());
    }
}

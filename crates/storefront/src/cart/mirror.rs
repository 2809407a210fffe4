//! In-place patches applied to the local cart mirror.
//!
//! Optimistic patches only touch the item list; totals stay at the server's
//! last figures until the reply reconciles them.

use phanto_core::{CartItemId, Money, Quantity};

use crate::api::{AddItemResponse, Cart};

/// Merge a freshly added line: replace the line with the same id, else append.
///
/// Totals come from the reply, never from local arithmetic.
pub(crate) fn merge_added(cart: &mut Cart, added: &AddItemResponse) {
    match cart.items.iter_mut().find(|item| item.id == added.item.id) {
        Some(existing) => *existing = added.item.clone(),
        None => cart.items.push(added.item.clone()),
    }
    cart.total_items = added.cart_items_count;
    cart.total_price = added.cart_total;
}

/// Rewrite one line's quantity.
pub(crate) fn set_quantity(cart: &mut Cart, item_id: CartItemId, quantity: Quantity) {
    if let Some(item) = cart.items.iter_mut().find(|item| item.id == item_id) {
        item.quantity = quantity.get();
    }
}

/// Drop one line.
pub(crate) fn remove_item(cart: &mut Cart, item_id: CartItemId) {
    cart.items.retain(|item| item.id != item_id);
}

/// Empty the cart, keeping its identity.
pub(crate) fn clear(cart: &mut Cart) {
    cart.items.clear();
    cart.total_items = 0;
    cart.total_price = Money::ZERO;
}

//! Cart commands.

use phanto_core::{CartItemId, ProductId};
use phanto_storefront::cart::{CartSynchronizer, CartView};

use super::CommandError;

/// Fetch and print the cart.
pub async fn show(cart: &CartSynchronizer) -> Result<(), CommandError> {
    let fetched = cart.fetch().await?;
    print_cart(&CartView::from(&fetched), fetched.total_items, &fetched.total_price.to_string());
    Ok(())
}

/// Add a product, then print the updated cart.
pub async fn add(
    cart: &CartSynchronizer,
    product_id: ProductId,
    quantity: i64,
) -> Result<(), CommandError> {
    // Load the mirror first so the added line is merged into it
    cart.fetch().await?;
    let item = cart.add_item(product_id, quantity).await?;
    tracing::info!("Added {} x product {} (line {})", item.quantity, product_id, item.id);
    print_mirror(cart);
    Ok(())
}

/// Change a line's quantity, then print the reconciled cart.
pub async fn update(
    cart: &CartSynchronizer,
    item_id: CartItemId,
    quantity: i64,
) -> Result<(), CommandError> {
    cart.fetch().await?;
    cart.update_item(item_id, quantity).await?;
    tracing::info!("Line {} set to {}", item_id, quantity);
    print_mirror(cart);
    Ok(())
}

/// Remove a line, then print the reconciled cart.
pub async fn remove(cart: &CartSynchronizer, item_id: CartItemId) -> Result<(), CommandError> {
    cart.fetch().await?;
    cart.remove_item(item_id).await?;
    tracing::info!("Line {} removed", item_id);
    print_mirror(cart);
    Ok(())
}

/// Empty the cart.
pub async fn clear(cart: &CartSynchronizer) -> Result<(), CommandError> {
    cart.clear_cart().await?;
    tracing::info!("Cart cleared");
    Ok(())
}

fn print_mirror(cart: &CartSynchronizer) {
    if let Some(mirror) = cart.snapshot() {
        print_cart(
            &CartView::from(&mirror),
            mirror.total_items,
            &mirror.total_price.to_string(),
        );
    }
}

fn print_cart(view: &CartView, total_items: u32, total_price: &str) {
    if view.is_empty() {
        println!("Cart is empty");
        return;
    }

    for line in &view.lines {
        println!(
            "{:>6}  {:<40} {:>4} x {:>12} = {:>12}",
            line.item_id,
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string(),
        );
    }
    println!("{total_items} item(s), total {total_price}");
}

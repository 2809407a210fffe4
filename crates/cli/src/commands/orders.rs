//! Order and coupon commands.

use std::path::PathBuf;

use phanto_core::{OrderGroup, OrderNumber};
use phanto_storefront::orders::{Checkout, Orders};

use super::CommandError;

/// List orders, optionally only one history group.
pub async fn list(orders: &Orders, group: Option<OrderGroup>) -> Result<(), CommandError> {
    let list = match group {
        Some(group) => orders.group(group).await?,
        None => orders.list().await?,
    };

    if list.is_empty() {
        println!("No orders");
        return Ok(());
    }
    for order in list {
        let date = order
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<20} {:<10} {:<12} {:>12}",
            order.order_number,
            date,
            order.status,
            order.total.to_string()
        );
    }
    Ok(())
}

/// Show one order with its lines.
pub async fn show(orders: &Orders, number: &OrderNumber) -> Result<(), CommandError> {
    let order = orders.detail(number).await?;

    println!("Order {}", order.order_number);
    println!("  Status: {}", order.status);
    println!("  Paid:   {}", if order.is_paid { "yes" } else { "no" });
    if let Some(at) = order.created_at {
        println!("  Placed: {}", at.format("%Y-%m-%d %H:%M"));
    }
    println!();
    for item in &order.items {
        println!(
            "  {:<40} {:>4} x {:>12}",
            item.product_name,
            item.quantity,
            item.product_price.to_string()
        );
    }
    println!("  Total: {}", order.total);
    Ok(())
}

/// Cancel an order.
pub async fn cancel(orders: &Orders, number: &OrderNumber) -> Result<(), CommandError> {
    let message = orders.cancel(number).await?;
    if message.is_empty() {
        tracing::info!("Order {} cancelled", number);
    } else {
        tracing::info!("{}", message);
    }
    Ok(())
}

/// Save an invoice PDF.
pub async fn invoice(
    orders: &Orders,
    number: &OrderNumber,
    output: Option<PathBuf>,
) -> Result<(), CommandError> {
    let bytes = orders.invoice(number).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(format!("invoice-{number}.pdf")));
    std::fs::write(&path, &bytes)?;
    tracing::info!("Invoice saved to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Check a coupon code.
pub async fn validate_coupon(checkout: &Checkout, code: &str) -> Result<(), CommandError> {
    let check = checkout.validate_coupon(code).await?;
    if check.valid {
        match check.discount_type.as_deref() {
            Some("percentage") => println!("{code}: valid, {}% off", check.discount.amount()),
            _ => println!("{code}: valid, {} off", check.discount),
        }
    } else {
        println!("{code}: not valid");
    }
    Ok(())
}

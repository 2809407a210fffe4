//! Catalog commands.

use phanto_storefront::api::{Product, ProductFilter};
use phanto_storefront::catalog::Catalog;

use super::CommandError;

/// List products matching a filter.
pub async fn list_products(catalog: &Catalog, filter: &ProductFilter) -> Result<(), CommandError> {
    let products = catalog.products(filter).await?;
    print_products(&products);
    Ok(())
}

/// Show one product.
pub async fn show_product(catalog: &Catalog, slug: &str) -> Result<(), CommandError> {
    let product = catalog.product(slug).await?;

    println!("{} ({})", product.name, product.slug);
    println!("  ID:       {}", product.id);
    match product.final_price {
        Some(final_price) if final_price != product.price => {
            println!("  Price:    {final_price} (was {})", product.price);
        }
        _ => println!("  Price:    {}", product.price),
    }
    println!("  Stock:    {}", product.stock);
    if let Some(category) = &product.category {
        println!("  Category: {}", category.name);
    }
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{description}");
    }
    Ok(())
}

/// List products related to one product.
pub async fn related(catalog: &Catalog, slug: &str) -> Result<(), CommandError> {
    let products = catalog.related(slug).await?;
    print_products(&products);
    Ok(())
}

/// List categories.
pub async fn list_categories(catalog: &Catalog) -> Result<(), CommandError> {
    for category in catalog.categories().await? {
        match category.products_count {
            Some(count) => println!("{:<24} {} ({count})", category.slug, category.name),
            None => println!("{:<24} {}", category.slug, category.name),
        }
    }
    Ok(())
}

/// Show a category and its products.
pub async fn show_category(catalog: &Catalog, slug: &str) -> Result<(), CommandError> {
    let category = catalog.category(slug).await?;
    println!("{} ({})", category.name, category.slug);
    if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    println!();

    let products = catalog.category_products(slug).await?;
    print_products(&products);
    Ok(())
}

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        let stock = if product.in_stock() { "" } else { "  (out of stock)" };
        println!(
            "{:>6}  {:<40} {:>12}{stock}",
            product.id,
            product.name,
            product.unit_price().to_string(),
        );
    }
}

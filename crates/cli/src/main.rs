//! Phanto CLI - storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart (logs in with PHANTO_EMAIL / PHANTO_PASSWORD if set)
//! phanto cart show
//!
//! # Add two units of product 5, then change line 12 to three units
//! phanto cart add 5 --quantity 2
//! phanto cart update 12 3
//!
//! # Browse the catalog
//! phanto products list --category polos --ordering price
//! phanto categories show polos
//!
//! # Order history
//! phanto orders list --group in-delivery
//! phanto orders invoice ORD-20240101-0001 --output invoice.pdf
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and edit the cart
//! - `products` / `categories` - Browse the catalog
//! - `orders` - Order history, cancellation and invoices
//! - `coupon` - Check coupon codes

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use phanto_core::{CartItemId, OrderGroup, OrderNumber, ProductId};
use phanto_storefront::Storefront;
use phanto_storefront::api::ProductFilter;
use phanto_storefront::config::StorefrontConfig;

mod commands;

#[derive(Parser)]
#[command(name = "phanto")]
#[command(author, version, about = "Phanto storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Browse categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Coupon codes
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Fetch and print the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        product_id: i64,

        /// Units to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Change the quantity of a cart line
    Update {
        /// Cart item ID
        item_id: i64,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart item ID
        item_id: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Category slug
        #[arg(short, long)]
        category: Option<String>,

        /// Ordering field (`price`, `-price`, `name`, `-created_at`)
        #[arg(short, long)]
        ordering: Option<String>,

        /// Page number
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Show one product
    Show {
        /// Product slug
        slug: String,
    },
    /// Products related to one product
    Related {
        /// Product slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List categories
    List,
    /// Show a category and its products
    Show {
        /// Category slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List {
        /// Only orders in this group (`in-delivery`, `completed`)
        #[arg(short, long)]
        group: Option<OrderGroup>,
    },
    /// Show one order
    Show {
        /// Order number
        order_number: String,
    },
    /// Cancel an order
    Cancel {
        /// Order number
        order_number: String,
    },
    /// Download an invoice PDF
    Invoice {
        /// Order number
        order_number: String,

        /// Output file (default: `invoice-<order number>.pdf`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Check whether a code is valid
    Validate {
        /// Coupon code
        code: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "phanto_storefront=info,phanto_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let storefront = Storefront::new(config)?;

    if let Some(user) = storefront.login_from_config().await? {
        tracing::info!("Logged in as {}", user.display_name());
    }

    match cli.command {
        Commands::Cart { action } => {
            let cart = storefront.cart();
            match action {
                CartAction::Show => commands::cart::show(cart).await?,
                CartAction::Add {
                    product_id,
                    quantity,
                } => commands::cart::add(cart, ProductId::new(product_id), quantity).await?,
                CartAction::Update { item_id, quantity } => {
                    commands::cart::update(cart, CartItemId::new(item_id), quantity).await?;
                }
                CartAction::Remove { item_id } => {
                    commands::cart::remove(cart, CartItemId::new(item_id)).await?;
                }
                CartAction::Clear => commands::cart::clear(cart).await?,
            }
        }
        Commands::Products { action } => {
            let catalog = storefront.catalog();
            match action {
                ProductAction::List {
                    search,
                    category,
                    ordering,
                    page,
                } => {
                    let filter = ProductFilter {
                        search,
                        category,
                        ordering,
                        page,
                    };
                    commands::catalog::list_products(catalog, &filter).await?;
                }
                ProductAction::Show { slug } => commands::catalog::show_product(catalog, &slug).await?,
                ProductAction::Related { slug } => commands::catalog::related(catalog, &slug).await?,
            }
        }
        Commands::Categories { action } => {
            let catalog = storefront.catalog();
            match action {
                CategoryAction::List => commands::catalog::list_categories(catalog).await?,
                CategoryAction::Show { slug } => {
                    commands::catalog::show_category(catalog, &slug).await?;
                }
            }
        }
        Commands::Orders { action } => {
            let orders = storefront.orders();
            match action {
                OrderAction::List { group } => commands::orders::list(orders, group).await?,
                OrderAction::Show { order_number } => {
                    commands::orders::show(orders, &OrderNumber::new(order_number)).await?;
                }
                OrderAction::Cancel { order_number } => {
                    commands::orders::cancel(orders, &OrderNumber::new(order_number)).await?;
                }
                OrderAction::Invoice {
                    order_number,
                    output,
                } => {
                    commands::orders::invoice(orders, &OrderNumber::new(order_number), output)
                        .await?;
                }
            }
        }
        Commands::Coupon { action } => match action {
            CouponAction::Validate { code } => {
                commands::orders::validate_coupon(storefront.checkout(), &code).await?;
            }
        },
    }
    Ok(())
}

//! Integration tests for the cart synchronizer.
//!
//! Run with: cargo test -p phanto-integration-tests --test cart_sync

use std::time::Duration;

use phanto_core::{CartItemId, Money, ProductId};
use phanto_integration_tests::{
    TestContext, cart_json, config_for, line_json, product_json, two_units_cart,
};
use phanto_storefront::cart::{CartStore, FileCartStore, MutationKind};
use phanto_storefront::{AppError, Storefront, ValidationError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

/// Serve `body` for `GET /api/cart/` and load it into the mirror.
async fn load_cart(ctx: &TestContext, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&ctx.server)
        .await;

    ctx.storefront.cart().fetch().await.unwrap();
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_replaces_mirror_and_persists() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    let cart = ctx.storefront.cart().snapshot().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total_price, Money::from(200));

    let persisted = ctx.store.load().unwrap().unwrap();
    assert_eq!(persisted.cart, cart);
    assert_eq!(persisted.cart_id, cart.id);
}

#[tokio::test]
async fn test_failed_fetch_keeps_last_good_mirror() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "down"})))
        .mount(&ctx.server)
        .await;

    let err = ctx.storefront.cart().fetch().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.to_string(), "Server error 503: down");
    assert_eq!(
        ctx.storefront.cart().snapshot().unwrap().total_price,
        Money::from(200)
    );
}

#[tokio::test]
async fn test_network_failure_is_network_error() {
    let ctx = TestContext::new().await;
    let storefront = Storefront::with_store(
        config_for("http://127.0.0.1:9", &[]),
        ctx.store.clone(),
    )
    .unwrap();

    let err = storefront.cart().fetch().await.unwrap_err();
    assert!(err.is_network());
    assert!(storefront.cart().snapshot().is_none());
}

#[tokio::test]
async fn test_trimmed_cart_payload_decodes() {
    let ctx = TestContext::new().await;
    load_cart(
        &ctx,
        json!({"items": [{"id": 1, "quantity": 3}], "total_price": 300}),
    )
    .await;

    let cart = ctx.storefront.cart().snapshot().unwrap();
    assert_eq!(cart.items[0].quantity, 3);
    assert!(cart.items[0].product.is_none());
    assert_eq!(cart.total_price, Money::from(300));
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_merges_new_line_with_server_totals() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("POST"))
        .and(path("/api/cart/items/"))
        .and(body_json(json!({"product_id": 7, "quantity": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Producto agregado al carrito",
            "item": line_json(2, 7, 1, "50.00"),
            "cart_items_count": 3,
            "cart_total": "250.00"
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let item = ctx
        .storefront
        .cart()
        .add_item(ProductId::new(7), 1)
        .await
        .unwrap();
    assert_eq!(item.id, CartItemId::new(2));

    let cart = ctx.storefront.cart().snapshot().unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_items, 3);
    assert_eq!(cart.total_price, Money::from(250));
    assert_eq!(ctx.store.load().unwrap().unwrap().cart, cart);
}

#[tokio::test]
async fn test_add_existing_product_replaces_line() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("POST"))
        .and(path("/api/cart/items/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "item": line_json(1, 5, 3, "100.00"),
            "cart_items_count": 3,
            "cart_total": "300.00"
        })))
        .mount(&ctx.server)
        .await;

    ctx.storefront
        .cart()
        .add_item(ProductId::new(5), 1)
        .await
        .unwrap();

    let cart = ctx.storefront.cart().snapshot().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.total_price, Money::from(300));
}

#[tokio::test]
async fn test_add_without_loaded_mirror_does_not_merge() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/api/cart/items/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "item": line_json(2, 7, 1, "50.00"),
            "cart_items_count": 1,
            "cart_total": "50.00"
        })))
        .mount(&ctx.server)
        .await;

    ctx.storefront
        .cart()
        .add_item(ProductId::new(7), 1)
        .await
        .unwrap();
    assert!(ctx.storefront.cart().snapshot().is_none());
}

#[tokio::test]
async fn test_add_failure_leaves_mirror_untouched() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;
    let before = ctx.storefront.cart().snapshot();

    Mock::given(method("POST"))
        .and(path("/api/cart/items/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Stock insuficiente"})),
        )
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .cart()
        .add_item(ProductId::new(5), 50)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server error 400: Stock insuficiente");
    assert_eq!(ctx.storefront.cart().snapshot(), before);
    assert!(!ctx.storefront.cart().is_pending(MutationKind::Add));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_is_optimistic_then_reconciled() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    let server_cart = json!({"items": [{"id": 1, "quantity": 3}], "total_price": "300.00"});
    Mock::given(method("PATCH"))
        .and(path("/api/cart/items/1/"))
        .and(body_json(json!({"quantity": 3})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cart": server_cart.clone()}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let cart = ctx.storefront.cart().clone();
    let update = tokio::spawn(async move { cart.update_item(CartItemId::new(1), 3).await });

    // Optimistic state while the request is in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    let optimistic = ctx.storefront.cart().snapshot().unwrap();
    assert_eq!(optimistic.items[0].quantity, 3);
    assert_eq!(optimistic.total_price, Money::from(200));
    assert!(ctx.storefront.cart().is_pending(MutationKind::Update));

    let reconciled = update.await.unwrap().unwrap();
    let expected: phanto_storefront::api::Cart = serde_json::from_value(server_cart).unwrap();
    assert_eq!(reconciled, expected);
    assert_eq!(ctx.storefront.cart().snapshot().unwrap(), expected);
    assert!(!ctx.storefront.cart().is_pending(MutationKind::Update));
}

#[tokio::test]
async fn test_update_failure_rolls_back() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;
    let before = ctx.storefront.cart().snapshot();

    Mock::given(method("PATCH"))
        .and(path("/api/cart/items/1/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .cart()
        .update_item(CartItemId::new(1), 5)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Server error 500: HTTP error! status: 500");
    assert_eq!(ctx.storefront.cart().snapshot(), before);
}

#[tokio::test]
async fn test_update_rejects_non_positive_quantity_without_request() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;
    let before = ctx.storefront.cart().snapshot();

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.server)
        .await;

    for quantity in [0, -1] {
        let err = ctx
            .storefront
            .cart()
            .update_item(CartItemId::new(1), quantity)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::Quantity(_))
        ));
    }
    assert_eq!(ctx.storefront.cart().snapshot(), before);
}

#[tokio::test]
async fn test_large_quantities_left_to_backend() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("PATCH"))
        .and(path("/api/cart/items/1/"))
        .and(body_json(json!({"quantity": 10_001})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Stock insuficiente"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cart/items/"))
        .and(body_json(json!({"product_id": 5, "quantity": 20_000})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Stock insuficiente"})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let cart = ctx.storefront.cart();
    let err = cart.update_item(CartItemId::new(1), 10_001).await.unwrap_err();
    assert_eq!(err.to_string(), "Server error 400: Stock insuficiente");
    let err = cart.add_item(ProductId::new(5), 20_000).await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    assert_eq!(cart.snapshot().unwrap().items[0].quantity, 2);
}

#[tokio::test]
async fn test_update_unknown_item_rejected_without_request() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .cart()
        .update_item(CartItemId::new(42), 2)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::UnknownItem(id)) if id == CartItemId::new(42)
    ));
}

#[tokio::test]
async fn test_update_no_content_keeps_optimistic_state() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("PATCH"))
        .and(path("/api/cart/items/1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&ctx.server)
        .await;

    let cart = ctx
        .storefront
        .cart()
        .update_item(CartItemId::new(1), 4)
        .await
        .unwrap();
    assert_eq!(cart.items[0].quantity, 4);
    assert_eq!(ctx.storefront.cart().snapshot().unwrap(), cart);
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn test_remove_reconciles_with_server_cart() {
    let ctx = TestContext::new().await;
    load_cart(
        &ctx,
        cart_json(
            &[line_json(1, 5, 2, "100.00"), line_json(2, 6, 1, "30.00")],
            3,
            "230.00",
        ),
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/api/cart/items/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Producto eliminado",
            "cart": cart_json(&[line_json(2, 6, 1, "30.00")], 1, "30.00")
        })))
        .mount(&ctx.server)
        .await;

    let cart = ctx
        .storefront
        .cart()
        .remove_item(CartItemId::new(1))
        .await
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id, CartItemId::new(2));
    assert_eq!(cart.total_items, 1);
    assert_eq!(cart.total_price, Money::from(30));
}

#[tokio::test]
async fn test_remove_failure_restores_prior_cart() {
    let ctx = TestContext::new().await;
    load_cart(
        &ctx,
        json!({"items": [{"id": 1, "quantity": 2}], "total_price": "200.00"}),
    )
    .await;
    let before = ctx.storefront.cart().snapshot().unwrap();

    Mock::given(method("DELETE"))
        .and(path("/api/cart/items/1/"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
        .mount(&ctx.server)
        .await;

    let cart = ctx.storefront.cart().clone();
    let remove = tokio::spawn(async move { cart.remove_item(CartItemId::new(1)).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(ctx.storefront.cart().snapshot().unwrap().items.is_empty());

    let err = remove.await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(500));

    let after = ctx.storefront.cart().snapshot().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.items[0].quantity, 2);
    assert_eq!(after.total_price, Money::from(200));
}

// ============================================================================
// Clear
// ============================================================================

#[tokio::test]
async fn test_clear_twice_is_empty_both_times() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("DELETE"))
        .and(path("/api/cart/clear/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Carrito vaciado",
            "cart": cart_json(&[], 0, "0.00")
        })))
        .expect(2)
        .mount(&ctx.server)
        .await;

    for _ in 0..2 {
        let cart = ctx.storefront.cart().clear_cart().await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_price, Money::ZERO);
    }
    assert_eq!(ctx.storefront.cart().item_count(), 0);
}

#[tokio::test]
async fn test_clear_failure_rolls_back() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;
    let before = ctx.storefront.cart().snapshot();

    Mock::given(method("DELETE"))
        .and(path("/api/cart/clear/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&ctx.server)
        .await;

    assert!(ctx.storefront.cart().clear_cart().await.is_err());
    assert_eq!(ctx.storefront.cart().snapshot(), before);
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_in_flight_fetch_never_overwrites_optimistic_update() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    // A slow read that still sees the old quantity
    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(two_units_cart())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&ctx.server)
        .await;

    // A mutation that replies with no cart, so only the optimistic write stands
    Mock::given(method("PATCH"))
        .and(path("/api/cart/items/1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&ctx.server)
        .await;

    let cart = ctx.storefront.cart().clone();
    let fetch = tokio::spawn(async move { cart.fetch().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    ctx.storefront
        .cart()
        .update_item(CartItemId::new(1), 3)
        .await
        .unwrap();

    let fetched = fetch.await.unwrap();
    assert!(matches!(fetched, Err(AppError::Cancelled)));

    // Give a stray write every chance to land
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(ctx.storefront.cart().snapshot().unwrap().items[0].quantity, 3);
}

// ============================================================================
// Invalidation
// ============================================================================

#[tokio::test]
async fn test_failed_mutation_after_logout_does_not_restore_cart() {
    let ctx = TestContext::new().await;
    load_cart(&ctx, two_units_cart()).await;

    Mock::given(method("DELETE"))
        .and(path("/api/cart/items/1/"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(150)))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let cart = ctx.storefront.cart().clone();
    let remove = tokio::spawn(async move { cart.remove_item(CartItemId::new(1)).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    ctx.storefront.cart().invalidate();

    let err = remove.await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(ctx.storefront.cart().snapshot().is_none());
    assert!(ctx.store.load().unwrap().is_none());
    assert!(!ctx.storefront.cart().is_pending(MutationKind::Remove));
}

#[tokio::test]
async fn test_successful_mutation_after_logout_is_not_persisted() {
    let ctx = TestContext::new().await;
    let dir = tempfile::tempdir().unwrap();
    let mirror = dir.path().join("cart.json");
    let storefront = Storefront::new(config_for(
        &ctx.server.uri(),
        &[("PHANTO_CART_MIRROR_PATH", mirror.to_str().unwrap())],
    ))
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_units_cart()))
        .mount(&ctx.server)
        .await;
    storefront.cart().fetch().await.unwrap();

    let server_cart = json!({"items": [{"id": 1, "quantity": 3}], "total_price": "300.00"});
    Mock::given(method("PATCH"))
        .and(path("/api/cart/items/1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cart": server_cart}))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let cart = storefront.cart().clone();
    let update = tokio::spawn(async move { cart.update_item(CartItemId::new(1), 3).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    storefront.cart().invalidate();

    // The caller still sees the server's verdict
    let reply = update.await.unwrap().unwrap();
    assert_eq!(reply.items[0].quantity, 3);

    assert!(storefront.cart().snapshot().is_none());
    assert!(FileCartStore::new(&mirror).load().unwrap().is_none());
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_file_mirror_restored_on_next_start() {
    let ctx = TestContext::new().await;
    let dir = tempfile::tempdir().unwrap();
    let mirror = dir.path().join("cart.json");
    let mirror_path = mirror.to_str().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_units_cart()))
        .mount(&ctx.server)
        .await;

    let first = Storefront::new(config_for(
        &ctx.server.uri(),
        &[("PHANTO_CART_MIRROR_PATH", mirror_path)],
    ))
    .unwrap();
    let fetched = first.cart().fetch().await.unwrap();
    drop(first);

    let second = Storefront::new(config_for(
        &ctx.server.uri(),
        &[("PHANTO_CART_MIRROR_PATH", mirror_path)],
    ))
    .unwrap();
    assert_eq!(second.cart().snapshot(), Some(fetched));
    assert_eq!(second.cart().item_count(), 2);
    assert_eq!(second.cart().display_total(), Money::from(200));

    second.cart().invalidate();
    assert!(FileCartStore::new(&mirror).load().unwrap().is_none());
}

#[tokio::test]
async fn test_cart_lines_view() {
    let ctx = TestContext::new().await;
    let mut product = product_json(5, "Polo Negro", "100.00");
    product["final_price"] = json!("80.00");
    load_cart(
        &ctx,
        cart_json(
            &[json!({"id": 1, "product": product, "quantity": 2})],
            2,
            "160.00",
        ),
    )
    .await;

    let view = ctx.storefront.cart().lines();
    let line = &view.lines[0];
    assert_eq!(line.name, "Polo Negro");
    assert_eq!(line.slug.as_deref(), Some("polo-negro"));
    assert_eq!(line.category.as_deref(), Some("Polos"));
    assert_eq!(line.unit_price, Money::from(80));
    assert_eq!(view.total_price(), Money::from(160));
    assert_eq!(ctx.storefront.cart().item_count(), 2);

    // The view never feeds back into the mirror
    assert_eq!(
        ctx.storefront.cart().snapshot().map(|c| c.total_items),
        Some(2)
    );
}

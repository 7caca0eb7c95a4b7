//! Moving between the guest cart and account carts.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use storecart::CartResult;
use storecart_core::{CartLineId, EntryKey, ItemKey, ProductId};
use storecart_integration_tests::{TestContext, album, product, settled};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn cart_with_line(id: i64, title: &str) -> serde_json::Value {
    json!({
        "cart": {
            "items": [{"id": id, "item_type": "product", "product_id": id, "quantity": 1,
                       "product": {"id": id, "name": title, "price": "10"}}],
            "total": "10"
        }
    })
}

#[tokio::test]
async fn test_sign_in_shows_account_cart_and_keeps_guest_cart() {
    let ctx = TestContext::guest().await;
    ctx.serve_cart(cart_with_line(1, "Account Tee")).await;

    ctx.facade.add_to_cart(album(4, 8, None), 2).await;
    let guest_view = ctx.facade.view();

    ctx.session.sign_in(SecretString::from("tok_a"));
    let mut receiver = ctx.facade.subscribe().await;
    let account_view = settled(&mut receiver).await;
    assert_eq!(account_view.items.len(), 1);
    assert_eq!(account_view.items[0].title, "Account Tee");

    // Guest lines are not merged into the account cart; they come back on sign-out
    ctx.session.sign_out();
    assert_eq!(ctx.facade.refresh().await, guest_view);
}

#[tokio::test]
async fn test_switching_users_never_shows_previous_cart() {
    let ctx = TestContext::signed_in("tok_a").await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer tok_a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_with_line(1, "Tee A")))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer tok_b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_with_line(2, "Tee B")))
        .mount(&ctx.server)
        .await;

    let first = ctx.facade.refresh().await;
    assert_eq!(first.items[0].key, EntryKey::Line(CartLineId::new(1)));

    ctx.session.sign_in(SecretString::from("tok_b"));

    let mut receiver = ctx.facade.subscribe().await;
    assert!(ctx.facade.view().items.iter().all(|item| item.title != "Tee A"));
    let second = settled(&mut receiver).await;
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].key, EntryKey::Line(CartLineId::new(2)));
    assert_eq!(second.items[0].title, "Tee B");
}

#[tokio::test]
async fn test_slow_fetch_from_previous_user_is_discarded() {
    let ctx = TestContext::signed_in("tok_a").await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer tok_a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(cart_with_line(1, "Tee A"))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer tok_b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_with_line(2, "Tee B")))
        .mount(&ctx.server)
        .await;

    // User A's fetch is still in flight when user B signs in.
    let slow = tokio::spawn({
        let facade = ctx.facade.clone();
        async move { facade.refresh().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx.session.sign_in(SecretString::from("tok_b"));

    let mut receiver = ctx.facade.subscribe().await;
    let second = settled(&mut receiver).await;
    assert_eq!(second.items[0].key, EntryKey::Line(CartLineId::new(2)));

    slow.await.expect("Refresh task panicked");
    let view = ctx.facade.view();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].title, "Tee B");

    // A's line must not be resolvable through B's cart.
    let a_line = EntryKey::Item(ItemKey::Product(ProductId::new(1)));
    assert_eq!(
        ctx.facade.update_cart_item(a_line, 3).await,
        CartResult::failed("Item not found in cart")
    );

    let patches = ctx
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == "PATCH")
        .count();
    assert_eq!(patches, 0);
}

#[tokio::test]
async fn test_sign_out_routes_mutations_to_guest_cart() {
    let ctx = TestContext::signed_in("tok_a").await;
    ctx.serve_cart(cart_with_line(1, "Tee A")).await;
    ctx.facade.refresh().await;

    ctx.session.sign_out();
    assert!(ctx.facade.add_to_cart(product(6, 3), 3).await.success);

    let view = ctx.facade.view();
    assert_eq!(view.count, 3);
    assert!(!view.is_loading);

    let posts = ctx
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 0);
}

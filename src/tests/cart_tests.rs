// Cart Tests - cart lines, pack mode, totals, persistence and checkout

use super::helpers::{client, product, sale, settle, FakeBackend};
use crate::cart::{Cart, CartEngine, LineUpdate, CHECKOUT_FAILED};
use crate::storage::{LocalStore, CART_KEY};
use crate::Error;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use tokio::time::Duration;

fn new_engine() -> (CartEngine<FakeBackend>, FakeBackend, Arc<LocalStore>) {
    let backend = FakeBackend::new();
    let store = Arc::new(LocalStore::new_in_memory().unwrap());
    let engine = CartEngine::new(backend.clone(), store.clone()).unwrap();
    (engine, backend, store)
}

// Cart lines

#[test]
fn test_add_same_product_twice() {
    let mut cart = Cart::new();
    let bread = product(1, "Bread", dec!(10), None);

    cart.add_item(&bread);
    cart.add_item(&bread);

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.line(1).unwrap().quantity, 2);
}

#[test]
fn test_new_line_uses_catalog_price() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Bread", dec!(12.50), None));

    let line = cart.line(1).unwrap();
    assert_eq!(line.sold_price, dec!(12.50));
    assert_eq!(line.quantity, 1);
    assert!(!line.is_pack_mode);
}

#[test]
fn test_total_is_sum_of_lines() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Milk", dec!(10), None));
    cart.add_item(&product(2, "Eggs", dec!(5), None));
    cart.update_line(1, LineUpdate { quantity: Some(3), ..Default::default() });
    cart.update_line(2, LineUpdate { quantity: Some(2), ..Default::default() });

    assert_eq!(cart.total(), dec!(40));
    assert_eq!(cart.item_count(), 5);
}

#[test]
fn test_quantity_never_below_one() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Milk", dec!(10), Some(6)));

    cart.update_line(1, LineUpdate { quantity: Some(0), ..Default::default() });
    assert_eq!(cart.line(1).unwrap().quantity, 1);

    cart.update_line(1, LineUpdate { quantity: Some(-5), ..Default::default() });
    assert_eq!(cart.line(1).unwrap().quantity, 1);

    cart.toggle_pack_mode(1);
    cart.update_line(1, LineUpdate { pack_count: Some(0), ..Default::default() });
    assert_eq!(cart.line(1).unwrap().quantity, 6);

    cart.update_line(1, LineUpdate { quantity: Some(0), ..Default::default() });
    assert_eq!(cart.line(1).unwrap().quantity, 6);
}

#[test]
fn test_remove_item() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Milk", dec!(10), None));
    cart.add_item(&product(2, "Eggs", dec!(5), None));

    cart.remove_item(1);
    cart.remove_item(99);

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].product_id, 2);
}

// Pack mode

#[test]
fn test_toggle_pack_mode_resets_to_one_pack() {
    let mut cart = Cart::new();
    let water = product(1, "Water", dec!(2), Some(6));
    cart.add_item(&water);
    cart.update_line(1, LineUpdate { quantity: Some(4), ..Default::default() });

    cart.toggle_pack_mode(1);

    let line = cart.line(1).unwrap();
    assert!(line.is_pack_mode);
    assert_eq!(line.pack_count, 1);
    assert_eq!(line.quantity, 6);
}

#[test]
fn test_toggle_pack_mode_off_keeps_quantity() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Water", dec!(2), Some(6)));
    cart.toggle_pack_mode(1);
    cart.update_line(1, LineUpdate { pack_count: Some(3), ..Default::default() });

    cart.toggle_pack_mode(1);

    let line = cart.line(1).unwrap();
    assert!(!line.is_pack_mode);
    assert_eq!(line.quantity, 18);
}

#[test]
fn test_add_item_in_pack_mode_adds_a_pack() {
    let mut cart = Cart::new();
    let water = product(1, "Water", dec!(2), Some(6));
    cart.add_item(&water);
    cart.toggle_pack_mode(1);

    cart.add_item(&water);

    let line = cart.line(1).unwrap();
    assert_eq!(line.pack_count, 2);
    assert_eq!(line.quantity, 12);
    assert_eq!(cart.total(), dec!(24));
}

#[test]
fn test_pack_mode_quantity_rounds_down_to_whole_packs() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Water", dec!(2), Some(6)));
    cart.update_line(1, LineUpdate { is_pack_mode: Some(true), ..Default::default() });

    cart.update_line(1, LineUpdate { quantity: Some(13), ..Default::default() });

    let line = cart.line(1).unwrap();
    assert_eq!(line.pack_count, 2);
    assert_eq!(line.quantity, 12);
}

#[test]
fn test_pack_mode_without_pack_size_uses_one() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Soap", dec!(3), Some(0)));
    cart.toggle_pack_mode(1);

    assert_eq!(cart.line(1).unwrap().quantity, 1);
}

// Prices

#[test]
fn test_set_line_price_input_accepts_comma() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Cheese", dec!(10), None));

    cart.set_line_price_input(1, "12,5").unwrap();

    assert_eq!(cart.line(1).unwrap().sold_price, dec!(12.5));
}

#[test]
fn test_set_line_price_input_rejects_garbage() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Cheese", dec!(10), None));

    let result = cart.set_line_price_input(1, "abc");

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(cart.line(1).unwrap().sold_price, dec!(10));
}

#[test]
fn test_set_line_price_rejects_negative() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Cheese", dec!(10), None));

    assert!(cart.set_line_price_input(1, "-1").is_err());
    assert!(cart.set_line_price(1, dec!(-0.01)).is_err());
    assert_eq!(cart.line(1).unwrap().sold_price, dec!(10));

    cart.set_line_price(1, dec!(0)).unwrap();
    assert_eq!(cart.line(1).unwrap().sold_price, dec!(0));
}

// Payment rule

#[test]
fn test_walk_in_buyer_must_pay_in_full() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Milk", dec!(10), None));

    assert!(matches!(cart.validate_payment(dec!(5)), Err(Error::Validation(_))));
    assert!(cart.validate_payment(dec!(10)).is_ok());

    cart.set_client(Some(client(7, "Bob")));
    assert!(cart.validate_payment(dec!(5)).is_ok());
}

#[test]
fn test_sale_request_wire_format() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Milk", dec!(10), None));
    cart.add_item(&product(1, "Milk", dec!(10), None));
    cart.set_client(Some(client(7, "Bob")));

    let request = cart.to_sale_request(Some(dec!(5)));
    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(
        body,
        json!({
            "items": [{"product_id": 1, "quantity": 2, "price": 10.0, "sold_price": 10.0}],
            "client_id": 7,
            "paid_amount": 5.0
        })
    );
}

#[test]
fn test_sale_request_paid_defaults_to_total() {
    let mut cart = Cart::new();
    cart.add_item(&product(1, "Milk", dec!(10), None));
    cart.add_item(&product(2, "Eggs", dec!(2.5), None));

    let request = cart.to_sale_request(None);

    assert_eq!(request.paid_amount, dec!(12.5));
    assert_eq!(request.client_id, None);
}

// Engine

#[tokio::test]
async fn test_checkout_empty_cart_makes_no_call() {
    let (engine, backend, _store) = new_engine();

    let result = engine.checkout(None).await;

    assert!(matches!(result, Err(Error::EmptyCart)));
    assert!(backend.sale_requests().is_empty());
}

#[tokio::test]
async fn test_checkout_success_clears_cart() {
    let (engine, backend, _store) = new_engine();
    backend.push_sale_result(Ok(sale(42)));
    engine.add_item(&product(1, "Milk", dec!(10), None)).await;
    engine.set_client(Some(client(7, "Bob"))).await;

    let created = engine.checkout(Some(dec!(4))).await.unwrap();

    assert_eq!(created.id, 42);
    assert!(engine.lines().await.is_empty());
    assert!(engine.selected_client().await.is_none());
    assert!(!engine.is_checking_out());

    let requests = backend.sale_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].client_id, Some(7));
    assert_eq!(requests[0].paid_amount, dec!(4));
}

#[tokio::test]
async fn test_checkout_failure_keeps_cart() {
    let (engine, backend, _store) = new_engine();
    backend.push_sale_result(Err(Error::Remote {
        status: 400,
        detail: Some("Not enough stock for Milk".to_string()),
    }));
    engine.add_item(&product(1, "Milk", dec!(10), None)).await;

    let result = engine.checkout(None).await;

    match result {
        Err(Error::Checkout(message)) => assert_eq!(message, "Not enough stock for Milk"),
        other => panic!("Unexpected result: {:?}", other),
    }
    assert_eq!(engine.lines().await.len(), 1);
    assert!(!engine.is_checking_out());
}

#[tokio::test]
async fn test_checkout_failure_without_detail_uses_generic_message() {
    let (engine, backend, _store) = new_engine();
    backend.push_sale_result(Err(Error::Remote {
        status: 500,
        detail: None,
    }));
    engine.add_item(&product(1, "Milk", dec!(10), None)).await;

    let err = engine.checkout(None).await.unwrap_err();

    assert_eq!(err.to_string(), CHECKOUT_FAILED);
}

#[tokio::test(start_paused = true)]
async fn test_second_checkout_rejected_while_in_flight() {
    let (engine, backend, _store) = new_engine();
    backend.set_sale_delay(Duration::from_millis(500));
    engine.add_item(&product(1, "Milk", dec!(10), None)).await;
    let engine = Arc::new(engine);

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.checkout(None).await }
    });
    settle().await;

    assert!(engine.is_checking_out());
    assert!(matches!(engine.checkout(None).await, Err(Error::CheckoutInProgress)));

    assert!(first.await.unwrap().is_ok());
    assert_eq!(backend.sale_requests().len(), 1);
    assert!(!engine.is_checking_out());
}

#[tokio::test(start_paused = true)]
async fn test_checkout_flag_held_until_cart_cleared() {
    let (engine, backend, _store) = new_engine();
    backend.set_sale_delay(Duration::from_millis(500));
    engine.add_item(&product(1, "Milk", dec!(10), None)).await;
    let engine = Arc::new(engine);

    // Sale succeeds but the cart cannot be cleared while a reader holds it
    let reader = engine.read_guard().await;
    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.checkout(None).await }
    });
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    assert_eq!(backend.sale_requests().len(), 1);
    assert!(engine.is_checking_out());

    drop(reader);
    assert!(first.await.unwrap().is_ok());

    assert!(!engine.is_checking_out());
    assert!(engine.lines().await.is_empty());
    assert!(matches!(engine.checkout(None).await, Err(Error::EmptyCart)));
    assert_eq!(backend.sale_requests().len(), 1);
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let (engine, backend, store) = new_engine();
    engine.add_item(&product(1, "Milk", dec!(10), Some(6))).await;
    engine.toggle_pack_mode(1).await;
    engine.set_client(Some(client(7, "Bob"))).await;
    drop(engine);

    let restored = CartEngine::new(backend, store).unwrap();

    let lines = restored.lines().await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].is_pack_mode);
    assert_eq!(lines[0].quantity, 6);
    assert_eq!(restored.selected_client().await.unwrap().id, 7);
}

#[tokio::test]
async fn test_unreadable_saved_cart_is_discarded() {
    let backend = FakeBackend::new();
    let store = Arc::new(LocalStore::new_in_memory().unwrap());
    store.set(CART_KEY, "{not a cart").unwrap();

    let engine = CartEngine::new(backend, store).unwrap();

    assert!(engine.lines().await.is_empty());
}

#[tokio::test]
async fn test_engine_price_edit_is_persisted() {
    let (engine, backend, store) = new_engine();
    engine.add_item(&product(1, "Milk", dec!(10), None)).await;
    engine.set_line_price_input(1, "8,75").await.unwrap();
    assert!(engine.set_line_price_input(1, "free").await.is_err());
    drop(engine);

    let restored = CartEngine::new(backend, store).unwrap();

    assert_eq!(restored.total().await, dec!(8.75));
}

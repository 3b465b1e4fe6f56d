// Receipt Tests - decoding every known receipt shape

use crate::config::Settings;
use crate::models::{Client, Sale, SaleItem, SaleItemProduct};
use crate::receipt::*;
use crate::Error;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

#[test]
fn test_normalize_current_shape() {
    let receipt =
        normalize_receipt(r#"{"total_amount":100,"items":[{"name":"X","quantity":2,"price":10}]}"#).unwrap();

    assert_eq!(receipt.total_amount, dec!(100));
    assert_eq!(receipt.client_name, GUEST_NAME);
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].product_name, "X");
    assert_eq!(receipt.items[0].quantity, dec!(2));
    assert_eq!(receipt.items[0].price, dec!(10));
    assert_eq!(receipt.items_count, 1);
}

#[test]
fn test_normalize_double_encoded() {
    let receipt = normalize_receipt(r#""{\"total\":50}""#).unwrap();

    assert_eq!(receipt.total_amount, dec!(50));
    assert!(receipt.items.is_empty());
    assert_eq!(receipt.title, DEFAULT_TITLE);
}

#[test]
fn test_normalize_invalid_json() {
    assert!(matches!(normalize_receipt("not json"), Err(Error::InvalidReceipt(_))));
    assert!(matches!(normalize_receipt(r#""still not json""#), Err(Error::InvalidReceipt(_))));
    assert!(matches!(normalize_receipt("42"), Err(Error::InvalidReceipt(_))));
    assert!(matches!(normalize_receipt(r#""\"triple\"""#), Err(Error::InvalidReceipt(_))));
}

#[test]
fn test_normalize_item_field_fallbacks() {
    let receipt = normalize_receipt(
        r#"{
            "client": "Bob",
            "items": [
                {"product": {"name": "Nested"}, "product_name": "Flat", "sold_price": "7.5"},
                {"product_name": "Flat", "price": 0, "sold_price": 3, "unit": "kg", "quantity": 1.5},
                {}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(receipt.client_name, "Bob");
    assert_eq!(receipt.total_amount, dec!(0));

    let items = &receipt.items;
    assert_eq!(items[0].product_name, "Nested");
    assert_eq!(items[0].price, dec!(7.5));
    assert_eq!(items[0].quantity, dec!(1));
    assert_eq!(items[0].unit, "pcs");

    assert_eq!(items[1].product_name, "Flat");
    assert_eq!(items[1].price, dec!(3));
    assert_eq!(items[1].quantity, dec!(1.5));
    assert_eq!(items[1].unit, "kg");

    assert_eq!(items[2].product_name, UNNAMED_ITEM);
    assert_eq!(items[2].price, dec!(0));
}

#[test]
fn test_client_name_prefers_new_field() {
    let receipt = normalize_receipt(r#"{"client_name":"Ann","client":"Bob","total":1}"#).unwrap();
    assert_eq!(receipt.client_name, "Ann");

    let receipt = normalize_receipt(r#"{"client_name":"","client":"Bob"}"#).unwrap();
    assert_eq!(receipt.client_name, "Bob");
}

#[test]
fn test_explicit_items_count_and_hidden_items() {
    let items: Vec<Value> = (0..3).map(|i| json!({"name": format!("P{}", i), "price": 1})).collect();
    let raw = json!({"total": 7, "items": items, "itemsCount": 7}).to_string();

    let receipt = normalize_receipt(&raw).unwrap();

    assert_eq!(receipt.items.len(), 3);
    assert_eq!(receipt.items_count, 7);
    assert_eq!(receipt.hidden_items(3), 4);
    assert_eq!(receipt.preview(2).len(), 2);
    assert_eq!(receipt.preview(10).len(), 3);
}

#[test]
fn test_hidden_items_without_overflow() {
    let receipt = normalize_receipt(r#"{"items":[{"name":"A"},{"name":"B"}]}"#).unwrap();

    assert_eq!(receipt.items_count, 2);
    assert_eq!(receipt.hidden_items(3), 0);
}

#[test]
fn test_card_lines_hide_items_past_preview_limit() {
    let items: Vec<Value> = (1..=5)
        .map(|i| json!({"name": format!("P{}", i), "quantity": 2, "price": i}))
        .collect();
    let raw = json!({"title": "Sale #4", "client_name": "Ann", "total": 30, "items": items}).to_string();
    let receipt = normalize_receipt(&raw).unwrap();

    let lines = receipt.card_lines(Settings::default().receipt_preview_items);

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Sale #4 for Ann: 30");
    assert_eq!(lines[1], "  P1 x2 pcs = 2");
    assert_eq!(lines[3], "  P3 x2 pcs = 6");
    assert_eq!(lines[4], "  +2 more");

    let lines = receipt.card_lines(10);
    assert_eq!(lines.len(), 6);
    assert!(!lines.iter().any(|l| l.contains("more")));
}

#[test]
fn test_to_content_uses_current_names() {
    let receipt = normalize_receipt(r#"{"title":"Sale #9","total":12.5,"client":"Bob","items":[{"name":"Tea","price":12.5}]}"#)
        .unwrap();

    let content: Value = serde_json::from_str(&receipt.to_content().unwrap()).unwrap();

    assert_eq!(content["title"], "Sale #9");
    assert_eq!(content["client_name"], "Bob");
    assert_eq!(content["total_amount"], json!(12.5));
    assert_eq!(content["itemsCount"], json!(1));
    assert_eq!(content["items"][0]["product_name"], "Tea");
    assert!(content.get("total").is_none());
}

#[test]
fn test_receipt_from_sale() {
    let sale = Sale {
        id: 9,
        items: vec![
            SaleItem {
                product_id: Some(1),
                product: Some(SaleItemProduct {
                    name: Some("Milk".to_string()),
                    unit: Some("l".to_string()),
                }),
                product_name: None,
                quantity: Some(dec!(2)),
                price: Some(dec!(10)),
                sold_price: Some(dec!(10)),
                unit: None,
            },
            SaleItem {
                product_id: Some(2),
                product: None,
                product_name: Some("Bread".to_string()),
                quantity: Some(dec!(1)),
                price: None,
                sold_price: Some(dec!(4)),
                unit: None,
            },
        ],
        client: Some(Client {
            id: 7,
            full_name: "Bob".to_string(),
            phone: None,
            total_debt: None,
        }),
        client_id: Some(7),
        total_amount: None,
        paid_amount: Some(dec!(24)),
        created_at: Some("2024-03-01T10:00:00".to_string()),
    };

    let receipt = Receipt::from_sale(&sale, Some("Sale #9")).unwrap();

    assert_eq!(receipt.title, "Sale #9");
    assert_eq!(receipt.client_name, "Bob");
    assert_eq!(receipt.date.as_deref(), Some("2024-03-01T10:00:00"));
    assert_eq!(receipt.total_amount, dec!(24));
    assert_eq!(receipt.items[0].product_name, "Milk");
    assert_eq!(receipt.items[0].unit, "l");
    assert_eq!(receipt.items[1].product_name, "Bread");
    assert_eq!(receipt.items[1].price, dec!(4));
    assert_eq!(receipt.items_count, 2);
}

#[test]
fn test_receipt_from_walk_in_sale() {
    let sale = Sale {
        id: 3,
        items: Vec::new(),
        client: None,
        client_id: None,
        total_amount: Some(dec!(15)),
        paid_amount: Some(dec!(15)),
        created_at: None,
    };

    let receipt = Receipt::from_sale(&sale, None).unwrap();

    assert_eq!(receipt.client_name, GUEST_NAME);
    assert_eq!(receipt.total_amount, dec!(15));
    assert_eq!(receipt.title, DEFAULT_TITLE);
}

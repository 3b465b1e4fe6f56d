//! Receipt transcoder
//!
//! Receipts travel through the chat as the content of RECEIPT messages.
//! Producers have written them under several field names over time, and
//! one of them double-encodes the JSON. `normalize_receipt` reads every
//! known shape into the canonical [`Receipt`]; `Receipt::to_content`
//! writes the current shape.

use crate::{
    decode::{first_decimal, first_i64, first_text},
    models::Sale,
    Error, Result,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

/// Client label when a receipt names no buyer
pub const GUEST_NAME: &str = "guest";

/// Product label when a receipt item has no name
pub const UNNAMED_ITEM: &str = "item";

/// Title used when a receipt carries none
pub const DEFAULT_TITLE: &str = "Sale receipt";

const DEFAULT_UNIT: &str = "pcs";

/// One receipt line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptItem {
    /// Product name
    pub product_name: String,
    /// Quantity sold
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    /// Unit label
    pub unit: String,
    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl ReceiptItem {
    /// Line amount
    pub fn subtotal(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Canonical receipt
///
/// `items` is always the full list. Views that show only the first few
/// lines use [`Receipt::hidden_items`] for the "+N more" marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// Heading
    pub title: String,
    /// Sale date as sent by the producer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Buyer name, or [`GUEST_NAME`]
    pub client_name: String,
    /// Total amount
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Lines
    pub items: Vec<ReceiptItem>,
    /// Declared line count; may exceed `items.len()`
    #[serde(rename = "itemsCount")]
    pub items_count: usize,
}

impl Receipt {
    /// Build a receipt from a created sale
    pub fn from_sale(sale: &Sale, title: Option<&str>) -> Result<Self> {
        let mut value = serde_json::to_value(sale)?;
        if let (Value::Object(map), Some(title)) = (&mut value, title) {
            map.insert("title".to_string(), Value::String(title.to_string()));
        }
        let mut receipt = normalize_receipt_value(&value)?;
        if sale.total_amount.is_none() {
            receipt.total_amount = receipt.items.iter().map(ReceiptItem::subtotal).sum();
        }
        Ok(receipt)
    }

    /// Serialize as chat message content
    pub fn to_content(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Lines left out when only `limit` are displayed
    pub fn hidden_items(&self, limit: usize) -> usize {
        self.items_count.saturating_sub(limit)
    }

    /// First `limit` lines
    pub fn preview(&self, limit: usize) -> &[ReceiptItem] {
        &self.items[..self.items.len().min(limit)]
    }

    /// Text card for a chat bubble: header, the first `limit` items, then
    /// a "+N more" line when items are hidden
    pub fn card_lines(&self, limit: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "{} for {}: {}",
            self.title, self.client_name, self.total_amount
        )];
        lines.extend(self.preview(limit).iter().map(|item| {
            format!(
                "  {} x{} {} = {}",
                item.product_name,
                item.quantity,
                item.unit,
                item.subtotal()
            )
        }));
        let hidden = self.hidden_items(limit);
        if hidden > 0 {
            lines.push(format!("  +{} more", hidden));
        }
        lines
    }
}

/// Decode receipt text in any known shape
///
/// The text is parsed once; if that yields a JSON string, the string is
/// parsed again. Anything that does not end up as a JSON object is
/// `Error::InvalidReceipt`.
///
/// # Example
/// ```rust
/// use pos_admin::receipt::normalize_receipt;
///
/// let receipt = normalize_receipt(r#""{\"total\":50}""#).unwrap();
/// assert_eq!(receipt.total_amount, rust_decimal::Decimal::from(50));
/// assert_eq!(receipt.client_name, "guest");
/// ```
pub fn normalize_receipt(raw: &str) -> Result<Receipt> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidReceipt(e.to_string()))?;

    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner).map_err(|e| Error::InvalidReceipt(e.to_string()))?;
    }

    normalize_receipt_value(&value)
}

/// Decode an already parsed receipt object
pub fn normalize_receipt_value(value: &Value) -> Result<Receipt> {
    if !value.is_object() {
        return Err(Error::InvalidReceipt(format!(
            "expected an object, got {}",
            kind_of(value)
        )));
    }

    let items: Vec<ReceiptItem> = value
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_item).collect())
        .unwrap_or_default();

    let items_count = first_i64(value, &["/itemsCount", "/items_count"])
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(items.len());

    Ok(Receipt {
        title: first_text(value, &["/title"]).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        date: first_text(value, &["/date", "/created_at"]),
        client_name: first_text(value, &["/client_name", "/client/full_name", "/client"])
            .unwrap_or_else(|| GUEST_NAME.to_string()),
        total_amount: first_decimal(value, &["/total_amount", "/total"]).unwrap_or_default(),
        items,
        items_count,
    })
}

fn normalize_item(item: &Value) -> ReceiptItem {
    ReceiptItem {
        product_name: first_text(item, &["/product/name", "/product_name", "/name"])
            .unwrap_or_else(|| UNNAMED_ITEM.to_string()),
        quantity: first_decimal(item, &["/quantity"]).unwrap_or(Decimal::ONE),
        unit: first_text(item, &["/unit", "/product/unit"])
            .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        price: first_decimal(item, &["/price", "/sold_price"]).unwrap_or_default(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

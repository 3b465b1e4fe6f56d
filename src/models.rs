//! REST payload types
//!
//! These mirror the backend's JSON shapes. Optional fields carry
//! `#[serde(default)]` because the backend omits or nulls them freely.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User identifier assigned by the backend
pub type UserId = i64;
/// Product identifier assigned by the backend
pub type ProductId = i64;
/// Customer identifier assigned by the backend
pub type ClientId = i64;

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access
    #[serde(alias = "ADMIN")]
    Admin,
    /// Stock and client management
    #[serde(alias = "MANAGER")]
    Manager,
    /// Sales floor
    #[serde(alias = "WORKER")]
    Worker,
    /// Role this client does not know about
    #[serde(other)]
    Other,
}

impl Role {
    /// Whether the role may move stock and edit clients
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

/// Staff account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Role
    pub role: Role,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Whether the account is enabled
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl User {
    /// Name to show in the UI: username, else full name
    pub fn display_name(&self) -> &str {
        if !self.username.is_empty() {
            &self.username
        } else {
            self.full_name.as_deref().unwrap_or_default()
        }
    }
}

/// Payload for creating or updating a user
#[derive(Debug, Clone, Serialize)]
pub struct UserForm {
    /// Login name
    pub username: String,
    /// Password; omitted on update to keep the current one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Role
    pub role: Role,
}

/// Response of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: String,
    /// Token type, normally "bearer"
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit label ("pcs", "kg", ...)
    #[serde(default)]
    pub unit: Option<String>,
    /// Purchase price
    #[serde(default)]
    pub buy_price: Option<Decimal>,
    /// Catalog sell price
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    /// Units in stock
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Low-stock warning threshold
    #[serde(default)]
    pub min_stock_level: Option<i64>,
    /// Units per pack
    #[serde(default)]
    pub items_per_pack: Option<u32>,
}

impl Product {
    /// Sell price, zero when the backend has none
    pub fn sell_price(&self) -> Decimal {
        self.sell_price.unwrap_or(Decimal::ZERO)
    }

    /// Units per pack, at least 1
    pub fn items_per_pack(&self) -> u32 {
        self.items_per_pack.unwrap_or(1).max(1)
    }

    /// Whether stock is at or below the warning threshold
    pub fn is_low_stock(&self) -> bool {
        match (self.quantity, self.min_stock_level) {
            (Some(quantity), Some(min)) => quantity <= Decimal::from(min),
            _ => false,
        }
    }
}

/// Payload for creating or updating a product
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductForm {
    /// Display name
    pub name: String,
    /// Unit label
    pub unit: String,
    /// Purchase price
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_price: Decimal,
    /// Sell price
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_price: Decimal,
    /// Low-stock threshold
    pub min_stock_level: i64,
    /// Units per pack
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_per_pack: Option<u32>,
    /// Initial stock (new products start empty; stock arrives via movements)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received
    In,
    /// Stock written off or returned
    Out,
}

/// Payload for `POST /inventory/movements`
#[derive(Debug, Clone, Serialize)]
pub struct NewMovement {
    /// Product the movement applies to
    pub product_id: ProductId,
    /// Direction
    #[serde(rename = "type")]
    pub kind: MovementKind,
    /// Amount moved
    #[serde(with = "rust_decimal::serde::float")]
    pub change_amount: Decimal,
    /// Free-text comment
    pub comment: String,
}

/// Stock movement record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Movement {
    /// Movement ID
    pub id: i64,
    /// Product ID
    pub product_id: ProductId,
    /// Direction as reported by the backend
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Amount moved
    #[serde(default)]
    pub change_amount: Option<Decimal>,
    /// Comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Customer, possibly carrying debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Client ID
    pub id: ClientId,
    /// Display name
    pub full_name: String,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Outstanding debt
    #[serde(default)]
    pub total_debt: Option<Decimal>,
}

/// Payload for creating or updating a client
#[derive(Debug, Clone, Serialize)]
pub struct ClientForm {
    /// Display name
    pub full_name: String,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Payload for `POST /clients/payments` (a client paying down debt)
#[derive(Debug, Clone, Serialize)]
pub struct NewPayment {
    /// Paying client
    pub client_id: ClientId,
    /// Amount paid
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Description shown in the client's history
    pub description: String,
}

/// One line of a checkout request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRequestItem {
    /// Product sold
    pub product_id: ProductId,
    /// Quantity in base units
    pub quantity: u32,
    /// Effective unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Same as `price`; older backends read this name
    #[serde(with = "rust_decimal::serde::float")]
    pub sold_price: Decimal,
}

/// Body of `POST /sales/sales`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRequest {
    /// Lines sold
    pub items: Vec<SaleRequestItem>,
    /// Buyer; `None` for a walk-in customer
    pub client_id: Option<ClientId>,
    /// Amount handed over
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
}

/// Product summary nested inside a sale item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemProduct {
    /// Product name
    #[serde(default)]
    pub name: Option<String>,
    /// Unit label
    #[serde(default)]
    pub unit: Option<String>,
}

/// Line of a created sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    /// Product sold
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Nested product, when the backend expands it
    #[serde(default)]
    pub product: Option<SaleItemProduct>,
    /// Flat product name, when the backend provides it
    #[serde(default)]
    pub product_name: Option<String>,
    /// Quantity in base units
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Unit price
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Unit price under its older name
    #[serde(default)]
    pub sold_price: Option<Decimal>,
    /// Unit label
    #[serde(default)]
    pub unit: Option<String>,
}

/// Sale as returned by the backend after checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Sale ID
    pub id: i64,
    /// Lines sold
    #[serde(default)]
    pub items: Vec<SaleItem>,
    /// Buyer, when expanded
    #[serde(default)]
    pub client: Option<Client>,
    /// Buyer ID
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Total amount
    #[serde(default, alias = "total")]
    pub total_amount: Option<Decimal>,
    /// Amount paid
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Expense entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Expense {
    /// Expense ID
    pub id: i64,
    /// Amount spent
    pub amount: Decimal,
    /// Category label
    #[serde(default)]
    pub category: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Expense date
    #[serde(default)]
    pub date: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Payload for `POST /expenses`
#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    /// Amount spent
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Category label
    pub category: String,
    /// Description
    pub description: String,
}

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Rows to skip
    pub skip: u32,
    /// Rows to return
    pub limit: u32,
}

impl Page {
    /// Page from a 1-based page number
    pub fn number(page: u32, limit: u32) -> Self {
        Self {
            skip: page.saturating_sub(1) * limit,
            limit,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::number(1, 20)
    }
}

/// Analytics reporting window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsPeriod {
    /// Named quick period ("today", "week", "month", ...)
    Quick(String),
    /// Calendar month
    Month {
        /// Year
        year: i32,
        /// Month, 1-12
        month: u32,
    },
}

impl AnalyticsPeriod {
    /// Query parameters for `GET /analytics/stats`
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            AnalyticsPeriod::Quick(period) => vec![("period", period.clone())],
            AnalyticsPeriod::Month { year, month } => {
                vec![("year", year.to_string()), ("month", month.to_string())]
            }
        }
    }
}

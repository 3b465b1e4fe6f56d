//! Cart lines and the cart state machine

use crate::{
    models::{Client, Product, ProductId, SaleRequest, SaleRequestItem},
    Error, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One product in the cart
///
/// `quantity` is always in base units, never in packs, and never below 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line sells
    pub product_id: ProductId,
    /// Product name
    pub name: String,
    /// Unit label
    pub unit: String,
    /// Units per pack, at least 1
    pub items_per_pack: u32,
    /// Quantity in base units
    pub quantity: u32,
    /// Unit price charged; starts at the catalog price
    pub sold_price: Decimal,
    /// Whether quantity is edited in whole packs
    pub is_pack_mode: bool,
    /// Pack count shown while in pack mode
    #[serde(default)]
    pub pack_count: u32,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit: product.unit.clone().unwrap_or_else(|| "pcs".to_string()),
            items_per_pack: product.items_per_pack(),
            quantity: 1,
            sold_price: product.sell_price(),
            is_pack_mode: false,
            pack_count: 0,
        }
    }

    /// Line amount: price times quantity
    pub fn subtotal(&self) -> Decimal {
        self.sold_price * Decimal::from(self.quantity)
    }

    fn set_quantity(&mut self, quantity: i64) {
        let quantity = quantity.clamp(1, u32::MAX as i64) as u32;
        if self.is_pack_mode {
            self.set_packs(quantity / self.items_per_pack);
        } else {
            self.quantity = quantity;
        }
    }

    fn set_packs(&mut self, packs: u32) {
        let packs = packs.max(1);
        self.pack_count = packs;
        self.quantity = packs.saturating_mul(self.items_per_pack);
    }

    fn toggle_pack_mode(&mut self) {
        self.is_pack_mode = !self.is_pack_mode;
        if self.is_pack_mode {
            // Entering pack mode starts from one pack; the previous unit
            // quantity is not carried over.
            self.set_packs(1);
        } else {
            self.pack_count = 0;
        }
    }
}

/// Partial edit of a cart line; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineUpdate {
    /// New quantity in base units; values below 1 become 1
    pub quantity: Option<i64>,
    /// New unit price
    pub sold_price: Option<Decimal>,
    /// Switch pack mode on or off
    pub is_pack_mode: Option<bool>,
    /// New pack count (applies in pack mode)
    pub pack_count: Option<u32>,
}

/// Cart contents: one line per product plus the selected customer
///
/// Totals are derived on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    selected_client: Option<Client>,
}

impl Cart {
    /// Create an empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in the order products were added
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Line for a product
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    /// Selected customer; `None` is a walk-in buyer
    pub fn selected_client(&self) -> Option<&Client> {
        self.selected_client.as_ref()
    }

    /// Whether the cart has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of a product, or one pack if its line is in pack mode
    ///
    /// Stock is not checked here; the backend rejects oversells at checkout.
    pub fn add_item(&mut self, product: &Product) {
        match self.line_mut(product.id) {
            Some(line) if line.is_pack_mode => line.set_packs(line.pack_count.saturating_add(1)),
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine::from_product(product)),
        }
    }

    /// Remove a product's line; absent products are ignored
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Merge a partial edit into a line; absent products are ignored
    pub fn update_line(&mut self, product_id: ProductId, update: LineUpdate) {
        let Some(line) = self.line_mut(product_id) else {
            return;
        };

        if let Some(price) = update.sold_price {
            line.sold_price = price;
        }
        if let Some(pack_mode) = update.is_pack_mode {
            if pack_mode != line.is_pack_mode {
                line.toggle_pack_mode();
            }
        }
        if let Some(packs) = update.pack_count {
            if line.is_pack_mode {
                line.set_packs(packs);
            }
        }
        if let Some(quantity) = update.quantity {
            line.set_quantity(quantity);
        }
    }

    /// Commit a new unit price; negative prices are rejected
    pub fn set_line_price(&mut self, product_id: ProductId, price: Decimal) -> Result<()> {
        if price < Decimal::ZERO {
            return Err(Error::Validation(format!("Price cannot be negative: {}", price)));
        }
        if let Some(line) = self.line_mut(product_id) {
            line.sold_price = price;
        }
        Ok(())
    }

    /// Commit a price typed by the user
    ///
    /// Accepts a decimal comma. Non-numeric or negative input is rejected
    /// and the line keeps its current price.
    pub fn set_line_price_input(&mut self, product_id: ProductId, input: &str) -> Result<()> {
        let normalized = input.trim().replace(',', ".");
        let price = Decimal::from_str(&normalized)
            .map_err(|_| Error::Validation(format!("Not a valid price: {:?}", input)))?;
        self.set_line_price(product_id, price)
    }

    /// Flip pack mode on a line
    ///
    /// Switching into pack mode resets the line to exactly one pack.
    /// Switching out keeps the current total quantity.
    pub fn toggle_pack_mode(&mut self, product_id: ProductId) {
        if let Some(line) = self.line_mut(product_id) {
            line.toggle_pack_mode();
        }
    }

    /// Select the buyer, or `None` for a walk-in buyer
    pub fn set_client(&mut self, client: Option<Client>) {
        self.selected_client = client;
    }

    /// Remove all lines and the selected buyer
    pub fn clear(&mut self) {
        self.lines.clear();
        self.selected_client = None;
    }

    /// Sum of price times quantity over all lines
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of quantities in base units
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Check the walk-in payment rule before checkout
    ///
    /// Debt can only be recorded against a known client, so a walk-in
    /// buyer must pay at least the total. Checkout itself does not call
    /// this; the caller does.
    pub fn validate_payment(&self, paid_amount: Decimal) -> Result<()> {
        if self.selected_client.is_none() && paid_amount < self.total() {
            return Err(Error::Validation(format!(
                "A walk-in buyer must pay the full amount of {}",
                self.total()
            )));
        }
        Ok(())
    }

    /// Build the checkout request; `paid_amount` defaults to the total
    pub fn to_sale_request(&self, paid_amount: Option<Decimal>) -> SaleRequest {
        SaleRequest {
            items: self
                .lines
                .iter()
                .map(|line| SaleRequestItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.sold_price,
                    sold_price: line.sold_price,
                })
                .collect(),
            client_id: self.selected_client.as_ref().map(|c| c.id),
            paid_amount: paid_amount.unwrap_or_else(|| self.total()),
        }
    }
}

//! Sales history endpoints
//!
//! Checkout itself goes through `Backend::create_sale`.

use crate::{gateway::Gateway, models::ProductId, Result};
use serde_json::Value;

impl Gateway {
    /// Sales that included a product
    pub async fn product_sales_history(&self, id: ProductId) -> Result<Vec<Value>> {
        self.get_json(&format!("/sales/products/{}/history", id), &[])
            .await
    }
}

//! Catalog and stock endpoints

use crate::{
    gateway::Gateway,
    models::{Movement, NewMovement, Page, Product, ProductForm, ProductId},
    Result,
};
use reqwest::Method;
use serde_json::Value;

impl Gateway {
    /// List catalog products
    pub async fn list_products(&self, page: Page) -> Result<Vec<Product>> {
        let query = [("skip", page.skip.to_string()), ("limit", page.limit.to_string())];
        self.get_json("/inventory/products", &query).await
    }

    /// Create a product
    pub async fn create_product(&self, product: &ProductForm) -> Result<Product> {
        self.send_json(Method::POST, "/inventory/products", product).await
    }

    /// Update a product
    pub async fn update_product(&self, id: ProductId, product: &ProductForm) -> Result<Product> {
        self.send_json(Method::PUT, &format!("/inventory/products/{}", id), product)
            .await
    }

    /// Delete a product
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.delete(&format!("/inventory/products/{}", id)).await
    }

    /// Stock movements of one product
    pub async fn product_movements(&self, id: ProductId) -> Result<Vec<Movement>> {
        self.get_json(&format!("/inventory/products/{}/movements", id), &[])
            .await
    }

    /// Record a stock movement
    pub async fn record_movement(&self, movement: &NewMovement) -> Result<Value> {
        self.send_json(Method::POST, "/inventory/movements", movement).await
    }
}

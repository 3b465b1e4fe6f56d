//! Expense log endpoints

use crate::{
    gateway::Gateway,
    models::{Expense, NewExpense},
    Result,
};
use reqwest::Method;
use serde_json::Value;

impl Gateway {
    /// List expenses
    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        self.get_json("/expenses", &[]).await
    }

    /// Log an expense
    pub async fn create_expense(&self, expense: &NewExpense) -> Result<Value> {
        self.send_json(Method::POST, "/expenses", expense).await
    }

    /// Delete an expense
    pub async fn delete_expense(&self, id: i64) -> Result<()> {
        self.delete(&format!("/expenses/{}", id)).await
    }
}

//! Analytics endpoints
//!
//! Report shapes change often on the backend, so they stay raw JSON.

use crate::{gateway::Gateway, models::AnalyticsPeriod, Result};
use serde_json::Value;

impl Gateway {
    /// Financial statistics for a period
    pub async fn analytics_stats(&self, period: &AnalyticsPeriod) -> Result<Value> {
        self.get_json("/analytics/stats", &period.query()).await
    }

    /// Monthly stock report
    pub async fn stock_report(&self, year: i32, month: u32) -> Result<Vec<Value>> {
        let query = [("year", year.to_string()), ("month", month.to_string())];
        self.get_json("/analytics/stock-report", &query).await
    }
}

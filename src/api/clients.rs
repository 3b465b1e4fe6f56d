//! Customer and debt endpoints

use crate::{
    gateway::Gateway,
    models::{Client, ClientForm, ClientId, NewPayment, Page},
    Result,
};
use reqwest::Method;
use serde_json::Value;

impl Gateway {
    /// List clients, optionally filtered by a search string
    pub async fn list_clients(&self, page: Page, search: Option<&str>) -> Result<Vec<Client>> {
        let mut query = vec![("skip", page.skip.to_string()), ("limit", page.limit.to_string())];
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        self.get_json("/clients/clients", &query).await
    }

    /// Create a client
    pub async fn create_client(&self, client: &ClientForm) -> Result<Client> {
        self.send_json(Method::POST, "/clients/clients", client).await
    }

    /// Update a client
    pub async fn update_client(&self, id: ClientId, client: &ClientForm) -> Result<Client> {
        self.send_json(Method::PUT, &format!("/clients/clients/{}", id), client)
            .await
    }

    /// Delete a client
    pub async fn delete_client(&self, id: ClientId) -> Result<()> {
        self.delete(&format!("/clients/clients/{}", id)).await
    }

    /// Purchase and payment history of a client
    pub async fn client_history(&self, id: ClientId) -> Result<Vec<Value>> {
        self.get_json(&format!("/clients/clients/{}/history", id), &[])
            .await
    }

    /// Record a debt payment
    pub async fn record_payment(&self, payment: &NewPayment) -> Result<Value> {
        self.send_json(Method::POST, "/clients/payments", payment).await
    }
}

//! Staff account endpoints

use crate::{
    gateway::Gateway,
    models::{User, UserForm, UserId},
    Result,
};
use reqwest::Method;
use serde_json::Value;

impl Gateway {
    /// List staff accounts
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json("/auth/users", &[]).await
    }

    /// Create a staff account
    pub async fn create_user(&self, user: &UserForm) -> Result<Value> {
        self.send_json(Method::POST, "/auth/users", user).await
    }

    /// Update a staff account
    pub async fn update_user(&self, id: UserId, user: &UserForm) -> Result<Value> {
        self.send_json(Method::PUT, &format!("/auth/users/{}", id), user)
            .await
    }

    /// Delete a staff account
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        self.delete(&format!("/auth/users/{}", id)).await
    }
}

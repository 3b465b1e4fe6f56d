//! Remote call gateway
//!
//! One HTTP client for every REST call. It attaches the session's bearer
//! token to each request and turns a 401 from any endpoint into a forced
//! logout, so individual callers never handle expired sessions themselves.

use crate::{
    config::Settings,
    models::{Sale, SaleRequest, TokenResponse, User, UserId},
    session::Session,
    Error, Result,
};
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backend calls the engines depend on
///
/// `Gateway` is the production implementation; tests substitute fakes.
pub trait Backend: Send + Sync + 'static {
    /// Exchange credentials for a bearer token
    fn login(&self, username: &str, password: &str) -> impl Future<Output = Result<String>> + Send;

    /// Profile of the user owning the current token
    fn current_user(&self) -> impl Future<Output = Result<User>> + Send;

    /// Submit a checkout and return the created sale
    fn create_sale(&self, order: &SaleRequest) -> impl Future<Output = Result<Sale>> + Send;

    /// Raw chat history; `None` is the broadcast channel
    fn chat_history(&self, recipient: Option<UserId>) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Upload a chat attachment and return its URL
    fn upload_chat_file(&self, file_name: &str, bytes: Vec<u8>) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// HTTP gateway to the POS backend
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl Gateway {
    /// Create a gateway for `base_url` (e.g. "http://127.0.0.1:8000/api")
    pub fn new(base_url: impl Into<String>, session: Session, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Create a gateway from client settings
    pub fn from_settings(settings: &Settings, session: Session) -> Result<Self> {
        Self::new(&settings.api_base_url, session, settings.request_timeout())
    }

    /// Session this gateway authenticates with
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request with the bearer token attached
    ///
    /// A 401 logs the session out and yields `Error::Unauthorized`; any other
    /// non-success status yields `Error::Remote` with the server's detail.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session token, logging out");
            self.session.logout().await;
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let detail = match response.json::<Value>().await {
                Ok(body) => body.get("detail").and_then(detail_text),
                Err(_) => None,
            };
            debug!("Request failed with status {}: {:?}", status, detail);
            return Err(Error::Remote {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.execute(self.request(Method::GET, path).query(query)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.request(method, path).json(body)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

/// Render a `detail` field as text; FastAPI sends lists for validation errors
fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

impl Backend for Gateway {
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let request = self
            .request(Method::POST, "/auth/login")
            .form(&[("username", username), ("password", password)]);
        let response: TokenResponse = self.execute(request).await?.json().await?;
        Ok(response.access_token)
    }

    async fn current_user(&self) -> Result<User> {
        self.get_json("/auth/me", &[]).await
    }

    async fn create_sale(&self, order: &SaleRequest) -> Result<Sale> {
        self.send_json(Method::POST, "/sales/sales", order).await
    }

    async fn chat_history(&self, recipient: Option<UserId>) -> Result<Vec<Value>> {
        let query = match recipient {
            Some(id) => vec![("recipient_id", id.to_string())],
            None => Vec::new(),
        };
        self.get_json("/chat/history", &query).await
    }

    async fn upload_chat_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response: UploadResponse = self
            .execute(self.request(Method::POST, "/chat/upload").multipart(form))
            .await?
            .json()
            .await?;
        Ok(response.url)
    }
}

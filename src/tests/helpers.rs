// Test doubles shared by the engine tests

use crate::chat::{Connector, SocketLink};
use crate::gateway::Backend;
use crate::models::{Client, Product, Role, Sale, SaleRequest, User, UserId};
use crate::session::Session;
use crate::storage::LocalStore;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Duration;

pub const TEST_TOKEN: &str = "test-token";

pub fn user(id: UserId, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        full_name: None,
        role: Role::Worker,
        phone: None,
        is_active: Some(true),
    }
}

pub fn product(id: i64, name: &str, price: Decimal, items_per_pack: Option<u32>) -> Product {
    Product {
        id,
        name: name.to_string(),
        unit: Some("pcs".to_string()),
        buy_price: None,
        sell_price: Some(price),
        quantity: Some(Decimal::from(100)),
        min_stock_level: Some(5),
        items_per_pack,
    }
}

pub fn client(id: i64, name: &str) -> Client {
    Client {
        id,
        full_name: name.to_string(),
        phone: None,
        total_debt: None,
    }
}

pub fn sale(id: i64) -> Sale {
    Sale {
        id,
        items: Vec::new(),
        client: None,
        client_id: None,
        total_amount: None,
        paid_amount: None,
        created_at: None,
    }
}

/// Let spawned tasks run; with a paused clock this advances 1 ms
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[derive(Default)]
pub struct FakeBackendState {
    pub token: Mutex<Option<String>>,
    pub user: Mutex<Option<User>>,
    pub sale_results: Mutex<VecDeque<Result<Sale>>>,
    pub sale_requests: Mutex<Vec<SaleRequest>>,
    pub sale_delay: Mutex<Option<Duration>>,
    pub history: Mutex<HashMap<Option<UserId>, Vec<Value>>>,
    pub history_delay: Mutex<HashMap<Option<UserId>, Duration>>,
    pub history_calls: AtomicUsize,
    pub uploads: Mutex<Vec<(String, usize)>>,
}

/// In-memory backend; clones share state so tests can inspect calls
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<FakeBackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend accepting logins for `user`
    pub fn with_user(user: User) -> Self {
        let backend = Self::new();
        *backend.state.token.lock().unwrap() = Some(TEST_TOKEN.to_string());
        *backend.state.user.lock().unwrap() = Some(user);
        backend
    }

    pub fn push_sale_result(&self, result: Result<Sale>) {
        self.state.sale_results.lock().unwrap().push_back(result);
    }

    pub fn set_sale_delay(&self, delay: Duration) {
        *self.state.sale_delay.lock().unwrap() = Some(delay);
    }

    pub fn sale_requests(&self) -> Vec<SaleRequest> {
        self.state.sale_requests.lock().unwrap().clone()
    }

    pub fn set_history(&self, recipient: Option<UserId>, messages: Vec<Value>) {
        self.state.history.lock().unwrap().insert(recipient, messages);
    }

    pub fn set_history_delay(&self, recipient: Option<UserId>, delay: Duration) {
        self.state.history_delay.lock().unwrap().insert(recipient, delay);
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.state.uploads.lock().unwrap().clone()
    }
}

impl Backend for FakeBackend {
    async fn login(&self, _username: &str, password: &str) -> Result<String> {
        let token = self.state.token.lock().unwrap().clone();
        match token {
            Some(token) if password != "wrong" => Ok(token),
            _ => Err(Error::Remote {
                status: 401,
                detail: Some("Incorrect username or password".to_string()),
            }),
        }
    }

    async fn current_user(&self) -> Result<User> {
        let user = self.state.user.lock().unwrap().clone();
        user.ok_or(Error::Remote {
            status: 500,
            detail: None,
        })
    }

    async fn create_sale(&self, order: &SaleRequest) -> Result<Sale> {
        self.state.sale_requests.lock().unwrap().push(order.clone());
        let delay = *self.state.sale_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.state.sale_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(sale(1)))
    }

    async fn chat_history(&self, recipient: Option<UserId>) -> Result<Vec<Value>> {
        self.state.history_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.state.history_delay.lock().unwrap().get(&recipient).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let history = self.state.history.lock().unwrap().get(&recipient).cloned();
        Ok(history.unwrap_or_default())
    }

    async fn upload_chat_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.state
            .uploads
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.len()));
        Ok(format!("http://files.test/uploads/{}", file_name))
    }
}

/// Server side of one fake chat socket
pub struct FakeSocket {
    /// Frames the engine sent
    pub sent: mpsc::UnboundedReceiver<String>,
    /// Push frames to the engine; dropping it closes the socket
    pub inject: mpsc::UnboundedSender<String>,
}

impl FakeSocket {
    pub fn push(&self, frame: Value) {
        self.inject.send(frame.to_string()).unwrap();
    }
}

#[derive(Default)]
pub struct FakeConnectorState {
    pub attempts: AtomicUsize,
    pub fail: Mutex<bool>,
    pub urls: Mutex<Vec<String>>,
    pub sockets: Mutex<VecDeque<FakeSocket>>,
}

/// Connector handing out in-memory sockets
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<FakeConnectorState>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        *self.state.fail.lock().unwrap() = fail;
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.urls.lock().unwrap().clone()
    }

    /// Oldest socket not yet taken by the test
    pub fn take_socket(&self) -> FakeSocket {
        self.state
            .sockets
            .lock()
            .unwrap()
            .pop_front()
            .expect("No socket was opened")
    }
}

impl Connector for FakeConnector {
    async fn open(&self, url: &str) -> Result<SocketLink> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        self.state.urls.lock().unwrap().push(url.to_string());

        if *self.state.fail.lock().unwrap() {
            return Err(Error::Transport("connection refused".to_string()));
        }

        let (link, sent, inject) = SocketLink::pair();
        self.state
            .sockets
            .lock()
            .unwrap()
            .push_back(FakeSocket { sent, inject });
        Ok(link)
    }
}

/// Session logged in as `backend`'s user
pub async fn logged_in_session(backend: &FakeBackend) -> Session {
    let store = Arc::new(LocalStore::new_in_memory().unwrap());
    let session = Session::new(store).unwrap();
    session
        .login(backend, "alice", "secret")
        .await
        .expect("Login failed");
    session
}

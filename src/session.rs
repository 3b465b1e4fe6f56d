//! Session store
//!
//! Holds the bearer token and the current user. The token is persisted
//! twice, as an expiring cookie entry and as a plain mirror, so a lost
//! cookie can still be recovered on the next start.

use crate::{
    gateway::Backend,
    models::{User, UserId},
    storage::{LocalStore, TOKEN_COOKIE_KEY, TOKEN_KEY},
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Message shown when login fails without a server detail
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// Message shown when the profile cannot be loaded
pub const FETCH_USER_FAILED: &str = "Failed to fetch user data";

/// Callback invoked after a logout (the view redirects to its login screen)
pub type LogoutHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

/// Shared session store
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
    store: Arc<LocalStore>,
    cookie_lifetime: chrono::Duration,
    logout_handler: Arc<Mutex<Option<LogoutHandler>>>,
}

impl Session {
    /// Create a session, picking up a token cookie left by a previous run
    pub fn new(store: Arc<LocalStore>) -> Result<Self> {
        let token = store.get(TOKEN_COOKIE_KEY)?;

        Ok(Self {
            state: Arc::new(RwLock::new(SessionState {
                token,
                loading: true,
                ..Default::default()
            })),
            store,
            cookie_lifetime: chrono::Duration::days(7),
            logout_handler: Arc::new(Mutex::new(None)),
        })
    }

    /// Override the token cookie lifetime (default 7 days)
    pub fn with_cookie_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.cookie_lifetime = lifetime;
        self
    }

    /// Set the logout callback
    pub async fn set_logout_handler<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut guard = self.logout_handler.lock().await;
        *guard = Some(Arc::new(handler));
    }

    /// Current bearer token
    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    /// Current user profile
    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// ID of the current user
    pub async fn current_user_id(&self) -> Option<UserId> {
        self.state.read().await.user.as_ref().map(|u| u.id)
    }

    /// Whether a login or profile fetch is running
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Last user-facing error
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Log in with username and password
    ///
    /// On success the token is persisted and the profile fetched. On
    /// failure nothing is persisted and `last_error` holds the message.
    pub async fn login<B: Backend>(&self, backend: &B, username: &str, password: &str) -> Result<User> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let token = match backend.login(username, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Login failed for {}: {}", username, e);
                let mut state = self.state.write().await;
                state.error = Some(e.detail().unwrap_or(LOGIN_FAILED).to_string());
                state.loading = false;
                return Err(e);
            }
        };

        self.store_token(&token)?;
        self.state.write().await.token = Some(token);

        self.fetch_user(backend).await?;
        self.current_user().await.ok_or(Error::NotAuthenticated)
    }

    fn store_token(&self, token: &str) -> Result<()> {
        self.store
            .set_with_expiry(TOKEN_COOKIE_KEY, token, self.cookie_lifetime)?;
        self.store.set(TOKEN_KEY, token)
    }

    /// Fetch the current user's profile; no-op without a token
    pub async fn fetch_user<B: Backend>(&self, backend: &B) -> Result<()> {
        if self.token().await.is_none() {
            self.state.write().await.loading = false;
            return Ok(());
        }

        self.state.write().await.loading = true;

        match backend.current_user().await {
            Ok(user) => {
                debug!("Session user is {}", user.username);
                let mut state = self.state.write().await;
                state.user = Some(user);
                state.loading = false;
                Ok(())
            }
            Err(Error::Unauthorized) => {
                // The gateway already logged us out.
                self.state.write().await.loading = false;
                Err(Error::Unauthorized)
            }
            Err(e) => {
                warn!("Failed to fetch current user: {}", e);
                let mut state = self.state.write().await;
                state.error = Some(FETCH_USER_FAILED.to_string());
                state.loading = false;
                Err(e)
            }
        }
    }

    /// Restore the token from the cookie, else the mirror, and load the user
    pub async fn check_auth<B: Backend>(&self, backend: &B) -> Result<()> {
        let token = match self.store.get(TOKEN_COOKIE_KEY)? {
            Some(token) => Some(token),
            None => self.store.get(TOKEN_KEY)?,
        };

        match token {
            Some(token) => {
                {
                    let mut state = self.state.write().await;
                    state.token = Some(token);
                    state.loading = true;
                }
                self.fetch_user(backend).await
            }
            None => {
                let mut state = self.state.write().await;
                state.token = None;
                state.user = None;
                state.loading = false;
                Ok(())
            }
        }
    }

    /// Clear the token and user, in memory and on disk
    pub async fn logout(&self) {
        if let Err(e) = self.store.remove(TOKEN_COOKIE_KEY) {
            warn!("Failed to remove token cookie: {}", e);
        }
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!("Failed to remove token: {}", e);
        }

        {
            let mut state = self.state.write().await;
            state.token = None;
            state.user = None;
            state.error = None;
            state.loading = false;
        }

        info!("Session logged out");

        let handler = self.logout_handler.lock().await.clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

//! POS Admin - client core for a retail point-of-sale administration app
//!
//! This library holds the state and engines a POS frontend drives:
//! the session store, the REST gateway, the shopping cart with checkout,
//! the realtime staff chat, and the receipt transcoder used to share sales
//! in the chat. All business rules (pricing, stock, debt, auth) stay on the
//! backend; this crate mirrors server state into local view state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod cart;
pub mod chat;
pub mod config;
mod decode;
pub mod gateway;
pub mod models;
pub mod receipt;
pub mod session;
pub mod storage;

#[cfg(test)]
mod tests;

/// Result type alias for POS Admin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for POS Admin operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Checkout attempted with no cart lines
    #[error("Cart is empty")]
    EmptyCart,

    /// A checkout call is already in flight for this cart
    #[error("Checkout already in progress")]
    CheckoutInProgress,

    /// Checkout rejected or failed; carries the user-facing message
    #[error("{0}")]
    Checkout(String),

    /// The backend answered 401; the session has been logged out
    #[error("Not authorized")]
    Unauthorized,

    /// The backend answered with a non-success status
    #[error("Remote error (status {status}): {}", detail.as_deref().unwrap_or("no detail"))]
    Remote {
        /// HTTP status code
        status: u16,
        /// Server-provided `detail` message, if any
        detail: Option<String>,
    },

    /// No current user is known to the session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Chat socket is not connected
    #[error("Chat is not connected")]
    NotConnected,

    /// WebSocket transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Receipt payload could not be decoded
    #[error("Invalid receipt data: {0}")]
    InvalidReceipt(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    /// Server-provided error detail, when the backend sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Remote { detail, .. } => detail.as_deref(),
            Error::Checkout(message) => Some(message),
            _ => None,
        }
    }
}

/// Initialize the POS Admin library with logging
pub fn init() {
    tracing_subscriber::fmt::init();
}

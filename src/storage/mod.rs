//! Local storage module
//!
//! Client-side persistence for the pieces of state that survive a restart:
//! - the bearer token (an expiring "cookie" entry plus a plain mirror)
//! - the cart lines and selected client
//!
//! Reference data (catalog, customers) is never persisted; it is always
//! fetched again so it cannot go stale.

pub mod local_store;

pub use local_store::LocalStore;

/// Key of the expiring token entry
pub const TOKEN_COOKIE_KEY: &str = "cookie:token";

/// Key of the non-expiring token mirror
pub const TOKEN_KEY: &str = "token";

/// Key of the persisted cart
pub const CART_KEY: &str = "pos-cart-storage";

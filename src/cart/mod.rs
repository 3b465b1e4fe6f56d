//! Shopping cart module
//!
//! - `line` - the cart state machine: lines, pack mode, prices, totals
//! - `engine` - the shared cart store with persistence and checkout

pub mod engine;
pub mod line;

pub use engine::{CartEngine, CHECKOUT_FAILED};
pub use line::{Cart, CartLine, LineUpdate};

//! Typed REST endpoint groups
//!
//! Each submodule adds the calls for one backend area to `Gateway`. These
//! are thin wrappers: the backend owns all validation and business rules.

pub mod analytics;
pub mod clients;
pub mod expenses;
pub mod inventory;
pub mod sales;
pub mod users;

//! FarmPool
//!
//! Group-buy formation and tiered pricing for a farmers marketplace.
//! This library provides the pricing tiers, invite codes, the group buy
//! lifecycle service and its Data Service abstraction with PostgreSQL and
//! in-memory implementations, plus realtime change subscriptions.

#![allow(non_snake_case)]

pub mod config;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{FarmPoolError, Result};

// Re-export main components for easy access
pub use database::{GroupBuyStore, InMemoryStore, PgGroupBuyStore};
pub use services::{GroupBuyService, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}

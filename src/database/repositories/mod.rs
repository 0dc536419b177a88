//! Database repositories module
//!
//! This module contains the PostgreSQL implementations of the data access layer

pub mod group_buy;

// Re-export repositories
pub use group_buy::PgGroupBuyStore;

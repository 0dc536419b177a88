//! Database module
//!
//! This module handles database connections, the Data Service abstraction
//! and its PostgreSQL and in-memory implementations

pub mod connection;
pub mod listener;
pub mod memory;
pub mod repositories;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check};
pub use listener::spawn_change_listener;
pub use memory::InMemoryStore;
pub use repositories::PgGroupBuyStore;
pub use store::GroupBuyStore;

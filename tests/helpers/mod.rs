//! Test helpers module
//!
//! Builders for group buy requests, service setup over the in-memory store
//! and PostgreSQL test database access.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_data;

pub use database_helper::*;
pub use test_data::*;

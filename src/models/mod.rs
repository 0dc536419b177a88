//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod group_buy;
pub mod participant;
pub mod product;
pub mod response;

// Re-export commonly used models
pub use group_buy::{
    CreateGroupBuyRequest, GroupBuy, GroupBuyDetails, GroupFilter, GroupStatus, JoinOutcome, JoinPlan,
    MarketplaceStats,
};
pub use participant::GroupParticipant;
pub use product::{CreateProductRequest, Product};
pub use response::ApiResponse;

//! Data Service abstraction
//!
//! Every persistence, aggregate and change-notification call made by the
//! group buy service goes through [`GroupBuyStore`]. The PostgreSQL and
//! in-memory stores both implement it.

use std::future::Future;

use uuid::Uuid;

use crate::models::{GroupBuy, GroupFilter, GroupParticipant, JoinOutcome, JoinPlan, Product};
use crate::services::realtime::ChangeFeed;
use crate::utils::errors::Result;

/// Stored aggregate returning the number of listed group buys
pub const AGGREGATE_ACTIVE_GROUPS: &str = "count_active_groups";
/// Stored aggregate returning the number of participant rows
pub const AGGREGATE_PARTICIPANTS: &str = "count_participants";
/// Stored aggregate returning the number of products
pub const AGGREGATE_PRODUCTS: &str = "count_products";

pub trait GroupBuyStore: Send + Sync {
    fn insert_group(&self, group: GroupBuy) -> impl Future<Output = Result<GroupBuy>> + Send;

    fn find_group(&self, id: Uuid) -> impl Future<Output = Result<Option<GroupBuy>>> + Send;

    fn find_group_by_invite_code(&self, code: &str) -> impl Future<Output = Result<Option<GroupBuy>>> + Send;

    /// Groups matching `filter`, newest first, at most `filter.limit`
    fn list_groups(&self, filter: GroupFilter) -> impl Future<Output = Result<Vec<GroupBuy>>> + Send;

    /// Groups the user participates in, most recent join first, no duplicates
    fn list_user_groups(&self, user_id: Uuid) -> impl Future<Output = Result<Vec<GroupBuy>>> + Send;

    fn insert_product(&self, product: Product) -> impl Future<Output = Result<Product>> + Send;

    fn find_product(&self, id: Uuid) -> impl Future<Output = Result<Option<Product>>> + Send;

    /// Participants of a group in join order
    fn list_participants(&self, group_id: Uuid) -> impl Future<Output = Result<Vec<GroupParticipant>>> + Send;

    /// Run a join as one atomic unit
    ///
    /// The store reads the group with other joins on it excluded, hands the
    /// snapshot to `plan`, then inserts the participant row at the planned
    /// price and writes the planned quantity, price and status. Either both
    /// writes commit or neither does. An error from `plan` aborts with no
    /// writes. A missing group yields `GroupNotFound`.
    fn join_atomically<F>(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        plan: F,
    ) -> impl Future<Output = Result<JoinOutcome>> + Send
    where
        F: FnOnce(&GroupBuy) -> Result<JoinPlan> + Send;

    /// Call a named stored aggregate returning a scalar count
    fn call_aggregate(&self, name: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Feed of committed row changes
    fn changes(&self) -> &ChangeFeed;
}

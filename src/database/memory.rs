//! In-memory Data Service
//!
//! Keeps every table behind one async mutex, which makes each operation,
//! joins included, serializable. Change events are published before the
//! lock is released, so subscribers see them in commit order. Used by tests
//! and local runs without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::store::{GroupBuyStore, AGGREGATE_ACTIVE_GROUPS, AGGREGATE_PARTICIPANTS, AGGREGATE_PRODUCTS};
use crate::models::{GroupBuy, GroupFilter, GroupParticipant, GroupStatus, JoinOutcome, JoinPlan, Product};
use crate::services::realtime::{ChangeEvent, ChangeFeed, ChangeKind, ChangeTable};
use crate::utils::errors::{FarmPoolError, Result};

#[derive(Default)]
struct MemoryState {
    groups: HashMap<Uuid, GroupBuy>,
    participants: Vec<GroupParticipant>,
    products: HashMap<Uuid, Product>,
    fail_next_write: Option<FarmPoolError>,
}

#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    feed: ChangeFeed,
}

impl InMemoryStore {
    pub fn new(feed_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            feed: ChangeFeed::new(feed_capacity),
        }
    }

    /// Make the next write fail with `error` before anything is stored
    pub async fn fail_next_write(&self, error: FarmPoolError) {
        self.state.lock().await.fail_next_write = Some(error);
    }

    /// Overwrite a stored group, bypassing lifecycle rules
    pub async fn put_group(&self, group: GroupBuy) {
        self.state.lock().await.groups.insert(group.id, group);
    }

    pub async fn participant_count(&self) -> usize {
        self.state.lock().await.participants.len()
    }

}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(256)
    }
}

fn unique_violation(constraint: &str) -> FarmPoolError {
    FarmPoolError::Backend {
        code: "23505".to_string(),
        message: format!("duplicate key value violates unique constraint \"{}\"", constraint),
    }
}

impl GroupBuyStore for InMemoryStore {
    async fn insert_group(&self, group: GroupBuy) -> Result<GroupBuy> {
        let event = ChangeEvent::new(ChangeTable::GroupBuys, ChangeKind::Insert, &group)?;

        let mut state = self.state.lock().await;
        if let Some(error) = state.fail_next_write.take() {
            return Err(error);
        }
        if state.groups.values().any(|g| g.invite_code == group.invite_code) {
            return Err(unique_violation("group_buys_invite_code_key"));
        }
        if state.groups.contains_key(&group.id) {
            return Err(unique_violation("group_buys_pkey"));
        }
        state.groups.insert(group.id, group.clone());
        // Published under the lock so events leave in commit order
        self.feed.publish(event);
        drop(state);

        debug!(group_id = %group.id, "Group buy stored in memory");
        Ok(group)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<GroupBuy>> {
        Ok(self.state.lock().await.groups.get(&id).cloned())
    }

    async fn find_group_by_invite_code(&self, code: &str) -> Result<Option<GroupBuy>> {
        let state = self.state.lock().await;
        Ok(state.groups.values().find(|g| g.invite_code == code).cloned())
    }

    async fn list_groups(&self, filter: GroupFilter) -> Result<Vec<GroupBuy>> {
        let state = self.state.lock().await;
        let mut groups: Vec<GroupBuy> = state.groups.values().filter(|g| filter.matches(g)).cloned().collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        groups.truncate(filter.limit.max(0) as usize);
        Ok(groups)
    }

    async fn list_user_groups(&self, user_id: Uuid) -> Result<Vec<GroupBuy>> {
        let state = self.state.lock().await;
        let mut joins: Vec<&GroupParticipant> = state.participants.iter().filter(|p| p.user_id == user_id).collect();
        joins.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));

        let mut seen = HashSet::new();
        Ok(joins
            .into_iter()
            .filter(|p| seen.insert(p.group_id))
            .filter_map(|p| state.groups.get(&p.group_id).cloned())
            .collect())
    }

    async fn insert_product(&self, product: Product) -> Result<Product> {
        {
            let mut state = self.state.lock().await;
            if state.products.contains_key(&product.id) {
                return Err(unique_violation("products_pkey"));
            }
            state.products.insert(product.id, product.clone());
        }
        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn list_participants(&self, group_id: Uuid) -> Result<Vec<GroupParticipant>> {
        let state = self.state.lock().await;
        let mut participants: Vec<GroupParticipant> =
            state.participants.iter().filter(|p| p.group_id == group_id).cloned().collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(participants)
    }

    async fn join_atomically<F>(&self, group_id: Uuid, user_id: Uuid, quantity: i32, plan: F) -> Result<JoinOutcome>
    where
        F: FnOnce(&GroupBuy) -> Result<JoinPlan> + Send,
    {
        let (participant, group) = {
            let mut state = self.state.lock().await;
            let current = state
                .groups
                .get(&group_id)
                .cloned()
                .ok_or(FarmPoolError::GroupNotFound { group_id })?;

            let planned = plan(&current)?;

            if let Some(error) = state.fail_next_write.take() {
                return Err(error);
            }

            let participant = GroupParticipant::new(group_id, user_id, quantity, planned.new_price);
            let mut updated = current;
            updated.current_quantity = planned.new_quantity;
            updated.unit_price = planned.new_price;
            updated.status = planned.new_status;
            updated.updated_at = Utc::now();

            let joined = ChangeEvent::new(ChangeTable::GroupParticipants, ChangeKind::Insert, &participant)?;
            let repriced = ChangeEvent::new(ChangeTable::GroupBuys, ChangeKind::Update, &updated)?;

            state.participants.push(participant.clone());
            state.groups.insert(group_id, updated.clone());
            self.feed.publish(joined);
            self.feed.publish(repriced);
            (participant, updated)
        };

        info!(group_id = %group_id, user_id = %user_id, quantity = quantity, "Join committed in memory");

        Ok(JoinOutcome {
            new_price: group.unit_price,
            current_quantity: group.current_quantity,
            status: group.status,
            participant,
        })
    }

    async fn call_aggregate(&self, name: &str) -> Result<i64> {
        let state = self.state.lock().await;
        let value = match name {
            AGGREGATE_ACTIVE_GROUPS => state
                .groups
                .values()
                .filter(|g| GroupStatus::listed().contains(&g.status))
                .count(),
            AGGREGATE_PARTICIPANTS => state.participants.len(),
            AGGREGATE_PRODUCTS => state.products.len(),
            other => {
                return Err(FarmPoolError::Backend {
                    code: "42883".to_string(),
                    message: format!("function {}() does not exist", other),
                })
            }
        };
        Ok(value as i64)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}

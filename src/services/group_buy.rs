//! Group buy lifecycle service
//!
//! This service creates group buys, accepts joins (quantity accumulation,
//! price recomputation and the `forming -> active` transition), serves
//! listings and details, and registers realtime subscriptions. Persistence is
//! delegated to the injected [`GroupBuyStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{GroupBuyConfig, PricingBase};
use crate::database::store::{GroupBuyStore, AGGREGATE_ACTIVE_GROUPS, AGGREGATE_PARTICIPANTS, AGGREGATE_PRODUCTS};
use crate::models::{
    CreateGroupBuyRequest, GroupBuy, GroupBuyDetails, GroupFilter, GroupStatus, JoinOutcome, JoinPlan,
    MarketplaceStats,
};
use crate::services::invite::{generate_invite_code, is_valid_invite_code, normalize_invite_code};
use crate::services::pricing::{compute_tier_price, next_tier, progress_percent, NextTier};
use crate::services::realtime::{ChangeEvent, ChangeFilter, ChangeTable, RowFilter, Subscription};
use crate::utils::errors::{FarmPoolError, Result};
use crate::utils::helpers::{format_price, format_time_remaining};
use crate::utils::logging::log_group_event;

/// Decide the effect of adding `quantity` units to `group`
///
/// Rejects groups that are not forming and, when `config.enforce_deadline`
/// is set, groups whose deadline is not after `now`.
pub fn plan_join(group: &GroupBuy, quantity: i32, config: &GroupBuyConfig, now: DateTime<Utc>) -> Result<JoinPlan> {
    if !group.status.accepts_joins() {
        return Err(FarmPoolError::NotJoinable {
            group_id: group.id,
            status: group.status,
        });
    }

    if config.enforce_deadline && group.is_expired_at(now) {
        return Err(FarmPoolError::GroupExpired { group_id: group.id });
    }

    let new_quantity = group
        .current_quantity
        .checked_add(quantity)
        .ok_or_else(|| FarmPoolError::Validation("Quantity is too large".to_string()))?;

    let pricing_base = match config.pricing_base {
        PricingBase::UnitPrice => group.unit_price,
        PricingBase::BasePrice => group.base_price,
    };

    let new_status = if new_quantity >= group.target_quantity {
        GroupStatus::Active
    } else {
        GroupStatus::Forming
    };

    Ok(JoinPlan {
        new_quantity,
        new_price: compute_tier_price(pricing_base, new_quantity),
        new_status,
    })
}

/// Display-ready progress of a group buy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBuySummary {
    pub group_id: Uuid,
    pub invite_code: String,
    pub status: GroupStatus,
    pub progress_percent: u8,
    pub remaining_quantity: i32,
    pub price_label: String,
    pub next_tier: Option<NextTier>,
    pub time_remaining: String,
}

impl GroupBuySummary {
    pub fn from_group(group: &GroupBuy, now: DateTime<Utc>) -> Self {
        Self {
            group_id: group.id,
            invite_code: group.invite_code.clone(),
            status: group.status,
            progress_percent: progress_percent(group.current_quantity, group.target_quantity),
            remaining_quantity: group.remaining_quantity(),
            price_label: format_price(group.unit_price),
            next_tier: next_tier(group.current_quantity),
            time_remaining: format_time_remaining(group.deadline, now),
        }
    }
}

pub struct GroupBuyService<S> {
    store: Arc<S>,
    config: GroupBuyConfig,
}

impl<S> Clone for GroupBuyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: GroupBuyStore> GroupBuyService<S> {
    /// Create a new GroupBuyService instance
    pub fn new(store: Arc<S>, config: GroupBuyConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &GroupBuyConfig {
        &self.config
    }

    /// Create a forming group buy with a fresh invite code
    pub async fn create_group(&self, request: CreateGroupBuyRequest) -> Result<GroupBuy> {
        debug!(product_id = %request.product_id, initiator_id = %request.initiator_id, "Creating group buy");

        if request.target_quantity < 2 {
            return Err(FarmPoolError::Validation("Target quantity must be at least 2".to_string()));
        }
        if !request.base_price.is_finite() || request.base_price < 0.0 {
            return Err(FarmPoolError::Validation("Base price must be a non-negative amount".to_string()));
        }

        let max_attempts = self.config.invite_code_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let group = GroupBuy::new(request.clone(), generate_invite_code());

            match self.store.insert_group(group).await {
                Ok(group) => {
                    log_group_event(group.id, "created", Some(group.initiator_id), Some(&group.invite_code));
                    return Ok(group);
                }
                Err(e) if e.is_unique_violation() && attempt < max_attempts => {
                    warn!(attempt = attempt, "Invite code collision, regenerating");
                }
                Err(e) => {
                    error!(product_id = %request.product_id, error = %e, "Failed to create group buy");
                    return Err(e);
                }
            }
        }
    }

    /// Add `quantity` units for `user_id` and reprice the group
    pub async fn join_group(&self, group_id: Uuid, user_id: Uuid, quantity: i32) -> Result<JoinOutcome> {
        debug!(group_id = %group_id, user_id = %user_id, quantity = quantity, "Joining group buy");

        if quantity <= 0 {
            return Err(FarmPoolError::Validation("Quantity must be a positive number".to_string()));
        }

        let config = self.config.clone();
        let now = Utc::now();
        let outcome = self
            .store
            .join_atomically(group_id, user_id, quantity, move |group| plan_join(group, quantity, &config, now))
            .await;

        match &outcome {
            Ok(joined) => {
                log_group_event(group_id, "joined", Some(user_id), None);
                if joined.status == GroupStatus::Active {
                    info!(group_id = %group_id, quantity = joined.current_quantity, "Group buy reached its target");
                }
            }
            Err(e) => warn!(group_id = %group_id, user_id = %user_id, error = %e, "Join rejected"),
        }

        outcome
    }

    /// Join through a shareable invite code
    pub async fn join_by_invite_code(&self, code: &str, user_id: Uuid, quantity: i32) -> Result<JoinOutcome> {
        let group = self.get_group_by_invite_code(code).await?;
        self.join_group(group.id, user_id, quantity).await
    }

    pub async fn get_group_by_invite_code(&self, code: &str) -> Result<GroupBuy> {
        let code = normalize_invite_code(code);
        if !is_valid_invite_code(&code) {
            return Err(FarmPoolError::InviteCodeNotFound { code });
        }

        let group = self.store.find_group_by_invite_code(&code).await?;
        group.ok_or(FarmPoolError::InviteCodeNotFound { code })
    }

    /// Group with its product and participants
    pub async fn get_group_details(&self, group_id: Uuid) -> Result<GroupBuyDetails> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or(FarmPoolError::GroupNotFound { group_id })?;

        let product = self.store.find_product(group.product_id).await?;
        let participants = self.store.list_participants(group_id).await?;

        Ok(GroupBuyDetails {
            group,
            product,
            participants,
        })
    }

    /// Forming and active groups, newest first
    ///
    /// A non-positive `limit` uses the configured default.
    pub async fn get_active_groups(&self, region: Option<&str>, limit: i64) -> Result<Vec<GroupBuy>> {
        let limit = if limit > 0 { limit } else { self.config.default_listing_limit };
        let filter = GroupFilter {
            statuses: GroupStatus::listed().to_vec(),
            region: region.map(str::to_string),
            limit,
        };

        self.store.list_groups(filter).await
    }

    /// Groups the user has joined, for the participant dashboard
    pub async fn get_user_groups(&self, user_id: Uuid) -> Result<Vec<GroupBuy>> {
        self.store.list_user_groups(user_id).await
    }

    pub async fn get_group_summary(&self, group_id: Uuid) -> Result<GroupBuySummary> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or(FarmPoolError::GroupNotFound { group_id })?;

        Ok(GroupBuySummary::from_group(&group, Utc::now()))
    }

    pub async fn marketplace_stats(&self) -> Result<MarketplaceStats> {
        Ok(MarketplaceStats {
            active_groups: self.store.call_aggregate(AGGREGATE_ACTIVE_GROUPS).await?,
            total_participants: self.store.call_aggregate(AGGREGATE_PARTICIPANTS).await?,
            total_products: self.store.call_aggregate(AGGREGATE_PRODUCTS).await?,
        })
    }

    /// New participants of one group
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_to_group_participants<F>(&self, group_id: Uuid, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let filter = ChangeFilter::table(ChangeTable::GroupParticipants).with_row(RowFilter::eq("group_id", group_id));
        self.store.changes().subscribe(filter, callback)
    }

    /// Updates to one group row (quantity, price, status)
    ///
    /// Events arrive in commit order.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_to_group_status<F>(&self, group_id: Uuid, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let filter = ChangeFilter::table(ChangeTable::GroupBuys).with_row(RowFilter::eq("id", group_id));
        self.store.changes().subscribe(filter, callback)
    }

    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_to_all_group_changes<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.store.changes().subscribe(ChangeFilter::table(ChangeTable::GroupBuys), callback)
    }

    /// Participant rows across every group
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_to_all_participant_changes<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.store.changes().subscribe(ChangeFilter::table(ChangeTable::GroupParticipants), callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn forming_group(current: i32, target: i32, unit_price: f64) -> GroupBuy {
        let mut group = GroupBuy::new(
            CreateGroupBuyRequest {
                product_id: Uuid::new_v4(),
                initiator_id: Uuid::new_v4(),
                target_quantity: target,
                base_price: 10.0,
                deadline: Utc::now() + Duration::days(7),
                delivery_method: "pickup".to_string(),
                region: None,
            },
            "QWERTY".to_string(),
        );
        group.current_quantity = current;
        group.unit_price = unit_price;
        group
    }

    #[test]
    fn test_plan_reaching_target_activates() {
        let plan = plan_join(&forming_group(0, 10, 10.0), 10, &GroupBuyConfig::default(), Utc::now()).unwrap();
        assert_eq!(plan, JoinPlan { new_quantity: 10, new_price: 9.0, new_status: GroupStatus::Active });
    }

    #[test]
    fn test_plan_below_target_stays_forming() {
        let plan = plan_join(&forming_group(8, 10, 9.5), 1, &GroupBuyConfig::default(), Utc::now()).unwrap();
        assert_eq!(plan.new_status, GroupStatus::Forming);
        assert_eq!(plan.new_quantity, 9);
    }

    #[test]
    fn test_plan_compounds_against_stored_price_by_default() {
        // 9.50 stored after an earlier tier; 9.50 * 0.90 = 8.55
        let plan = plan_join(&forming_group(5, 30, 9.5), 5, &GroupBuyConfig::default(), Utc::now()).unwrap();
        assert_eq!(plan.new_price, 8.55);
    }

    #[test]
    fn test_plan_uses_base_price_when_configured() {
        let config = GroupBuyConfig { pricing_base: PricingBase::BasePrice, ..GroupBuyConfig::default() };
        let plan = plan_join(&forming_group(5, 30, 9.5), 5, &config, Utc::now()).unwrap();
        assert_eq!(plan.new_price, 9.0);
    }

    #[test]
    fn test_plan_rejects_non_forming_and_expired() {
        let mut active = forming_group(10, 10, 9.0);
        active.status = GroupStatus::Active;
        assert_matches!(
            plan_join(&active, 1, &GroupBuyConfig::default(), Utc::now()),
            Err(FarmPoolError::NotJoinable { status: GroupStatus::Active, .. })
        );

        let mut expired = forming_group(0, 10, 10.0);
        expired.deadline = Utc::now() - Duration::hours(1);
        assert_matches!(
            plan_join(&expired, 1, &GroupBuyConfig::default(), Utc::now()),
            Err(FarmPoolError::GroupExpired { .. })
        );

        let lenient = GroupBuyConfig { enforce_deadline: false, ..GroupBuyConfig::default() };
        assert!(plan_join(&expired, 1, &lenient, Utc::now()).is_ok());
    }

    #[test]
    fn test_summary() {
        let group = forming_group(6, 12, 9.5);
        let summary = GroupBuySummary::from_group(&group, Utc::now());
        assert_eq!(summary.progress_percent, 50);
        assert_eq!(summary.remaining_quantity, 6);
        assert_eq!(summary.price_label, "$9.50");
        assert_eq!(summary.next_tier.map(|t| t.quantity_needed), Some(4));
        assert_eq!(summary.time_remaining, "6 days left");
    }
}

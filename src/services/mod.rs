//! Services module
//!
//! This module contains business logic services

pub mod group_buy;
pub mod invite;
pub mod pricing;
pub mod realtime;

// Re-export commonly used services
pub use group_buy::{GroupBuyService, GroupBuySummary, plan_join};
pub use invite::{generate_invite_code, is_valid_invite_code, normalize_invite_code};
pub use pricing::{compute_tier_price, next_tier, progress_percent, NextTier, PriceTier, PRICE_TIERS};
pub use realtime::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeKind, ChangeTable, RowFilter, Subscription};

use std::sync::Arc;

use tracing::info;

use crate::config::settings::Settings;
use crate::database::{self, DatabasePool, GroupBuyStore, InMemoryStore, PgGroupBuyStore};
use crate::utils::errors::Result;

/// Service factory for creating and wiring all services over one store
pub struct ServiceFactory<S> {
    pub settings: Settings,
    pub group_buy_service: GroupBuyService<S>,
}

impl<S> Clone for ServiceFactory<S> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            group_buy_service: self.group_buy_service.clone(),
        }
    }
}

impl<S: GroupBuyStore> ServiceFactory<S> {
    /// Create a new ServiceFactory over an existing store
    pub fn new(settings: Settings, store: Arc<S>) -> Self {
        let group_buy_service = GroupBuyService::new(store, settings.group_buy.clone());
        Self {
            settings,
            group_buy_service,
        }
    }

    /// Number of live realtime subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.group_buy_service.store().changes().subscriber_count()
    }
}

impl ServiceFactory<InMemoryStore> {
    /// Services backed by the in-memory store
    pub fn in_memory(settings: Settings) -> Self {
        let store = Arc::new(InMemoryStore::new(settings.realtime.buffer_size));
        Self::new(settings, store)
    }
}

impl ServiceFactory<PgGroupBuyStore> {
    /// Services backed by PostgreSQL, with the change listener running
    pub async fn postgres(settings: Settings, pool: DatabasePool) -> Result<(Self, tokio::task::JoinHandle<()>)> {
        let feed = ChangeFeed::new(settings.realtime.buffer_size);
        let listener = database::spawn_change_listener(&pool, &settings.realtime.channel, feed.clone()).await?;
        let store = Arc::new(PgGroupBuyStore::new(pool, feed));

        info!("PostgreSQL services initialized");
        Ok((Self::new(settings, store), listener))
    }
}

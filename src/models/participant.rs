//! Group participant model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GroupParticipant {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub unit_price: f64,
    pub joined_at: DateTime<Utc>,
}

impl GroupParticipant {
    pub fn new(group_id: Uuid, user_id: Uuid, quantity: i32, unit_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            quantity,
            unit_price,
            joined_at: Utc::now(),
        }
    }

    /// Amount owed at the price locked in by this join
    pub fn line_total(&self) -> f64 {
        (self.unit_price * self.quantity as f64 * 100.0).round() / 100.0
    }
}

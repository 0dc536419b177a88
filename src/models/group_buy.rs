//! Group buy model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::participant::GroupParticipant;
use super::product::Product;

/// Lifecycle state of a group buy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Forming,
    Active,
    Completed,
    Cancelled,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Forming => "forming",
            GroupStatus::Active => "active",
            GroupStatus::Completed => "completed",
            GroupStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses shown in public listings
    pub fn listed() -> [GroupStatus; 2] {
        [GroupStatus::Forming, GroupStatus::Active]
    }

    /// Only forming groups accept new participants
    pub fn accepts_joins(&self) -> bool {
        matches!(self, GroupStatus::Forming)
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forming" => Ok(GroupStatus::Forming),
            "active" => Ok(GroupStatus::Active),
            "completed" => Ok(GroupStatus::Completed),
            "cancelled" => Ok(GroupStatus::Cancelled),
            other => Err(format!("unknown group status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBuy {
    pub id: Uuid,
    pub product_id: Uuid,
    pub initiator_id: Uuid,
    pub target_quantity: i32,
    pub current_quantity: i32,
    pub base_price: f64,
    pub unit_price: f64,
    pub invite_code: String,
    pub status: GroupStatus,
    pub deadline: DateTime<Utc>,
    pub region: Option<String>,
    pub delivery_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupBuy {
    /// Build a fresh forming group from a creation request
    pub fn new(request: CreateGroupBuyRequest, invite_code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product_id: request.product_id,
            initiator_id: request.initiator_id,
            target_quantity: request.target_quantity,
            current_quantity: 0,
            base_price: request.base_price,
            unit_price: request.base_price,
            invite_code,
            status: GroupStatus::Forming,
            deadline: request.deadline,
            region: request.region,
            delivery_method: request.delivery_method,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining_quantity(&self) -> i32 {
        (self.target_quantity - self.current_quantity).max(0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }
}

impl<'r> FromRow<'r, PgRow> for GroupBuy {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<GroupStatus>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            initiator_id: row.try_get("initiator_id")?,
            target_quantity: row.try_get("target_quantity")?,
            current_quantity: row.try_get("current_quantity")?,
            base_price: row.try_get("base_price")?,
            unit_price: row.try_get("unit_price")?,
            invite_code: row.try_get("invite_code")?,
            status,
            deadline: row.try_get("deadline")?,
            region: row.try_get("region")?,
            delivery_method: row.try_get("delivery_method")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupBuyRequest {
    pub product_id: Uuid,
    pub initiator_id: Uuid,
    pub target_quantity: i32,
    pub base_price: f64,
    pub deadline: DateTime<Utc>,
    pub delivery_method: String,
    pub region: Option<String>,
}

/// Group fields rewritten by a successful join
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinPlan {
    pub new_quantity: i32,
    pub new_price: f64,
    pub new_status: GroupStatus,
}

/// What a committed join produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub new_price: f64,
    pub current_quantity: i32,
    pub status: GroupStatus,
    pub participant: GroupParticipant,
}

/// Group buy with its product and participant list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBuyDetails {
    #[serde(flatten)]
    pub group: GroupBuy,
    pub product: Option<Product>,
    pub participants: Vec<GroupParticipant>,
}

/// Listing filter for group buys
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFilter {
    pub statuses: Vec<GroupStatus>,
    pub region: Option<String>,
    pub limit: i64,
}

impl GroupFilter {
    pub fn matches(&self, group: &GroupBuy) -> bool {
        self.statuses.contains(&group.status)
            && self.region.as_ref().map_or(true, |region| group.region.as_ref() == Some(region))
    }
}

/// Counts shown on the marketplace landing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceStats {
    pub active_groups: i64,
    pub total_participants: i64,
    pub total_products: i64,
}

//! Product model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub name: String,
    pub unit: String,
    pub base_price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub farmer_id: Uuid,
    pub name: String,
    pub unit: Option<String>,
    pub base_price: f64,
}

impl Product {
    pub fn new(request: CreateProductRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            farmer_id: request.farmer_id,
            name: request.name,
            unit: request.unit.unwrap_or_else(|| "unit".to_string()),
            base_price: request.base_price,
            created_at: Utc::now(),
        }
    }
}

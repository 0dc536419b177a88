//! PostgreSQL group buy store
//!
//! Joins run in a single transaction that locks the group row with
//! `SELECT ... FOR UPDATE`, so concurrent joins on the same group serialize
//! and the participant insert commits together with the group update.

use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::store::{GroupBuyStore, AGGREGATE_ACTIVE_GROUPS, AGGREGATE_PARTICIPANTS, AGGREGATE_PRODUCTS};
use crate::models::{GroupBuy, GroupFilter, GroupParticipant, JoinOutcome, JoinPlan, Product};
use crate::services::realtime::ChangeFeed;
use crate::utils::errors::{FarmPoolError, Result};
use crate::utils::logging::log_database_operation;

macro_rules! group_columns {
    () => {
        "id, product_id, initiator_id, target_quantity, current_quantity, base_price, unit_price, \
         invite_code, status, deadline, region, delivery_method, created_at, updated_at"
    };
}

macro_rules! participant_columns {
    () => {
        "id, group_id, user_id, quantity, unit_price, joined_at"
    };
}

macro_rules! product_columns {
    () => {
        "id, farmer_id, name, unit, base_price, created_at"
    };
}

#[derive(Clone)]
pub struct PgGroupBuyStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgGroupBuyStore {
    /// `feed` receives events from the change listener, not from this store
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self { pool, feed }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl GroupBuyStore for PgGroupBuyStore {
    async fn insert_group(&self, group: GroupBuy) -> Result<GroupBuy> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, GroupBuy>(concat!(
            "INSERT INTO group_buys (",
            group_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING ",
            group_columns!()
        ))
        .bind(group.id)
        .bind(group.product_id)
        .bind(group.initiator_id)
        .bind(group.target_quantity)
        .bind(group.current_quantity)
        .bind(group.base_price)
        .bind(group.unit_price)
        .bind(&group.invite_code)
        .bind(group.status.as_str())
        .bind(group.deadline)
        .bind(&group.region)
        .bind(&group.delivery_method)
        .bind(group.created_at)
        .bind(group.updated_at)
        .fetch_one(&self.pool)
        .await;

        log_database_operation("insert", "group_buys", started.elapsed().as_millis() as u64, result.is_ok());
        Ok(result?)
    }

    async fn find_group(&self, id: Uuid) -> Result<Option<GroupBuy>> {
        let group = sqlx::query_as::<_, GroupBuy>(concat!("SELECT ", group_columns!(), " FROM group_buys WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(group)
    }

    async fn find_group_by_invite_code(&self, code: &str) -> Result<Option<GroupBuy>> {
        let group = sqlx::query_as::<_, GroupBuy>(concat!(
            "SELECT ",
            group_columns!(),
            " FROM group_buys WHERE invite_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self, filter: GroupFilter) -> Result<Vec<GroupBuy>> {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let groups = sqlx::query_as::<_, GroupBuy>(concat!(
            "SELECT ",
            group_columns!(),
            " FROM group_buys WHERE status = ANY($1) AND ($2::TEXT IS NULL OR region = $2) \
             ORDER BY created_at DESC LIMIT $3"
        ))
        .bind(statuses)
        .bind(filter.region)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn list_user_groups(&self, user_id: Uuid) -> Result<Vec<GroupBuy>> {
        let groups = sqlx::query_as::<_, GroupBuy>(
            r#"
            SELECT g.*
            FROM group_buys g
            INNER JOIN (
                SELECT group_id, MAX(joined_at) AS last_joined_at
                FROM group_participants
                WHERE user_id = $1
                GROUP BY group_id
            ) p ON p.group_id = g.id
            ORDER BY p.last_joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn insert_product(&self, product: Product) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>(concat!(
            "INSERT INTO products (",
            product_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
            product_columns!()
        ))
        .bind(product.id)
        .bind(product.farmer_id)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.base_price)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(concat!("SELECT ", product_columns!(), " FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn list_participants(&self, group_id: Uuid) -> Result<Vec<GroupParticipant>> {
        let participants = sqlx::query_as::<_, GroupParticipant>(concat!(
            "SELECT ",
            participant_columns!(),
            " FROM group_participants WHERE group_id = $1 ORDER BY joined_at ASC"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn join_atomically<F>(&self, group_id: Uuid, user_id: Uuid, quantity: i32, plan: F) -> Result<JoinOutcome>
    where
        F: FnOnce(&GroupBuy) -> Result<JoinPlan> + Send,
    {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        // Dropping `tx` on any early return rolls the transaction back.
        let current = sqlx::query_as::<_, GroupBuy>(concat!(
            "SELECT ",
            group_columns!(),
            " FROM group_buys WHERE id = $1 FOR UPDATE"
        ))
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(FarmPoolError::GroupNotFound { group_id })?;

        let planned = plan(&current)?;
        let now = Utc::now();

        let participant = sqlx::query_as::<_, GroupParticipant>(concat!(
            "INSERT INTO group_participants (",
            participant_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
            participant_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(group_id)
        .bind(user_id)
        .bind(quantity)
        .bind(planned.new_price)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let group = sqlx::query_as::<_, GroupBuy>(concat!(
            "UPDATE group_buys SET current_quantity = $2, unit_price = $3, status = $4, updated_at = $5 \
             WHERE id = $1 RETURNING ",
            group_columns!()
        ))
        .bind(group_id)
        .bind(planned.new_quantity)
        .bind(planned.new_price)
        .bind(planned.new_status.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log_database_operation("join", "group_buys", started.elapsed().as_millis() as u64, true);
        info!(group_id = %group_id, user_id = %user_id, quantity = quantity, status = %group.status, "Join committed");

        Ok(JoinOutcome {
            new_price: group.unit_price,
            current_quantity: group.current_quantity,
            status: group.status,
            participant,
        })
    }

    async fn call_aggregate(&self, name: &str) -> Result<i64> {
        // Function names cannot be bound as parameters, so only known ones are called.
        let sql = match name {
            AGGREGATE_ACTIVE_GROUPS => "SELECT count_active_groups()",
            AGGREGATE_PARTICIPANTS => "SELECT count_participants()",
            AGGREGATE_PRODUCTS => "SELECT count_products()",
            other => {
                return Err(FarmPoolError::Backend {
                    code: "42883".to_string(),
                    message: format!("function {}() does not exist", other),
                })
            }
        };

        let value: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        debug!(aggregate = name, value = value, "Aggregate fetched");
        Ok(value)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}

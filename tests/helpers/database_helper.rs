//! Test database helper utilities
//!
//! PostgreSQL tests use `TEST_DATABASE_URL` when it is set and otherwise
//! start a throwaway PostgreSQL container.

use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres as PostgresImage;

use FarmPool::database::{create_pool, run_migrations, DatabaseConfig, DatabasePool};

/// Test database handle with migrations applied
pub struct TestDatabase {
    pub pool: DatabasePool,
    pub database_url: String,
    // Stops the container when the handle is dropped
    _container: Option<ContainerAsync<PostgresImage>>,
}

impl TestDatabase {
    /// Connect to `TEST_DATABASE_URL`, or to a fresh container when unset
    pub async fn new() -> Self {
        super::init_test_env();

        let (database_url, container) = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => (url, None),
            Err(_) => {
                let container = PostgresImage::default()
                    .with_db_name("test_farmpool")
                    .with_user("test_user")
                    .with_password("test_password")
                    .start()
                    .await
                    .expect("Failed to start postgres container");
                let host = container.get_host().await.expect("Failed to get container host");
                let port = container.get_host_port_ipv4(5432).await.expect("Failed to get port");

                let url = format!("postgresql://test_user:test_password@{}:{}/test_farmpool", host, port);
                (url, Some(container))
            }
        };

        let config = DatabaseConfig {
            url: database_url.clone(),
            max_connections: 8,
            ..DatabaseConfig::default()
        };
        let pool = create_pool(&config).await.expect("Failed to connect to test database");
        run_migrations(&pool).await.expect("Failed to run migrations");

        Self {
            pool,
            database_url,
            _container: container,
        }
    }

    /// Clean all test data from the database
    pub async fn cleanup(&self) -> Result<(), sqlx::Error> {
        // Delete in reverse order of dependencies
        sqlx::query("DELETE FROM group_participants").execute(&self.pool).await?;
        sqlx::query("DELETE FROM group_buys").execute(&self.pool).await?;
        sqlx::query("DELETE FROM products").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn participant_quantity_sum(&self, group_id: uuid::Uuid) -> Result<i64, sqlx::Error> {
        let sum: Option<i64> =
            sqlx::query_scalar("SELECT SUM(quantity)::BIGINT FROM group_participants WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(sum.unwrap_or(0))
    }
}

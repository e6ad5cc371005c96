//! Postgres-backed view store.

use futures_util::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::schema::DatabaseConfig;
use crate::error::StoreError;
use crate::store::{ResourcePool, ViewCounter};

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS profile_views (
    service   TEXT   NOT NULL,
    username  TEXT   NOT NULL,
    count     BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (service, username)
)";

const INCREMENT: &str = "\
INSERT INTO profile_views (service, username, count) VALUES ($1, $2, 1)
ON CONFLICT (service, username) DO UPDATE SET count = profile_views.count + 1
RETURNING count";

/// View counter and pool handle over a shared `PgPool`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the `profile_views` table exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        tracing::info!(
            max_connections = config.max_connections,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await
            .map_err(StoreError::Connect)?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(StoreError::Query)?;

        tracing::info!("Database connection established");
        Ok(Self { pool })
    }
}

impl ViewCounter for PgStore {
    fn increment<'a>(&'a self, service: &'a str, user: &'a str)
        -> BoxFuture<'a, Result<i64, StoreError>>
    {
        Box::pin(async move {
            sqlx::query_scalar::<_, i64>(INCREMENT)
                .bind(service)
                .bind(user)
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::Query)
        })
    }
}

impl ResourcePool for PgStore {
    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.pool.close().await;
        })
    }
}

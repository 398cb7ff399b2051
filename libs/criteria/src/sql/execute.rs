//! PostgreSQL execution of rendered queries.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::FromRow;

use super::{BindValue, SelectQuery};

#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Binds every value with its native Postgres type.
macro_rules! bind_all {
    ($query:expr, $binds:expr) => {{
        let mut query = $query;
        for value in $binds.iter().cloned() {
            query = match value {
                BindValue::Int(v) => query.bind(v),
                BindValue::Long(v) => query.bind(v),
                BindValue::Float(v) => query.bind(v),
                BindValue::Decimal(v) => query.bind(v),
                BindValue::Text(v) => query.bind(v),
                BindValue::Date(v) => query.bind(v),
                BindValue::DateTime(v) => query.bind(v),
                BindValue::Bool(v) => query.bind(v),
            };
        }
        query
    }};
}

#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, ExecuteError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn fetch_all<T>(&self, query: &SelectQuery) -> Result<Vec<T>, ExecuteError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = query.sql();
        tracing::debug!(sql = %sql, binds = query.binds().len(), "Executing select");

        let rows = bind_all!(sqlx::query_as::<_, T>(&sql), query.binds())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self, query: &SelectQuery) -> Result<i64, ExecuteError> {
        let sql = query.count_sql();
        tracing::debug!(sql = %sql, binds = query.binds().len(), "Executing count");

        let total = bind_all!(sqlx::query_scalar::<_, i64>(&sql), query.binds())
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

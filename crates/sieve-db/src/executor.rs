//! Query Executor
//!
//! Runs compiled [`SqlRelation`]s against PostgreSQL. The query layer never
//! touches the database itself; this is the collaborator that does.

use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres};

use sieve_core::PageRequest;

use crate::relation::{SqlParam, SqlRelation};

/// Error type for executor operations
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// One page of rows with the total match count
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: Option<PageRequest>,
}

impl<T> PageResult<T> {
    /// Number of pages for the total, when paginated
    pub fn total_pages(&self) -> Option<u32> {
        let total = u64::try_from(self.total).unwrap_or(0);
        self.page.map(|page| page.total_pages(total))
    }
}

/// Executes relations against a pool
pub struct QueryExecutor<'a> {
    pool: &'a PgPool,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch every row of `relation`
    pub async fn fetch_all<T>(&self, relation: &SqlRelation) -> ExecutorResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let (sql, params) = relation.to_sql();
        tracing::debug!(sql = %sql, params = params.len(), "Executing relation");

        let rows = bind_all(sqlx::query_as::<_, T>(&sql), &params)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Fetch rows as JSON objects, for callers without a row type
    pub async fn fetch_json(&self, relation: &SqlRelation) -> ExecutorResult<Vec<serde_json::Value>> {
        let (inner, params) = relation.to_sql();
        let sql = format!("SELECT row_to_json(t) FROM ({}) t", inner);
        tracing::debug!(sql = %sql, params = params.len(), "Executing relation as JSON");

        let rows = bind_scalar(sqlx::query_scalar::<_, serde_json::Value>(&sql), &params)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Count rows matching `relation`, ignoring its page window
    pub async fn count(&self, relation: &SqlRelation) -> ExecutorResult<i64> {
        let (sql, params) = relation.count_sql();
        tracing::debug!(sql = %sql, "Counting relation");

        let count = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), &params)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Fetch a compiled page together with the total count
    pub async fn fetch_page<T>(&self, relation: &SqlRelation, page: Option<PageRequest>) -> ExecutorResult<PageResult<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let total = self.count(relation).await?;
        let items = self.fetch_all(relation).await?;
        Ok(PageResult { items, total, page })
    }

    /// [`fetch_page`](Self::fetch_page) with rows as JSON objects
    pub async fn fetch_json_page(
        &self,
        relation: &SqlRelation,
        page: Option<PageRequest>,
    ) -> ExecutorResult<PageResult<serde_json::Value>> {
        let total = self.count(relation).await?;
        let items = self.fetch_json(relation).await?;
        Ok(PageResult { items, total, page })
    }
}

fn bind_all<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for param in params {
        query = match param.clone() {
            SqlParam::Int(n) => query.bind(n),
            SqlParam::String(s) => query.bind(s),
            SqlParam::Float(f) => query.bind(f),
            SqlParam::Bool(b) => query.bind(b),
            SqlParam::Null => query.bind(None::<String>),
        };
    }
    query
}

fn bind_scalar<'q, T>(
    mut query: QueryScalar<'q, Postgres, T, PgArguments>,
    params: &[SqlParam],
) -> QueryScalar<'q, Postgres, T, PgArguments> {
    for param in params {
        query = match param.clone() {
            SqlParam::Int(n) => query.bind(n),
            SqlParam::String(s) => query.bind(s),
            SqlParam::Float(f) => query.bind(f),
            SqlParam::Bool(b) => query.bind(b),
            SqlParam::Null => query.bind(None::<String>),
        };
    }
    query
}

// Collection run log: one row per pipeline invocation.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, QueryBuilder};
use tracing::warn;

use econpulse_common::{CollectionRun, RunStatus};

use crate::error::Result;

#[derive(Clone)]
pub struct RunLog {
    pool: PgPool,
}

/// Partial update of a run row. Only populated fields are written.
#[derive(Debug, Clone, Default)]
pub struct RunUpdate {
    pub finished_at: Option<DateTime<Utc>>,
    pub status: Option<RunStatus>,
    pub news_collected: Option<i32>,
    pub news_analyzed: Option<i32>,
    pub error_message: Option<String>,
    pub total_tokens: Option<i32>,
    pub estimated_cost: Option<f64>,
}

impl RunUpdate {
    pub fn is_empty(&self) -> bool {
        self.finished_at.is_none()
            && self.status.is_none()
            && self.news_collected.is_none()
            && self.news_analyzed.is_none()
            && self.error_message.is_none()
            && self.total_tokens.is_none()
            && self.estimated_cost.is_none()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RunRow {
    id: i64,
    execution_date: NaiveDate,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: String,
    news_collected: Option<i32>,
    news_analyzed: Option<i32>,
    error_message: Option<String>,
    total_tokens: Option<i32>,
    estimated_cost: Option<f64>,
}

impl RunRow {
    fn into_run(self) -> CollectionRun {
        let status = RunStatus::from_str(&self.status).unwrap_or_else(|_| {
            warn!(id = self.id, raw = %self.status, "Unknown run status in row");
            RunStatus::Failed
        });
        CollectionRun {
            id: self.id,
            execution_date: self.execution_date,
            started_at: self.started_at,
            finished_at: self.finished_at,
            status,
            news_collected: self.news_collected,
            news_analyzed: self.news_analyzed,
            error_message: self.error_message,
            total_tokens: self.total_tokens,
            estimated_cost: self.estimated_cost,
        }
    }
}

impl RunLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a `running` row for this invocation and return its id.
    /// Every invocation gets its own row; there is no dedup here.
    pub async fn start(&self, execution_date: NaiveDate) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO collection_runs (execution_date, started_at, status) \
             VALUES ($1, now(), 'running') \
             RETURNING id",
        )
        .bind(execution_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Write the populated fields of `update` to the run row.
    /// An all-empty update is a no-op returning `Ok(false)`.
    pub async fn update(&self, id: i64, update: RunUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new("UPDATE collection_runs SET ");
        let mut fields = qb.separated(", ");

        if let Some(finished_at) = update.finished_at {
            fields.push("finished_at = ");
            fields.push_bind_unseparated(finished_at);
        }
        if let Some(status) = update.status {
            fields.push("status = ");
            fields.push_bind_unseparated(status.to_string());
        }
        if let Some(news_collected) = update.news_collected {
            fields.push("news_collected = ");
            fields.push_bind_unseparated(news_collected);
        }
        if let Some(news_analyzed) = update.news_analyzed {
            fields.push("news_analyzed = ");
            fields.push_bind_unseparated(news_analyzed);
        }
        if let Some(error_message) = update.error_message {
            fields.push("error_message = ");
            fields.push_bind_unseparated(error_message);
        }
        if let Some(total_tokens) = update.total_tokens {
            fields.push("total_tokens = ");
            fields.push_bind_unseparated(total_tokens);
        }
        if let Some(estimated_cost) = update.estimated_cost {
            fields.push("estimated_cost = ");
            fields.push_bind_unseparated(estimated_cost);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recent runs, newest execution date first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<CollectionRun>> {
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as::<_, RunRow>(
            "SELECT id, execution_date, started_at, finished_at, status, \
                    news_collected, news_analyzed, error_message, \
                    total_tokens, estimated_cost \
             FROM collection_runs \
             ORDER BY execution_date DESC, id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RunRow::into_run).collect())
    }
}

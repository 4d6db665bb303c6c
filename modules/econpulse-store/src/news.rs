// Postgres persistence for analyzed news records.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::warn;

use econpulse_common::{NewsRecord, Sentiment};

use crate::error::Result;

const LIST_COLUMNS: &str = "id, news_date, title, source, source_url, summary, \
     affected_sectors, sentiment, sentiment_score, NULL::text AS raw_content, \
     ai_model, token_usage, created_at, updated_at";

const DETAIL_COLUMNS: &str = "id, news_date, title, source, source_url, summary, \
     affected_sectors, sentiment, sentiment_score, raw_content, \
     ai_model, token_usage, created_at, updated_at";

#[derive(Clone)]
pub struct NewsStore {
    pool: PgPool,
}

/// Parameters for inserting a new analyzed news record.
#[derive(Debug, Clone)]
pub struct InsertNews {
    pub news_date: NaiveDate,
    pub title: String,
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub summary: String,
    pub affected_sectors: Vec<String>,
    pub sentiment: Sentiment,
    pub sentiment_score: Option<f64>,
    pub raw_content: Option<String>,
    pub ai_model: Option<String>,
    pub token_usage: Option<i32>,
}

/// Raw row shape; sectors stay serialized until conversion.
#[derive(Debug, sqlx::FromRow)]
struct NewsRow {
    id: i64,
    news_date: NaiveDate,
    title: String,
    source: Option<String>,
    source_url: Option<String>,
    summary: String,
    affected_sectors: Option<String>,
    sentiment: String,
    sentiment_score: Option<f64>,
    raw_content: Option<String>,
    ai_model: Option<String>,
    token_usage: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NewsRow {
    fn into_record(self) -> NewsRecord {
        let affected_sectors = match self.affected_sectors.as_deref() {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                warn!(id = self.id, error = %e, "Unparsable affected_sectors, returning empty");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let sentiment = Sentiment::from_str(&self.sentiment).unwrap_or_else(|_| {
            warn!(id = self.id, raw = %self.sentiment, "Unknown sentiment in row, defaulting to neutral");
            Sentiment::Neutral
        });

        NewsRecord {
            id: self.id,
            news_date: self.news_date,
            title: self.title,
            source: self.source,
            source_url: self.source_url,
            summary: self.summary,
            affected_sectors,
            sentiment,
            sentiment_score: self.sentiment_score,
            raw_content: self.raw_content,
            ai_model: self.ai_model,
            token_usage: self.token_usage,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl NewsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an analyzed record; returns its id. Sector labels are
    /// serialized as JSON text and round-trip in order on read.
    pub async fn insert(&self, news: InsertNews) -> Result<i64> {
        let sectors_json = serde_json::to_string(&news.affected_sectors)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO economic_news
                (news_date, title, source, source_url, summary, affected_sectors,
                 sentiment, sentiment_score, raw_content, ai_model, token_usage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(news.news_date)
        .bind(&news.title)
        .bind(&news.source)
        .bind(&news.source_url)
        .bind(&news.summary)
        .bind(&sectors_json)
        .bind(news.sentiment.to_string())
        .bind(news.sentiment_score)
        .bind(&news.raw_content)
        .bind(&news.ai_model)
        .bind(news.token_usage)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Non-deleted records for one date, newest first.
    pub async fn find_by_date(
        &self,
        date: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NewsRecord>> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);

        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM economic_news \
             WHERE news_date = $1 AND is_deleted = FALSE \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NewsRow::into_record).collect())
    }

    /// Single record with raw content; `None` when absent or soft-deleted.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<NewsRecord>> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {DETAIL_COLUMNS} FROM economic_news \
             WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(NewsRow::into_record))
    }

    /// Most recent non-deleted records across all dates.
    pub async fn find_latest(&self, limit: i64) -> Result<Vec<NewsRecord>> {
        let limit = limit.clamp(1, 50);

        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM economic_news \
             WHERE is_deleted = FALSE \
             ORDER BY news_date DESC, created_at DESC \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NewsRow::into_record).collect())
    }

    pub async fn count_by_date(&self, date: NaiveDate) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM economic_news \
             WHERE news_date = $1 AND is_deleted = FALSE",
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Advisory duplicate check used by the pipeline before inserting.
    /// Not atomic with the insert; see DESIGN.md.
    pub async fn exists_by_title_and_date(&self, title: &str, date: NaiveDate) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM economic_news \
             WHERE title = $1 AND news_date = $2 AND is_deleted = FALSE",
        )
        .bind(title)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Soft delete. Returns false when the id is unknown or already deleted.
    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE economic_news SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

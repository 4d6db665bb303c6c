// Trait seams for the collector's dependencies.
//
// The collector only sees these four traits, so runs are testable with the
// in-memory mocks in `testing`: no network, no database.

use async_trait::async_trait;
use chrono::NaiveDate;

use econpulse_common::{AnalysisResult, Article};
use econpulse_feeds::FeedFetcher;
use econpulse_store::{InsertNews, NewsStore, RunLog, RunUpdate, StoreError};

use crate::analyzer::NewsAnalyzer;
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// FeedSource: replaces FeedFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch every feed, concatenating articles in feed-list order.
    /// Individual feed failures contribute zero articles.
    async fn fetch_all(&self, feeds: &[String]) -> Vec<Article>;
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch_all(&self, feeds: &[String]) -> Vec<Article> {
        FeedFetcher::fetch_all(self, feeds).await
    }
}

// ---------------------------------------------------------------------------
// ArticleAnalyzer: replaces NewsAnalyzer
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ArticleAnalyzer: Send + Sync {
    async fn analyze(&self, article: &Article) -> Result<AnalysisResult, AnalysisError>;
}

#[async_trait]
impl ArticleAnalyzer for NewsAnalyzer {
    async fn analyze(&self, article: &Article) -> Result<AnalysisResult, AnalysisError> {
        NewsAnalyzer::analyze(self, article).await
    }
}

// ---------------------------------------------------------------------------
// NewsWriter: replaces NewsStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NewsWriter: Send + Sync {
    /// Advisory duplicate check against non-deleted records.
    async fn exists(&self, title: &str, date: NaiveDate) -> Result<bool, StoreError>;

    async fn insert(&self, news: InsertNews) -> Result<i64, StoreError>;
}

#[async_trait]
impl NewsWriter for NewsStore {
    async fn exists(&self, title: &str, date: NaiveDate) -> Result<bool, StoreError> {
        self.exists_by_title_and_date(title, date).await
    }

    async fn insert(&self, news: InsertNews) -> Result<i64, StoreError> {
        NewsStore::insert(self, news).await
    }
}

// ---------------------------------------------------------------------------
// RunRecorder: replaces RunLog
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RunRecorder: Send + Sync {
    async fn start(&self, date: NaiveDate) -> Result<i64, StoreError>;

    async fn update(&self, id: i64, update: RunUpdate) -> Result<bool, StoreError>;
}

#[async_trait]
impl RunRecorder for RunLog {
    async fn start(&self, date: NaiveDate) -> Result<i64, StoreError> {
        RunLog::start(self, date).await
    }

    async fn update(&self, id: i64, update: RunUpdate) -> Result<bool, StoreError> {
        RunLog::update(self, id, update).await
    }
}

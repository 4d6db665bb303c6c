// In-memory mocks for the collector's four trait boundaries, plus article
// builders. Deterministic: no network, no database.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use econpulse_common::{AnalysisResult, Article, Sentiment};
use econpulse_store::{InsertNews, RunUpdate, StoreError};

use crate::error::AnalysisError;
use crate::traits::{ArticleAnalyzer, FeedSource, NewsWriter, RunRecorder};

pub fn article(title: &str, body: &str) -> Article {
    Article {
        title: title.to_string(),
        body: body.to_string(),
        source: "Test Wire".to_string(),
        published_at: Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap(),
        url: format!("https://example.com/{}", title.replace(' ', "-").to_lowercase()),
    }
}

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolClosed)
}

// ---------------------------------------------------------------------------
// StaticFeedSource
// ---------------------------------------------------------------------------

/// Returns a fixed article list for any feed set.
pub struct StaticFeedSource {
    articles: Vec<Article>,
}

impl StaticFeedSource {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch_all(&self, _feeds: &[String]) -> Vec<Article> {
        self.articles.clone()
    }
}

// ---------------------------------------------------------------------------
// MockAnalyzer
// ---------------------------------------------------------------------------

/// Succeeds with a canned result for every title not registered as failing.
pub struct MockAnalyzer {
    failures: HashSet<String>,
    tokens_per_article: u32,
    calls: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            failures: HashSet::new(),
            tokens_per_article: 100,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failures.insert(title.to_string());
        self
    }

    pub fn with_tokens_per_article(mut self, tokens: u32) -> Self {
        self.tokens_per_article = tokens;
        self
    }

    /// Titles analyzed, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleAnalyzer for MockAnalyzer {
    async fn analyze(&self, article: &Article) -> Result<AnalysisResult, AnalysisError> {
        self.calls.lock().unwrap().push(article.title.clone());

        if self.failures.contains(&article.title) {
            return Err(AnalysisError::RetriesExhausted {
                attempts: 3,
                last_error: "mock analysis failure".to_string(),
            });
        }

        Ok(AnalysisResult {
            summary: format!("Summary of {}", article.title),
            affected_sectors: vec!["Finance".to_string()],
            sentiment: Sentiment::Neutral,
            sentiment_score: 0.1,
            token_usage: self.tokens_per_article,
        })
    }
}

// ---------------------------------------------------------------------------
// MockNewsWriter
// ---------------------------------------------------------------------------

/// Stateful in-memory news table: the exists-check sees both preloaded
/// records and records inserted during the run.
pub struct MockNewsWriter {
    existing: Mutex<HashSet<(String, NaiveDate)>>,
    inserted: Mutex<Vec<InsertNews>>,
    fail_inserts: AtomicBool,
}

impl MockNewsWriter {
    pub fn new() -> Self {
        Self {
            existing: Mutex::new(HashSet::new()),
            inserted: Mutex::new(Vec::new()),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn with_existing(self, title: &str, date: NaiveDate) -> Self {
        self.existing
            .lock()
            .unwrap()
            .insert((title.to_string(), date));
        self
    }

    pub fn failing_inserts(self) -> Self {
        self.fail_inserts.store(true, Ordering::Relaxed);
        self
    }

    pub fn inserted(&self) -> Vec<InsertNews> {
        self.inserted.lock().unwrap().clone()
    }
}

impl Default for MockNewsWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsWriter for MockNewsWriter {
    async fn exists(&self, title: &str, date: NaiveDate) -> Result<bool, StoreError> {
        if self
            .existing
            .lock()
            .unwrap()
            .contains(&(title.to_string(), date))
        {
            return Ok(true);
        }
        Ok(self
            .inserted
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.title == title && n.news_date == date))
    }

    async fn insert(&self, news: InsertNews) -> Result<i64, StoreError> {
        if self.fail_inserts.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(news);
        Ok(inserted.len() as i64)
    }
}

// ---------------------------------------------------------------------------
// MockRunRecorder
// ---------------------------------------------------------------------------

pub struct MockRunRecorder {
    started: Mutex<Vec<NaiveDate>>,
    updates: Mutex<Vec<(i64, RunUpdate)>>,
    fail_updates: AtomicBool,
}

impl MockRunRecorder {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn failing_updates(self) -> Self {
        self.fail_updates.store(true, Ordering::Relaxed);
        self
    }

    pub fn started(&self) -> Vec<NaiveDate> {
        self.started.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(i64, RunUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    /// The final update applied to a run, if any.
    pub fn last_update(&self) -> Option<RunUpdate> {
        self.updates.lock().unwrap().last().map(|(_, u)| u.clone())
    }
}

impl Default for MockRunRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunRecorder for MockRunRecorder {
    async fn start(&self, date: NaiveDate) -> Result<i64, StoreError> {
        let mut started = self.started.lock().unwrap();
        started.push(date);
        Ok(started.len() as i64)
    }

    async fn update(&self, id: i64, update: RunUpdate) -> Result<bool, StoreError> {
        if self.fail_updates.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        self.updates.lock().unwrap().push((id, update));
        Ok(true)
    }
}

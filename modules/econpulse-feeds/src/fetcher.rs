// RSS/Atom source fetching. Each feed is fetched independently; a failing
// feed contributes zero articles and never aborts the overall pass.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use econpulse_common::Article;

const FEED_TIMEOUT_SECS: u64 = 30;

pub struct FeedFetcher {
    client: reqwest::Client,
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .build()
            .expect("Failed to build feed HTTP client");
        Self { client }
    }

    /// Fetch every feed in list order and concatenate their articles.
    /// Failures (network, timeout, parse, non-success status) are logged
    /// per feed and skipped.
    pub async fn fetch_all(&self, feeds: &[String]) -> Vec<Article> {
        let mut articles = Vec::new();
        for feed_url in feeds {
            match self.fetch_feed(feed_url).await {
                Ok(mut items) => {
                    info!(feed = %feed_url, count = items.len(), "Fetched feed");
                    articles.append(&mut items);
                }
                Err(e) => {
                    warn!(feed = %feed_url, error = %e, "Failed to fetch feed");
                }
            }
        }
        info!(articles = articles.len(), "Collected articles from feeds");
        articles
    }

    /// Fetch and parse one RSS/Atom feed.
    pub async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Article>> {
        let resp = self
            .client
            .get(feed_url)
            .header("User-Agent", "econpulse/0.1")
            .send()
            .await
            .context("feed fetch failed")?
            .error_for_status()
            .context("feed returned non-success status")?;

        let bytes = resp.bytes().await.context("failed to read feed body")?;
        parse_feed(&bytes)
    }
}

/// Parse feed bytes into articles. Entries without a title or link are
/// dropped; an empty body is kept (the relevance filter decides its fate).
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Article>> {
    let feed = feed_rs::parser::parse(bytes).context("failed to parse RSS/Atom feed")?;

    let source = feed
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "RSS Feed".to_string());

    let articles = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content)?;
            if title.trim().is_empty() {
                return None;
            }

            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let body = entry
                .summary
                .map(|t| t.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            Some(Article {
                title,
                body,
                source: source.clone(),
                published_at,
                url,
            })
        })
        .collect();

    Ok(articles)
}

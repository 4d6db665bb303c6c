// Pipeline orchestrator. One invocation = one collection run tied 1:1 to a
// collection_runs row: fetch, filter, dedupe, analyze each survivor in
// order, persist, finalize.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use econpulse_common::RunStatus;
use econpulse_feeds::{dedupe_by_title, filter_economic};
use econpulse_store::{InsertNews, RunUpdate};

use crate::analyzer::estimate_cost;
use crate::error::PipelineError;
use crate::traits::{ArticleAnalyzer, FeedSource, NewsWriter, RunRecorder};

/// Pause between consecutive article analyses.
const ARTICLE_PAUSE_MS: u64 = 2000;

pub struct Collector {
    feeds: Vec<String>,
    source: Arc<dyn FeedSource>,
    analyzer: Arc<dyn ArticleAnalyzer>,
    news: Arc<dyn NewsWriter>,
    runs: Arc<dyn RunRecorder>,
    model_name: Option<String>,
    article_pause: Duration,
}

/// Outcome of one finished run, surfaced to the manual trigger.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub run_id: i64,
    pub execution_date: NaiveDate,
    pub status: RunStatus,
    pub collected: u32,
    pub analyzed: u32,
    pub total_tokens: u32,
    pub estimated_cost: f64,
}

enum ArticleOutcome {
    Skipped,
    Analyzed { tokens: u32 },
}

impl Collector {
    pub fn new(
        feeds: Vec<String>,
        source: Arc<dyn FeedSource>,
        analyzer: Arc<dyn ArticleAnalyzer>,
        news: Arc<dyn NewsWriter>,
        runs: Arc<dyn RunRecorder>,
    ) -> Self {
        Self {
            feeds,
            source,
            analyzer,
            news,
            runs,
            model_name: None,
            article_pause: Duration::from_millis(ARTICLE_PAUSE_MS),
        }
    }

    /// Record this model name on persisted records.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    pub fn with_article_pause(mut self, pause: Duration) -> Self {
        self.article_pause = pause;
        self
    }

    /// Run the pipeline for `target` (default: yesterday). The run row is
    /// finalized exactly once (`success`, `partial`, or `failed`) and
    /// failures outside the per-article loop re-raise after finalization.
    pub async fn run(&self, target: Option<NaiveDate>) -> Result<RunSummary, PipelineError> {
        let execution_date =
            target.unwrap_or_else(|| (Utc::now() - chrono::Duration::days(1)).date_naive());
        info!(date = %execution_date, "Starting collection run");

        let run_id = self.runs.start(execution_date).await?;

        match self.collect_and_analyze(run_id, execution_date).await {
            Ok(summary) => {
                info!(
                    run_id,
                    status = %summary.status,
                    collected = summary.collected,
                    analyzed = summary.analyzed,
                    tokens = summary.total_tokens,
                    cost = summary.estimated_cost,
                    "Collection run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(run_id, error = %e, "Collection run failed");
                let finalize = self
                    .runs
                    .update(
                        run_id,
                        RunUpdate {
                            finished_at: Some(Utc::now()),
                            status: Some(RunStatus::Failed),
                            error_message: Some(e.to_string()),
                            ..Default::default()
                        },
                    )
                    .await;
                if let Err(finalize_err) = finalize {
                    warn!(run_id, error = %finalize_err, "Failed to finalize failed run");
                }
                Err(e)
            }
        }
    }

    async fn collect_and_analyze(
        &self,
        run_id: i64,
        execution_date: NaiveDate,
    ) -> Result<RunSummary, PipelineError> {
        let raw = self.source.fetch_all(&self.feeds).await;

        if raw.is_empty() {
            // A quiet day, not a failure.
            info!("No articles fetched");
            self.runs
                .update(
                    run_id,
                    RunUpdate {
                        finished_at: Some(Utc::now()),
                        status: Some(RunStatus::Success),
                        news_collected: Some(0),
                        news_analyzed: Some(0),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(RunSummary {
                run_id,
                execution_date,
                status: RunStatus::Success,
                collected: 0,
                analyzed: 0,
                total_tokens: 0,
                estimated_cost: 0.0,
            });
        }

        let articles = dedupe_by_title(filter_economic(raw));
        let collected = articles.len() as u32;
        info!(collected, "Articles to analyze");

        let mut analyzed = 0u32;
        let mut total_tokens = 0u32;

        for (index, article) in articles.iter().enumerate() {
            match self.process_article(article, execution_date).await {
                Ok(ArticleOutcome::Skipped) => {
                    info!(title = %article.title, "Skipping already-recorded article");
                }
                Ok(ArticleOutcome::Analyzed { tokens }) => {
                    analyzed += 1;
                    total_tokens += tokens;
                    info!(analyzed, collected, title = %article.title, "Article analyzed");
                }
                Err(e) => {
                    warn!(title = %article.title, error = %e, "Failed to analyze article");
                }
            }

            if index + 1 < articles.len() && !self.article_pause.is_zero() {
                tokio::time::sleep(self.article_pause).await;
            }
        }

        let estimated_cost = estimate_cost(total_tokens as u64);
        let status = if analyzed == collected {
            RunStatus::Success
        } else {
            RunStatus::Partial
        };

        self.runs
            .update(
                run_id,
                RunUpdate {
                    finished_at: Some(Utc::now()),
                    status: Some(status),
                    news_collected: Some(collected as i32),
                    news_analyzed: Some(analyzed as i32),
                    total_tokens: Some(total_tokens as i32),
                    estimated_cost: Some(estimated_cost),
                    ..Default::default()
                },
            )
            .await?;

        Ok(RunSummary {
            run_id,
            execution_date,
            status,
            collected,
            analyzed,
            total_tokens,
            estimated_cost,
        })
    }

    /// One article: advisory duplicate check, analysis, persistence.
    /// Errors here are contained by the caller's loop.
    async fn process_article(
        &self,
        article: &econpulse_common::Article,
        execution_date: NaiveDate,
    ) -> Result<ArticleOutcome, PipelineError> {
        if self.news.exists(&article.title, execution_date).await? {
            return Ok(ArticleOutcome::Skipped);
        }

        let analysis = self.analyzer.analyze(article).await?;
        let tokens = analysis.token_usage;

        self.news
            .insert(InsertNews {
                news_date: execution_date,
                title: article.title.clone(),
                source: (!article.source.is_empty()).then(|| article.source.clone()),
                source_url: Some(article.url.clone()),
                summary: analysis.summary,
                affected_sectors: analysis.affected_sectors,
                sentiment: analysis.sentiment,
                sentiment_score: Some(analysis.sentiment_score),
                raw_content: Some(article.body.clone()),
                ai_model: self.model_name.clone(),
                token_usage: Some(tokens as i32),
            })
            .await?;

        Ok(ArticleOutcome::Analyzed { tokens })
    }
}

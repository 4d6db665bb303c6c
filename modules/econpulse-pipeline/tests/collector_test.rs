//! Scenario tests for the collection pipeline, run entirely against the
//! in-memory mocks.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use econpulse_common::RunStatus;
use econpulse_pipeline::testing::{
    article, MockAnalyzer, MockNewsWriter, MockRunRecorder, StaticFeedSource,
};
use econpulse_pipeline::Collector;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
}

fn collector(
    source: StaticFeedSource,
    analyzer: Arc<MockAnalyzer>,
    news: Arc<MockNewsWriter>,
    runs: Arc<MockRunRecorder>,
) -> Collector {
    Collector::new(
        vec!["https://example.com/feed.rss".to_string()],
        Arc::new(source),
        analyzer,
        news,
        runs,
    )
    .with_model_name("gpt-4-turbo-preview")
    .with_article_pause(Duration::ZERO)
}

#[tokio::test]
async fn zero_fetched_articles_is_a_successful_quiet_day() {
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::empty(),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.collected, 0);
    assert_eq!(summary.analyzed, 0);
    assert!(analyzer.calls().is_empty());
    assert!(news.inserted().is_empty());

    let finalize = runs.last_update().unwrap();
    assert_eq!(finalize.status, Some(RunStatus::Success));
    assert_eq!(finalize.news_collected, Some(0));
    assert_eq!(finalize.news_analyzed, Some(0));
    assert!(finalize.finished_at.is_some());
}

#[tokio::test]
async fn full_success_persists_in_order_and_accumulates_tokens() {
    let articles = vec![
        article("Inflation eases", "CPI data shows cooling."),
        article("Oil prices jump", "Supply cuts announced."),
        article("Euro hits new high", "Currency markets react."),
    ];
    let analyzer = Arc::new(MockAnalyzer::new().with_tokens_per_article(250));
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.collected, 3);
    assert_eq!(summary.analyzed, 3);
    assert_eq!(summary.total_tokens, 750);

    let inserted = news.inserted();
    let titles: Vec<&str> = inserted.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Inflation eases", "Oil prices jump", "Euro hits new high"]
    );
    assert!(inserted
        .iter()
        .all(|n| n.ai_model.as_deref() == Some("gpt-4-turbo-preview")));
    assert!(inserted.iter().all(|n| n.news_date == date()));
}

#[tokio::test]
async fn partial_when_one_article_exhausts_retries() {
    let articles = vec![
        article("Inflation eases", "CPI data shows cooling."),
        article("Oil prices jump", "Supply cuts announced."),
        article("Euro hits new high", "Currency markets react."),
    ];
    let analyzer = Arc::new(MockAnalyzer::new().failing_on("Oil prices jump"));
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    assert_eq!(summary.status, RunStatus::Partial);
    assert_eq!(summary.collected, 3);
    assert_eq!(summary.analyzed, 2);
    assert_eq!(news.inserted().len(), 2);

    // The failing article was attempted, then the loop moved on
    assert_eq!(analyzer.calls().len(), 3);

    let finalize = runs.last_update().unwrap();
    assert_eq!(finalize.status, Some(RunStatus::Partial));
    assert_eq!(finalize.news_collected, Some(3));
    assert_eq!(finalize.news_analyzed, Some(2));
}

#[tokio::test]
async fn repeat_invocation_skips_existing_titles_and_inserts_nothing() {
    let articles = vec![
        article("Inflation eases", "CPI data shows cooling."),
        article("Oil prices jump", "Supply cuts announced."),
    ];
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(
        MockNewsWriter::new()
            .with_existing("Inflation eases", date())
            .with_existing("Oil prices jump", date()),
    );
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    assert_eq!(summary.analyzed, 0);
    assert!(news.inserted().is_empty());
    assert!(analyzer.calls().is_empty());
    // Skipped articles are not analyzed, so the run counts as partial
    assert_eq!(summary.status, RunStatus::Partial);
}

#[tokio::test]
async fn irrelevant_articles_never_reach_the_analyzer() {
    let articles = vec![
        article("Cat rescued from tree", "A heartwarming afternoon."),
        article("Local choir concert", "Songs were sung."),
    ];
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    // Everything filtered out: zero to analyze, zero analyzed, success
    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.collected, 0);
    assert!(analyzer.calls().is_empty());
    assert!(news.inserted().is_empty());
}

#[tokio::test]
async fn duplicate_titles_are_analyzed_once() {
    let articles = vec![
        article("Markets rally", "Stocks climb broadly."),
        article("Markets rally", "Stocks climb broadly, again."),
    ];
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    assert_eq!(summary.collected, 1);
    assert_eq!(summary.analyzed, 1);
    assert_eq!(analyzer.calls().len(), 1);
}

#[tokio::test]
async fn insert_failures_are_contained_per_article() {
    let articles = vec![
        article("Inflation eases", "CPI data shows cooling."),
        article("Oil prices jump", "Supply cuts announced."),
    ];
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new().failing_inserts());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    // Every insert failed, but the run itself completed as partial
    assert_eq!(summary.status, RunStatus::Partial);
    assert_eq!(summary.collected, 2);
    assert_eq!(summary.analyzed, 0);
}

#[tokio::test]
async fn finalize_failure_escapes_to_the_caller() {
    let articles = vec![article("Inflation eases", "CPI data shows cooling.")];
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new().failing_updates());

    let result = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await;

    assert!(result.is_err());
    // The run row was opened even though finalization failed
    assert_eq!(runs.started().len(), 1);
}

#[tokio::test]
async fn mixed_feed_yield_persists_at_most_what_survives_filtering() {
    // Three raw articles reach the normalizer: two relevant, one empty-body
    // item that fails the keyword test and is dropped silently.
    let articles = vec![
        article("Inflation eases", "CPI data shows cooling."),
        article("Semiconductor demand soars", "Chipmakers expand."),
        article("Village fete announced", ""),
    ];
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let summary = collector(
        StaticFeedSource::new(articles),
        analyzer.clone(),
        news.clone(),
        runs.clone(),
    )
    .run(Some(date()))
    .await
    .unwrap();

    assert_eq!(summary.collected, 2);
    assert!(news.inserted().len() <= 3);
    assert_eq!(news.inserted().len(), 2);
    assert_eq!(summary.status, RunStatus::Success);
}

#[tokio::test]
async fn each_invocation_opens_its_own_run_row() {
    let analyzer = Arc::new(MockAnalyzer::new());
    let news = Arc::new(MockNewsWriter::new());
    let runs = Arc::new(MockRunRecorder::new());

    let c = collector(StaticFeedSource::empty(), analyzer, news, runs.clone());
    c.run(Some(date())).await.unwrap();
    c.run(Some(date())).await.unwrap();

    assert_eq!(runs.started(), vec![date(), date()]);
}

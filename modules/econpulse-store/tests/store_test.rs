//! Integration tests for the news and run-log stores.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::NaiveDate;
use sqlx::PgPool;

use econpulse_common::{RunStatus, Sentiment};
use econpulse_store::{InsertNews, NewsStore, RunLog, RunUpdate};

/// Get a migrated test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    econpulse_store::migrate(&pool).await.ok()?;
    Some(pool)
}

fn insert_news(title: &str, date: NaiveDate) -> InsertNews {
    InsertNews {
        news_date: date,
        title: title.to_string(),
        source: Some("Test Wire".to_string()),
        source_url: Some("https://example.com/a".to_string()),
        summary: "Summary text.".to_string(),
        affected_sectors: vec!["Finance".to_string(), "Energy".to_string()],
        sentiment: Sentiment::Positive,
        sentiment_score: Some(0.6),
        raw_content: Some("Full body".to_string()),
        ai_model: Some("gpt-4-turbo-preview".to_string()),
        token_usage: Some(420),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn insert_then_read_round_trips_sectors_in_order() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = NewsStore::new(pool);
    let day = date(2091, 1, 10);

    let id = store
        .insert(insert_news("Sectors round trip", day))
        .await
        .unwrap();

    let record = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.title, "Sectors round trip");
    assert_eq!(record.affected_sectors, vec!["Finance", "Energy"]);
    assert_eq!(record.sentiment, Sentiment::Positive);
    assert_eq!(record.raw_content.as_deref(), Some("Full body"));
}

#[tokio::test]
async fn soft_deleted_records_vanish_from_all_reads() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = NewsStore::new(pool);
    let day = date(2091, 2, 11);

    let id = store
        .insert(insert_news("Disappearing act", day))
        .await
        .unwrap();
    assert!(store.soft_delete(id).await.unwrap());

    assert!(store.find_by_id(id).await.unwrap().is_none());
    assert_eq!(store.count_by_date(day).await.unwrap(), 0);
    assert!(store.find_by_date(day, 20, 0).await.unwrap().is_empty());
    assert!(!store
        .exists_by_title_and_date("Disappearing act", day)
        .await
        .unwrap());

    // Second delete is a no-op
    assert!(!store.soft_delete(id).await.unwrap());
}

#[tokio::test]
async fn exists_check_sees_only_matching_title_and_date() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = NewsStore::new(pool);
    let day = date(2091, 3, 12);

    store
        .insert(insert_news("Dollar strengthens", day))
        .await
        .unwrap();

    assert!(store
        .exists_by_title_and_date("Dollar strengthens", day)
        .await
        .unwrap());
    assert!(!store
        .exists_by_title_and_date("Dollar strengthens", date(2091, 3, 13))
        .await
        .unwrap());
    assert!(!store
        .exists_by_title_and_date("Dollar weakens", day)
        .await
        .unwrap());
}

#[tokio::test]
async fn run_lifecycle_start_update_list() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let log = RunLog::new(pool);
    let day = date(2091, 4, 13);

    let id = log.start(day).await.unwrap();

    let updated = log
        .update(
            id,
            RunUpdate {
                finished_at: Some(chrono::Utc::now()),
                status: Some(RunStatus::Partial),
                news_collected: Some(5),
                news_analyzed: Some(3),
                total_tokens: Some(1500),
                estimated_cost: Some(0.03),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let recent = log.list_recent(50).await.unwrap();
    let run = recent.iter().find(|r| r.id == id).unwrap();
    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(run.news_collected, Some(5));
    assert_eq!(run.news_analyzed, Some(3));
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn empty_run_update_is_a_no_op() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let log = RunLog::new(pool);

    let id = log.start(date(2091, 5, 14)).await.unwrap();
    assert!(!log.update(id, RunUpdate::default()).await.unwrap());

    // Row is untouched: still running, no finish timestamp
    let recent = log.list_recent(50).await.unwrap();
    let run = recent.iter().find(|r| r.id == id).unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.finished_at.is_none());
}

#[tokio::test]
async fn device_tokens_upsert_and_deactivate() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let devices = econpulse_store::DeviceStore::new(pool);

    let first = devices.upsert("tok-2091-a", Some("android")).await.unwrap();
    let second = devices.upsert("tok-2091-a", None).await.unwrap();
    assert_eq!(first, second);

    assert!(devices.deactivate("tok-2091-a").await.unwrap());
    assert!(!devices.deactivate("tok-2091-a").await.unwrap());
    assert!(!devices
        .list_active()
        .await
        .unwrap()
        .contains(&"tok-2091-a".to_string()));
}

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use fcm_client::FcmClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use econpulse_common::Config;
use econpulse_feeds::FeedFetcher;
use econpulse_pipeline::{Collector, NewsAnalyzer};
use econpulse_store::{DeviceStore, NewsStore, RunLog};

mod notify;
mod routes;
mod scheduler;

pub struct AppState {
    pub news: NewsStore,
    pub runs: RunLog,
    pub devices: DeviceStore,
    pub collector: Arc<Collector>,
    pub fcm: Option<Arc<FcmClient>>,
    pub started_at: Instant,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("EconPulse server starting...");

    let config = Config::from_env();

    let pool = econpulse_store::connect(&config.database_url).await?;
    econpulse_store::migrate(&pool).await?;

    let news = NewsStore::new(pool.clone());
    let runs = RunLog::new(pool.clone());
    let devices = DeviceStore::new(pool);

    let analyzer = NewsAnalyzer::from_config(&config);
    let model_name = analyzer.model().to_string();

    let collector = Arc::new(
        Collector::new(
            config.news_feeds.clone(),
            Arc::new(FeedFetcher::new()),
            Arc::new(analyzer),
            Arc::new(news.clone()),
            Arc::new(runs.clone()),
        )
        .with_model_name(model_name),
    );

    let fcm = config
        .fcm_server_key
        .as_deref()
        .map(|key| Arc::new(FcmClient::new(key)));
    if fcm.is_none() {
        info!("FCM not configured; push notifications disabled");
    }

    let state = Arc::new(AppState {
        news,
        runs,
        devices,
        collector,
        fcm,
        started_at: Instant::now(),
    });

    // The scheduler handle is owned here; shutdown requires it.
    let scheduler_handle = if config.scheduler_enabled {
        Some(scheduler::start(state.clone(), &config.scheduler_cron).await?)
    } else {
        info!("Scheduler is disabled in configuration");
        None
    };

    let app = routes::router(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.http_host, config.http_port);
    info!("EconPulse API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(mut handle) = scheduler_handle {
        handle.shutdown().await?;
        info!("Scheduler stopped");
    }
    info!("EconPulse server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

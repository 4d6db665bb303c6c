use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,

    // Collection
    pub news_feeds: Vec<String>,
    pub max_retry_attempts: u32,

    // Scheduler
    pub scheduler_enabled: bool,
    pub scheduler_cron: String,

    // Push notifications (optional)
    pub fcm_server_key: Option<String>,

    // Web server
    pub http_host: String,
    pub http_port: u16,
}

/// Economic news feeds polled when `NEWS_FEEDS` is not set.
pub const DEFAULT_NEWS_FEEDS: &[&str] = &[
    "https://feeds.bloomberg.com/markets/news.rss",
    "https://www.reuters.com/rssFeed/businessNews",
    "https://www.ft.com/?format=rss",
];

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let news_feeds = match env::var("NEWS_FEEDS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_NEWS_FEEDS.iter().map(|s| s.to_string()).collect(),
        };

        Self {
            database_url: required_env("DATABASE_URL"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4-turbo-preview".to_string()),
            openai_max_tokens: parsed_env("OPENAI_MAX_TOKENS", 1000),
            openai_temperature: parsed_env("OPENAI_TEMPERATURE", 0.3),
            news_feeds,
            max_retry_attempts: parsed_env("ANALYSIS_MAX_RETRIES", 3),
            scheduler_enabled: env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            // Six-field cron, evaluated in UTC: daily at 08:00.
            scheduler_cron: env::var("SCHEDULER_CRON")
                .unwrap_or_else(|_| "0 0 8 * * *".to_string()),
            fcm_server_key: env::var("FCM_SERVER_KEY").ok().filter(|k| !k.is_empty()),
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parsed_env("HTTP_PORT", 3000),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got '{raw}'")),
        Err(_) => default,
    }
}

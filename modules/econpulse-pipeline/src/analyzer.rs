// LLM-backed article analysis: prompt construction, lenient response
// validation, bounded retry with rate-limit-aware backoff, and batch mode.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use ai_client::util::truncate_to_char_boundary;
use ai_client::{AiError, ChatRequest, OpenAi};
use econpulse_common::{AnalysisResult, Article, Config, Sentiment};

use crate::error::AnalysisError;

/// Character budget for article body text embedded in the prompt.
const MAX_CONTENT_CHARS: usize = 3000;

/// Per-attempt wait after a rate-limit rejection: attempt x 5s.
const RATE_LIMIT_BACKOFF_MS: u64 = 5000;
/// Per-attempt wait after any other failure: attempt x 1s.
const ERROR_BACKOFF_MS: u64 = 1000;

/// Articles analyzed concurrently within one batch group.
const BATCH_SIZE: usize = 3;
/// Pause between batch groups.
const BATCH_PAUSE_MS: u64 = 2000;

const INPUT_COST_PER_1M_TOKENS: f64 = 10.0;
const OUTPUT_COST_PER_1M_TOKENS: f64 = 30.0;

const SYSTEM_PROMPT: &str = "You are an expert economic analyst who analyzes global economic news.
Your task is to:
1. Summarize the news in 2-3 sentences
2. Identify affected economic sectors
3. Predict market sentiment (positive/negative/neutral)
4. Provide a sentiment score between -1.0 (very negative) and 1.0 (very positive)

Always respond in valid JSON format.";

pub struct NewsAnalyzer {
    ai: OpenAi,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_attempts: u32,
}

/// What the model returns. Every field is lenient: validation coerces bad
/// values instead of failing the article.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    affected_sectors: Option<serde_json::Value>,
    #[serde(default)]
    market_sentiment: Option<String>,
    #[serde(default)]
    sentiment_score: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("invalid analysis payload: {0}")]
    Parse(#[from] serde_json::Error),
}

impl NewsAnalyzer {
    pub fn new(
        ai: OpenAi,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            ai,
            model: model.into(),
            max_tokens,
            temperature,
            max_attempts: 3,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OpenAi::new(&config.openai_api_key),
            &config.openai_model,
            config.openai_max_tokens,
            config.openai_temperature,
        )
        .with_max_attempts(config.max_retry_attempts)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Analyze one article, retrying up to the configured attempt budget.
    /// Rate-limit rejections wait longer between attempts than other
    /// failures. Exhaustion yields the terminal `RetriesExhausted` error
    /// carrying the last underlying failure.
    pub async fn analyze(&self, article: &Article) -> Result<AnalysisResult, AnalysisError> {
        let request = self.build_request(article);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            info!(
                attempt,
                title = truncate_to_char_boundary(&article.title, 50),
                "Analyzing article"
            );

            match self.try_analyze(&request).await {
                Ok(result) => {
                    info!(tokens = result.token_usage, "Analysis completed");
                    return Ok(result);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Analysis attempt failed");
                    let rate_limited = matches!(&e, AttemptError::Ai(ai) if ai.is_rate_limit());
                    last_error = e.to_string();

                    if attempt < self.max_attempts {
                        let delay = backoff_delay(attempt, rate_limited);
                        info!(delay_ms = delay.as_millis() as u64, "Waiting before retry");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(AnalysisError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    /// Analyze a batch in fixed-size groups. Items within a group run
    /// concurrently; groups are separated by a fixed pause. One item's
    /// exhausted retries never cancel its siblings.
    pub async fn analyze_batch(
        &self,
        articles: &[Article],
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        let mut results = Vec::with_capacity(articles.len());
        let groups: Vec<&[Article]> = articles.chunks(BATCH_SIZE).collect();
        let total_groups = groups.len();

        for (index, group) in groups.into_iter().enumerate() {
            let group_results =
                futures::future::join_all(group.iter().map(|article| self.analyze(article))).await;
            results.extend(group_results);

            if index + 1 < total_groups {
                tokio::time::sleep(Duration::from_millis(BATCH_PAUSE_MS)).await;
            }
        }

        results
    }

    async fn try_analyze(&self, request: &ChatRequest) -> Result<AnalysisResult, AttemptError> {
        let (content, token_usage) = self.ai.chat_text(request).await?;
        Ok(parse_analysis(&content, token_usage)?)
    }

    fn build_request(&self, article: &Article) -> ChatRequest {
        ChatRequest::new(&self.model)
            .system(SYSTEM_PROMPT)
            .user(build_prompt(article))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .json_response()
    }
}

/// User prompt embedding the article, body truncated to a fixed budget.
pub fn build_prompt(article: &Article) -> String {
    let content = truncate_to_char_boundary(&article.body, MAX_CONTENT_CHARS);
    let ellipsis = if content.len() < article.body.len() {
        " ..."
    } else {
        ""
    };

    format!(
        r#"Analyze the following economic news article:

Title: {title}
Source: {source}
Published: {published}

Content:
{content}{ellipsis}

Please provide your analysis in the following JSON format:
{{
  "summary": "2-3 sentence summary",
  "affected_sectors": ["Semiconductor", "Finance", "Energy"],
  "market_sentiment": "positive" or "negative" or "neutral",
  "sentiment_score": 0.75
}}

Possible sectors:
- Semiconductor
- Finance
- Energy
- Real Estate
- Automotive
- Bio/Healthcare
- IT/Software
- Retail/Consumer Goods
- Aviation/Transportation
- Telecommunications"#,
        title = article.title,
        source = if article.source.is_empty() {
            "Unknown"
        } else {
            &article.source
        },
        published = article.published_at.to_rfc3339(),
    )
}

/// Parse the model's JSON and coerce every field into range.
fn parse_analysis(content: &str, token_usage: u32) -> Result<AnalysisResult, serde_json::Error> {
    let raw: RawAnalysis = serde_json::from_str(content)?;

    Ok(AnalysisResult {
        summary: raw.summary.unwrap_or_default(),
        affected_sectors: validate_sectors(raw.affected_sectors.as_ref()),
        sentiment: validate_sentiment(raw.market_sentiment.as_deref()),
        sentiment_score: validate_score(raw.sentiment_score.as_ref()),
        token_usage,
    })
}

fn validate_sentiment(raw: Option<&str>) -> Sentiment {
    match raw.and_then(|s| s.parse().ok()) {
        Some(sentiment) => sentiment,
        None => {
            warn!(raw = raw.unwrap_or(""), "Invalid sentiment, defaulting to neutral");
            Sentiment::Neutral
        }
    }
}

/// Parse the score as a number (accepting numeric strings) and clamp it to
/// [-1.0, 1.0]. Anything unparsable becomes 0.0.
fn validate_score(raw: Option<&serde_json::Value>) -> f64 {
    let parsed = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    };

    match parsed {
        Some(score) => score.clamp(-1.0, 1.0),
        None => {
            warn!("Invalid sentiment score, defaulting to 0.0");
            0.0
        }
    }
}

fn validate_sectors(raw: Option<&serde_json::Value>) -> Vec<String> {
    match raw {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Wait before retry `attempt + 1`.
fn backoff_delay(attempt: u32, rate_limited: bool) -> Duration {
    let per_attempt = if rate_limited {
        RATE_LIMIT_BACKOFF_MS
    } else {
        ERROR_BACKOFF_MS
    };
    Duration::from_millis(attempt as u64 * per_attempt)
}

/// Approximate cost in USD for a token total, using a blended average of the
/// input and output per-million rates.
pub fn estimate_cost(total_tokens: u64) -> f64 {
    let blended_per_1m = (INPUT_COST_PER_1M_TOKENS + OUTPUT_COST_PER_1M_TOKENS) / 2.0;
    (total_tokens as f64 / 1_000_000.0) * blended_per_1m
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article_with_body(body: &str) -> Article {
        Article {
            title: "Rates on hold".to_string(),
            body: body.to_string(),
            source: "Test Wire".to_string(),
            published_at: Utc::now(),
            url: "https://example.com/rates".to_string(),
        }
    }

    #[test]
    fn backoff_schedule_matches_policy() {
        assert_eq!(backoff_delay(1, true), Duration::from_millis(5000));
        assert_eq!(backoff_delay(2, true), Duration::from_millis(10000));
        assert_eq!(backoff_delay(1, false), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3, false), Duration::from_millis(3000));
    }

    #[test]
    fn rate_limit_waits_dominate_the_success_on_third_attempt_scenario() {
        // Rate limited on attempts 1 and 2, success on 3: total wait >= 15s.
        let total = backoff_delay(1, true) + backoff_delay(2, true);
        assert!(total >= Duration::from_millis(5000 + 10000));
    }

    #[test]
    fn score_is_clamped_both_ways() {
        assert_eq!(validate_score(Some(&serde_json::json!(5.0))), 1.0);
        assert_eq!(validate_score(Some(&serde_json::json!(-3.0))), -1.0);
        assert_eq!(validate_score(Some(&serde_json::json!(0.42))), 0.42);
    }

    #[test]
    fn non_numeric_score_coerces_to_zero() {
        assert_eq!(validate_score(Some(&serde_json::json!("abc"))), 0.0);
        assert_eq!(validate_score(Some(&serde_json::json!(null))), 0.0);
        assert_eq!(validate_score(None), 0.0);
    }

    #[test]
    fn numeric_string_score_parses() {
        assert_eq!(validate_score(Some(&serde_json::json!("0.7"))), 0.7);
        assert_eq!(validate_score(Some(&serde_json::json!("-4"))), -1.0);
    }

    #[test]
    fn unknown_sentiment_coerces_to_neutral() {
        assert_eq!(validate_sentiment(Some("positive")), Sentiment::Positive);
        assert_eq!(validate_sentiment(Some("bullish")), Sentiment::Neutral);
        assert_eq!(validate_sentiment(None), Sentiment::Neutral);
    }

    #[test]
    fn parse_analysis_handles_full_payload() {
        let content = r#"{
            "summary": "Rates unchanged.",
            "affected_sectors": ["Finance", "Real Estate"],
            "market_sentiment": "negative",
            "sentiment_score": -0.4
        }"#;
        let result = parse_analysis(content, 321).unwrap();
        assert_eq!(result.summary, "Rates unchanged.");
        assert_eq!(result.affected_sectors, vec!["Finance", "Real Estate"]);
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.sentiment_score, -0.4);
        assert_eq!(result.token_usage, 321);
    }

    #[test]
    fn parse_analysis_defaults_missing_fields() {
        let result = parse_analysis("{}", 10).unwrap();
        assert_eq!(result.summary, "");
        assert!(result.affected_sectors.is_empty());
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.sentiment_score, 0.0);
    }

    #[test]
    fn parse_analysis_ignores_non_array_sectors() {
        let content = r#"{"affected_sectors": "Finance"}"#;
        let result = parse_analysis(content, 0).unwrap();
        assert!(result.affected_sectors.is_empty());
    }

    #[test]
    fn parse_analysis_rejects_non_json() {
        assert!(parse_analysis("the markets are fine", 0).is_err());
    }

    #[test]
    fn prompt_truncates_long_bodies() {
        let long_body = "inflation ".repeat(1000);
        let prompt = build_prompt(&article_with_body(&long_body));
        assert!(prompt.contains(" ..."));
        // Title and format instructions survive truncation
        assert!(prompt.contains("Rates on hold"));
        assert!(prompt.contains("market_sentiment"));
    }

    #[test]
    fn prompt_keeps_short_bodies_whole() {
        let prompt = build_prompt(&article_with_body("Short body."));
        assert!(prompt.contains("Short body."));
        assert!(!prompt.contains("Short body. ..."));
    }

    #[test]
    fn cost_uses_blended_rate() {
        assert_eq!(estimate_cost(1_000_000), 20.0);
        assert_eq!(estimate_cost(0), 0.0);
        assert!((estimate_cost(150_000) - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn batch_returns_one_result_per_article_without_cancelling_siblings() {
        let analyzer = NewsAnalyzer::new(
            OpenAi::new("sk-test").with_base_url("http://127.0.0.1:9/v1"),
            "gpt-4-turbo-preview",
            64,
            0.0,
        )
        .with_max_attempts(1);

        let articles = vec![
            article_with_body("body one"),
            article_with_body("body two"),
        ];
        let results = analyzer.analyze_batch(&articles).await;

        // Every item fails independently; the batch still yields a slot each.
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));
    }

    #[tokio::test]
    async fn retries_exhausted_carries_last_error() {
        // Unroutable local endpoint: every attempt fails fast with a
        // connection error, exercising the real retry loop.
        let analyzer = NewsAnalyzer::new(
            OpenAi::new("sk-test").with_base_url("http://127.0.0.1:9/v1"),
            "gpt-4-turbo-preview",
            64,
            0.0,
        )
        .with_max_attempts(2);

        let err = analyzer
            .analyze(&article_with_body("body"))
            .await
            .unwrap_err();
        let AnalysisError::RetriesExhausted { attempts, last_error } = err;
        assert_eq!(attempts, 2);
        assert!(!last_error.is_empty());
    }
}

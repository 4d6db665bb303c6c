use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- Articles ---

/// A raw article pulled from a feed. Lives only for the duration of a
/// collection run; never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub body: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

// --- Sentiment ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(()),
        }
    }
}

/// What the analysis service produced for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    /// Sector labels in the order the model returned them.
    pub affected_sectors: Vec<String>,
    pub sentiment: Sentiment,
    /// Always within [-1.0, 1.0].
    pub sentiment_score: f64,
    pub token_usage: u32,
}

// --- Persistent records ---

/// One analyzed news item as stored in `economic_news`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: i64,
    pub news_date: NaiveDate,
    pub title: String,
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub summary: String,
    pub affected_sectors: Vec<String>,
    pub sentiment: Sentiment,
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    pub ai_model: Option<String>,
    pub token_usage: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
    Partial,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Partial => write!(f, "partial"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            "partial" => Ok(RunStatus::Partial),
            _ => Err(()),
        }
    }
}

/// One row of the collection run log. Created in `Running` state when a
/// pipeline invocation starts; transitions exactly once to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRun {
    pub id: i64,
    pub execution_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub news_collected: Option<i32>,
    pub news_analyzed: Option<i32>,
    pub error_message: Option<String>,
    pub total_tokens: Option<i32>,
    pub estimated_cost: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sentiment_round_trips_through_str() {
        for s in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral] {
            assert_eq!(Sentiment::from_str(&s.to_string()), Ok(s));
        }
    }

    #[test]
    fn sentiment_rejects_unknown() {
        assert!(Sentiment::from_str("bullish").is_err());
        assert!(Sentiment::from_str("").is_err());
    }

    #[test]
    fn run_status_round_trips_through_str() {
        for s in [
            RunStatus::Running,
            RunStatus::Success,
            RunStatus::Failed,
            RunStatus::Partial,
        ] {
            assert_eq!(RunStatus::from_str(&s.to_string()), Ok(s));
        }
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"positive\""
        );
    }
}

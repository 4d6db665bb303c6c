pub mod analyzer;
pub mod collector;
pub mod error;
pub mod testing;
pub mod traits;

pub use analyzer::{estimate_cost, NewsAnalyzer};
pub use collector::{Collector, RunSummary};
pub use error::{AnalysisError, PipelineError};
pub use traits::{ArticleAnalyzer, FeedSource, NewsWriter, RunRecorder};

use thiserror::Error;

use econpulse_store::StoreError;

/// A single article's analysis failed for good. The caller treats this as a
/// per-article failure, never as a pipeline-fatal one.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Errors surfaced by a collection run. Per-feed and per-article failures
/// are contained where they occur; only failures outside those loops reach
/// the caller through this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

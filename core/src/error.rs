// Error types for each boundary of the pipeline.
// Nothing here ever reaches the segmenter or the decode engine: callers turn
// these into a fallback path (threshold-only classifier, default config).
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {} is corrupted: {source}", path.display())]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid model JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    Shape(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("expected {expected} features, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    #[error("inference took {elapsed_ms}ms, budget is {budget_ms}ms")]
    OverBudget { elapsed_ms: u128, budget_ms: u128 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainingError {
    #[error("insufficient data: {dots} dots and {dashes} dashes, need {required} of each")]
    InsufficientData {
        dots: usize,
        dashes: usize,
        required: usize,
    },
}

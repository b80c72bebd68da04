//! Error types for the equity aggregator

use thiserror::Error;

/// Result type alias for aggregator operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {

    // =============================
    // Pipeline-fatal Errors
    // =============================

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("All sources failed for {symbol} ({attempted} attempted)")]
    AllSourcesFailed { symbol: String, attempted: usize },

    // =============================
    // Recovered Errors
    // =============================

    #[error("Source unavailable ({source_id}): {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("Enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn source_unavailable(source_id: impl ToString, reason: impl ToString) -> Self {
        AnalysisError::SourceUnavailable {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

//! Equity Aggregator
//!
//! Builds a single analyst-style report for an NSE-listed equity by:
//! - Fetching quote and fundamentals from several independent sources at once
//! - Tolerating any subset of source failures (only zero successes is fatal)
//! - Reconciling overlapping fields by per-field source priority, with provenance
//! - Classifying valuation and risk tiers from the reconciled figures
//! - Rendering a deterministic summary, optionally enriched by Gemini
//!
//! PIPELINE:
//! SYMBOL → FETCH (fan-out) → RECONCILE → CLASSIFY → RENDER

pub mod analyzer;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractors;
pub mod gemini;
pub mod http;
pub mod markup;
pub mod models;
pub mod orchestrator;
pub mod reconciliation;
pub mod report;

#[cfg(test)]
mod testing;

pub use error::{AnalysisError, Result};

// Re-export common types
pub use analyzer::StockAnalyzer;
pub use config::AppConfig;
pub use models::*;

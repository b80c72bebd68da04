//! Source extractors
//!
//! One extractor per external source. Each turns its source's native
//! representation into a `PartialRecord` and never fails on a missing or
//! malformed field; only transport errors, non-success responses and
//! unusable payloads become `SourceUnavailable`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::http::HttpFetcher;
use crate::models::{PartialRecord, SourceId, Symbol};
use crate::Result;

pub mod nse;
pub mod screener;
pub mod yahoo;

pub use nse::NseExtractor;
pub use screener::ScreenerExtractor;
pub use yahoo::YahooExtractor;

pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Trait for a single source
#[async_trait]
pub trait Extractor: Send + Sync {
    fn source(&self) -> SourceId;

    async fn extract(&self, symbol: &Symbol) -> Result<PartialRecord>;
}

/// The production source set, in fan-out order
pub fn create_default_extractors(
    config: &AppConfig,
    http: Arc<dyn HttpFetcher>,
) -> Vec<Arc<dyn Extractor>> {
    vec![
        Arc::new(YahooExtractor::new(http.clone(), &config.yahoo_base_url)),
        Arc::new(NseExtractor::new(http.clone(), &config.nse_base_url)),
        Arc::new(ScreenerExtractor::new(http, &config.screener_base_url)),
    ]
}

/// GET a body, mapping transport errors and non-2xx statuses to `SourceUnavailable`
pub(crate) async fn fetch_body(
    http: &dyn HttpFetcher,
    source: SourceId,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String> {
    let response = http
        .get(url, headers)
        .await
        .map_err(|e| AnalysisError::source_unavailable(source, e))?;

    if !response.is_success() {
        return Err(AnalysisError::source_unavailable(
            source,
            format!("HTTP {} from {}", response.status, url),
        ));
    }

    Ok(response.body)
}

//
// ================= Numeric Coercion =================
//

/// Parse display text such as `"1,28,400.50"`, `"12.5%"` or `"₹ 2,850"`.
/// Dashes, blanks and non-finite values are absent.
pub(crate) fn parse_number_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '%' | '₹' | ' '))
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accept a JSON number or a numeric string
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number_text(s),
        _ => None,
    }
}

pub(crate) fn coerce_count(value: &Value) -> Option<u64> {
    coerce_number(value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u64)
}

pub(crate) fn non_empty_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn percent_change(price: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((price - previous) / previous * 100.0).filter(|v| v.is_finite())
}

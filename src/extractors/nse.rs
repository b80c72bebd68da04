//! NSE India quote API (regulated exchange)

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{coerce_number, fetch_body, non_empty_text, Extractor, BROWSER_USER_AGENT};
use crate::error::AnalysisError;
use crate::http::HttpFetcher;
use crate::models::{PartialRecord, SourceId, Symbol};
use crate::Result;

/// Rupees per crore
const RUPEES_PER_CRORE: f64 = 10_000_000.0;

pub struct NseExtractor {
    http: Arc<dyn HttpFetcher>,
    base_url: String,
}

impl NseExtractor {
    pub fn new(http: Arc<dyn HttpFetcher>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn quote_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/api/quote-equity?symbol={}",
            self.base_url,
            symbol.as_str().replace('&', "%26")
        )
    }

    /// The quote API rejects requests without session cookies from the site root
    async fn prime_session(&self) {
        let headers = [("User-Agent", BROWSER_USER_AGENT), ("Accept", "text/html")];
        match self.http.get(&self.base_url, &headers).await {
            Ok(response) if response.is_success() => {}
            Ok(response) => debug!(status = response.status, "NSE session priming rejected"),
            Err(e) => debug!(error = %e, "NSE session priming failed"),
        }
    }
}

#[async_trait]
impl Extractor for NseExtractor {
    fn source(&self) -> SourceId {
        SourceId::Nse
    }

    async fn extract(&self, symbol: &Symbol) -> Result<PartialRecord> {
        self.prime_session().await;

        let referer = format!("{}/get-quotes/equity?symbol={}", self.base_url, symbol);
        let url = self.quote_url(symbol);
        let body = fetch_body(
            self.http.as_ref(),
            SourceId::Nse,
            &url,
            &[
                ("User-Agent", BROWSER_USER_AGENT),
                ("Accept", "application/json"),
                ("Accept-Language", "en-US,en;q=0.9"),
                ("Referer", referer.as_str()),
            ],
        )
        .await?;

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            warn!(symbol = %symbol, "NSE returned a non-JSON body");
            AnalysisError::source_unavailable(SourceId::Nse, format!("invalid quote payload: {}", e))
        })?;

        let record = parse_quote(&payload);
        debug!(symbol = %symbol, fields = record.populated_fields().len(), "NSE quote parsed");
        Ok(record)
    }
}

fn number_at(payload: &Value, pointer: &str) -> Option<f64> {
    payload.pointer(pointer).and_then(coerce_number)
}

fn parse_quote(payload: &Value) -> PartialRecord {
    let current_price = number_at(payload, "/priceInfo/lastPrice");

    let market_cap = match (number_at(payload, "/securityInfo/issuedSize"), current_price) {
        (Some(shares), Some(price)) if shares > 0.0 => Some(shares * price / RUPEES_PER_CRORE),
        _ => None,
    };

    PartialRecord {
        current_price,
        previous_close: number_at(payload, "/priceInfo/previousClose"),
        change_percent: number_at(payload, "/priceInfo/pChange"),
        market_cap,
        pe_ratio: number_at(payload, "/metadata/pdSymbolPe"),
        company_name: payload
            .pointer("/info/companyName")
            .and_then(Value::as_str)
            .and_then(non_empty_text),
        exchange: payload.get("info").map(|_| "NSE".to_string()),
        ..Default::default()
    }
}

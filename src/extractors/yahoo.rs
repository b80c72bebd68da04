//! Yahoo Finance chart API (structured market quotes)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{coerce_count, coerce_number, fetch_body, non_empty_text, percent_change, Extractor};
use crate::error::AnalysisError;
use crate::http::HttpFetcher;
use crate::models::{PartialRecord, SourceId, Symbol};
use crate::Result;

/// Listing suffix for NSE instruments on Yahoo
const NSE_SUFFIX: &str = ".NS";

pub struct YahooExtractor {
    http: Arc<dyn HttpFetcher>,
    base_url: String,
}

impl YahooExtractor {
    pub fn new(http: Arc<dyn HttpFetcher>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/v8/finance/chart/{}{}?interval=1d&range=1d",
            self.base_url,
            symbol.as_str().replace('&', "%26"),
            NSE_SUFFIX
        )
    }
}

#[async_trait]
impl Extractor for YahooExtractor {
    fn source(&self) -> SourceId {
        SourceId::Yahoo
    }

    async fn extract(&self, symbol: &Symbol) -> Result<PartialRecord> {
        let url = self.chart_url(symbol);
        let body = fetch_body(
            self.http.as_ref(),
            SourceId::Yahoo,
            &url,
            &[("User-Agent", super::BROWSER_USER_AGENT), ("Accept", "application/json")],
        )
        .await?;

        let record = parse_chart(&body)?;
        debug!(symbol = %symbol, fields = record.populated_fields().len(), "Yahoo chart parsed");
        Ok(record)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
}

/// Numeric keys stay loosely typed; coercion decides what is usable
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<Value>,
    chart_previous_close: Option<Value>,
    previous_close: Option<Value>,
    regular_market_volume: Option<Value>,
    long_name: Option<String>,
    short_name: Option<String>,
    full_exchange_name: Option<String>,
    exchange_name: Option<String>,
}

fn parse_chart(body: &str) -> Result<PartialRecord> {
    let envelope: ChartEnvelope = serde_json::from_str(body).map_err(|e| {
        AnalysisError::source_unavailable(SourceId::Yahoo, format!("invalid chart payload: {}", e))
    })?;

    if let Some(error) = envelope.chart.error.filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("chart error")
            .to_string();
        return Err(AnalysisError::source_unavailable(SourceId::Yahoo, description));
    }

    let meta = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|r| r.meta)
        .unwrap_or_default();

    let number = |v: &Option<Value>| v.as_ref().and_then(coerce_number);

    let current_price = number(&meta.regular_market_price);
    let previous_close = number(&meta.chart_previous_close).or_else(|| number(&meta.previous_close));
    let change_percent = match (current_price, previous_close) {
        (Some(price), Some(previous)) => percent_change(price, previous),
        _ => None,
    };

    Ok(PartialRecord {
        current_price,
        previous_close,
        change_percent,
        volume: meta.regular_market_volume.as_ref().and_then(coerce_count),
        company_name: meta
            .long_name
            .as_deref()
            .and_then(non_empty_text)
            .or_else(|| meta.short_name.as_deref().and_then(non_empty_text)),
        exchange: meta
            .full_exchange_name
            .as_deref()
            .and_then(non_empty_text)
            .or_else(|| meta.exchange_name.as_deref().and_then(non_empty_text)),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "INR",
                    "symbol": "INFY.NS",
                    "exchangeName": "NSI",
                    "fullExchangeName": "NSE",
                    "regularMarketPrice": 1530.0,
                    "chartPreviousClose": 1500.0,
                    "regularMarketVolume": 6120345,
                    "longName": "Infosys Limited",
                    "shortName": "INFOSYS LTD"
                }
            }],
            "error": null
        }
    }"#;

    fn extractor(fetcher: StaticFetcher) -> YahooExtractor {
        YahooExtractor::new(Arc::new(fetcher), "https://yahoo.test/")
    }

    #[tokio::test]
    async fn test_maps_chart_meta() {
        let yahoo = extractor(StaticFetcher::new().with_body("/v8/finance/chart/INFY.NS", CHART));
        let symbol = Symbol::parse("infy").unwrap();

        let record = yahoo.extract(&symbol).await.unwrap();

        assert_eq!(record.current_price, Some(1530.0));
        assert_eq!(record.previous_close, Some(1500.0));
        assert_eq!(record.change_percent, Some(2.0));
        assert_eq!(record.volume, Some(6_120_345));
        assert_eq!(record.company_name.as_deref(), Some("Infosys Limited"));
        assert_eq!(record.exchange.as_deref(), Some("NSE"));
        assert!(record.pe_ratio.is_none());
        assert!(record.market_cap.is_none());
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let record = parse_chart(
            r#"{"chart": {"result": [{"meta": {"regularMarketPrice": "n/a", "shortName": "TCS"}}], "error": null}}"#,
        )
        .unwrap();

        assert!(record.current_price.is_none());
        assert!(record.change_percent.is_none());
        assert_eq!(record.company_name.as_deref(), Some("TCS"));
    }

    #[test]
    fn test_empty_result_is_empty_record() {
        let record = parse_chart(r#"{"chart": {"result": [], "error": null}}"#).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_chart_error_is_source_unavailable() {
        let err = parse_chart(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        )
        .unwrap_err();

        match err {
            AnalysisError::SourceUnavailable { reason, .. } => assert!(reason.contains("delisted")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_non_success_response_fails_source() {
        let yahoo = extractor(StaticFetcher::new().with_status("/v8/finance/chart/", 429, "Too Many Requests"));
        let symbol = Symbol::parse("INFY").unwrap();

        assert!(yahoo.extract(&symbol).await.is_err());
    }

    #[test]
    fn test_url_encodes_ampersand() {
        let yahoo = extractor(StaticFetcher::new());
        let symbol = Symbol::parse("M&M").unwrap();
        assert_eq!(
            yahoo.chart_url(&symbol),
            "https://yahoo.test/v8/finance/chart/M%26M.NS?interval=1d&range=1d"
        );
    }
}

//! Fakes for the trait seams, shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::AnalysisError;
use crate::extractors::Extractor;
use crate::http::{HttpFetcher, HttpResponse};
use crate::models::{PartialRecord, SourceId, Symbol};
use crate::report::enrichment::{EnrichmentRequest, Enricher};
use crate::Result;

/// Serves canned responses for URLs containing a registered fragment
#[derive(Default)]
pub struct StaticFetcher {
    routes: Vec<(String, u16, String)>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, fragment: &str, body: &str) -> Self {
        self.with_status(fragment, 200, body)
    }

    pub fn with_status(mut self, fragment: &str, status: u16, body: &str) -> Self {
        self.routes
            .push((fragment.to_string(), status, body.to_string()));
        self
    }
}

#[async_trait]
impl HttpFetcher for StaticFetcher {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.routes
            .iter()
            .find(|(fragment, _, _)| url.contains(fragment.as_str()))
            .map(|(_, status, body)| HttpResponse {
                status: *status,
                body: body.clone(),
            })
            .ok_or_else(|| {
                AnalysisError::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("no route for {}", url),
                ))
            })
    }
}

/// Extractor with a scripted result and optional latency
pub struct FixedExtractor {
    source: SourceId,
    result: std::result::Result<PartialRecord, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FixedExtractor {
    pub fn ok(source: SourceId, record: PartialRecord) -> Arc<Self> {
        Arc::new(Self {
            source,
            result: Ok(record),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(source: SourceId, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            source,
            result: Err(reason.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(source: SourceId, record: PartialRecord, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            result: Ok(record),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for FixedExtractor {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn extract(&self, _symbol: &Symbol) -> Result<PartialRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result
            .clone()
            .map_err(|reason| AnalysisError::source_unavailable(self.source, reason))
    }
}

/// Enricher returning a fixed text or error
pub struct ScriptedEnricher {
    response: std::result::Result<String, String>,
    delay: Duration,
}

impl ScriptedEnricher {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(text.to_string()),
            delay: Duration::ZERO,
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(reason.to_string()),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(text.to_string()),
            delay,
        })
    }
}

#[async_trait]
impl Enricher for ScriptedEnricher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn enrich(&self, _request: &EnrichmentRequest<'_>) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response
            .clone()
            .map_err(AnalysisError::EnrichmentUnavailable)
    }
}

pub fn full_yahoo_record() -> PartialRecord {
    PartialRecord {
        current_price: Some(2850.5),
        previous_close: Some(2815.0),
        change_percent: Some(1.26),
        volume: Some(5_400_000),
        company_name: Some("Reliance Industries Limited".to_string()),
        exchange: Some("NSE".to_string()),
        ..Default::default()
    }
}

pub fn full_screener_record() -> PartialRecord {
    PartialRecord {
        current_price: Some(2849.0),
        market_cap: Some(1_928_000.0),
        pe_ratio: Some(28.4),
        roe: Some(9.2),
        roce: Some(10.1),
        book_value: Some(1175.0),
        company_name: Some("Reliance Industr".to_string()),
        ..Default::default()
    }
}

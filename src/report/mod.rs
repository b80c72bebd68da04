//! Report renderer
//!
//! The deterministic summary is always built. Enrichment is attempted on top
//! of it and, on any failure, the deterministic text is used with the failure
//! reason attached to the report.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::models::{CanonicalRecord, DerivedMetrics, Report};

pub mod enrichment;

use enrichment::{EnrichmentRequest, Enricher};

/// ₹ crore; above this a company counts as large-cap
pub const LARGE_CAP_THRESHOLD_CR: f64 = 20_000.0;
const STRONG_ROE_ABOVE: f64 = 15.0;
const INSUFFICIENT_DATA: &str = "Insufficient data to assess";

//
// ================= Strengths & Concerns =================
//

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
}

/// Shared by the enrichment prompt and the deterministic summary.
/// Neither list is ever empty.
pub fn assess(record: &CanonicalRecord) -> Assessment {
    let mut strengths = Vec::new();
    let mut concerns = Vec::new();

    match record.roe() {
        Some(roe) if roe > STRONG_ROE_ABOVE => {
            strengths.push(format!("Strong profitability (ROE {:.2}%)", roe))
        }
        Some(roe) => concerns.push(format!("Weak profitability (ROE {:.2}%)", roe)),
        None => concerns.push("Profitability unverified (ROE unavailable)".to_string()),
    }

    if let Some(cap) = record.market_cap().filter(|c| *c > LARGE_CAP_THRESHOLD_CR) {
        strengths.push(format!("Large-cap stability (₹{:.0} Cr market cap)", cap));
    }

    match record.change_percent() {
        Some(change) if change > 0.0 => {
            strengths.push(format!("Positive momentum ({:+.2}% today)", change))
        }
        Some(change) => concerns.push(format!("Weak momentum ({:+.2}% today)", change)),
        None => concerns.push("Momentum unverified (price change unavailable)".to_string()),
    }

    if strengths.is_empty() {
        strengths.push(INSUFFICIENT_DATA.to_string());
    }
    if concerns.is_empty() {
        concerns.push(INSUFFICIENT_DATA.to_string());
    }

    Assessment { strengths, concerns }
}

//
// ================= Deterministic Template =================
//

fn direction(change: f64) -> &'static str {
    if change > 0.0 {
        "up"
    } else if change < 0.0 {
        "down"
    } else {
        "flat"
    }
}

fn reliability_line(source_names: &[String]) -> String {
    format!(
        "Data reliability: compiled from {} source(s): {}. Figures are best-effort and may be delayed.",
        source_names.len(),
        source_names.join(", ")
    )
}

/// Fixed-shape text report. Unresolved optional lines are dropped; price
/// renders as N/A; the risk line is always present.
pub fn render_deterministic(
    record: &CanonicalRecord,
    metrics: &DerivedMetrics,
    source_names: &[String],
) -> String {
    let mut lines = Vec::with_capacity(16);

    let mut title = format!("{} ({})", record.display_name(), record.symbol());
    if let Some(exchange) = record.exchange() {
        title.push_str(&format!(" [{}]", exchange));
    }
    lines.push(title);

    lines.push(match record.current_price() {
        Some(price) => format!("Price: ₹{:.2}", price),
        None => "Price: N/A".to_string(),
    });

    if let Some(change) = record.change_percent() {
        lines.push(format!("Change: {:+.2}% ({})", change, direction(change)));
    }
    if let Some(cap) = record.market_cap() {
        lines.push(format!("Market Cap: ₹{:.0} Cr", cap));
    }
    if let Some(pe) = record.pe_ratio() {
        lines.push(format!("P/E: {:.2} ({})", pe, metrics.valuation));
    }
    if let Some(roe) = record.roe() {
        lines.push(format!("ROE: {:.2}%", roe));
    }
    if let Some(book_value) = record.book_value() {
        lines.push(format!("Book Value: ₹{:.2}", book_value));
    }
    lines.push(format!("Risk: {}", metrics.risk));

    let assessment = assess(record);
    lines.push(String::new());
    lines.push("Strengths:".to_string());
    lines.extend(assessment.strengths.iter().map(|s| format!("- {}", s)));
    lines.push("Concerns:".to_string());
    lines.extend(assessment.concerns.iter().map(|c| format!("- {}", c)));
    lines.push(String::new());
    lines.push(reliability_line(source_names));

    lines.join("\n")
}

//
// ================= Renderer =================
//

pub struct ReportRenderer {
    enricher: Arc<dyn Enricher>,
    enrichment_timeout: Duration,
}

impl ReportRenderer {
    pub fn new(enricher: Arc<dyn Enricher>, enrichment_timeout: Duration) -> Self {
        Self {
            enricher,
            enrichment_timeout,
        }
    }

    pub async fn render(
        &self,
        record: CanonicalRecord,
        metrics: DerivedMetrics,
        source_names: Vec<String>,
    ) -> Report {
        self.render_until(record, metrics, source_names, None).await
    }

    /// As `render`, with enrichment bounded by an optional request deadline
    pub async fn render_until(
        &self,
        record: CanonicalRecord,
        metrics: DerivedMetrics,
        source_names: Vec<String>,
        deadline: Option<Instant>,
    ) -> Report {
        let deterministic_summary = render_deterministic(&record, &metrics, &source_names);

        let enrichment = self
            .enrich(&record, &metrics, &deterministic_summary, &source_names, deadline)
            .await;

        let (summary, enriched_summary, enrichment_error) = match enrichment {
            Ok(text) => (text.clone(), Some(text), None),
            Err(reason) => {
                warn!(
                    symbol = %record.symbol(),
                    enricher = self.enricher.name(),
                    reason = %reason,
                    "Enrichment unavailable, using deterministic summary"
                );
                (deterministic_summary.clone(), None, Some(reason))
            }
        };

        Report {
            symbol: record.symbol().clone(),
            summary,
            deterministic_summary,
            enriched_summary,
            enrichment_error,
            sources: source_names,
            metrics,
            record,
            generated_at: Utc::now(),
        }
    }

    async fn enrich(
        &self,
        record: &CanonicalRecord,
        metrics: &DerivedMetrics,
        deterministic_summary: &str,
        source_names: &[String],
        deadline: Option<Instant>,
    ) -> std::result::Result<String, String> {
        let now = Instant::now();
        if matches!(deadline, Some(d) if d <= now) {
            return Err("request deadline exceeded".to_string());
        }

        let bound = match (deadline, now.checked_add(self.enrichment_timeout)) {
            (Some(d), Some(c)) => Some(d.min(c)),
            (d, c) => d.or(c),
        };

        let assessment = assess(record);
        let request = EnrichmentRequest {
            record,
            metrics,
            assessment: &assessment,
            deterministic_summary,
            source_names,
        };

        let result = match bound {
            Some(bound) => timeout_at(bound, self.enricher.enrich(&request)).await,
            None => Ok(self.enricher.enrich(&request).await),
        };

        match result {
            Ok(Ok(text)) => {
                info!(symbol = %record.symbol(), enricher = self.enricher.name(), "Report enriched");
                Ok(text)
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "enrichment timed out after {}ms",
                now.elapsed().as_millis()
            )),
        }
    }
}

//! Screener.in company page (document scrape)
//!
//! Fields come from an ordered list of independent probes. Each probe names a
//! node selector, a label the node's text must contain and a pattern applied
//! to the text after that label. Probes for a field are tried in order and the
//! first hit wins; a probe that misses never blocks the others.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use super::{fetch_body, parse_number_text, Extractor, BROWSER_USER_AGENT};
use crate::http::HttpFetcher;
use crate::markup::{self, Document};
use crate::models::{Field, PartialRecord, SourceId, Symbol};
use crate::Result;

const TOP_RATIOS: &str = "#top-ratios li";
const ANY_LIST_ITEM: &str = "li";

lazy_static! {
    /// First signed decimal, Indian digit grouping allowed
    static ref NUMBER: Regex = Regex::new(r"([-+]?\d[\d,]*(?:\.\d+)?)").unwrap();
    /// A decimal followed by a percent sign
    static ref PERCENT: Regex = Regex::new(r"([-+]?\d[\d,]*(?:\.\d+)?)\s*%").unwrap();

    static ref PROBES: Vec<Probe> = vec![
        Probe::new(Field::MarketCap, TOP_RATIOS, "Market Cap", &NUMBER),
        Probe::new(Field::MarketCap, ANY_LIST_ITEM, "Market Cap", &NUMBER),
        Probe::new(Field::CurrentPrice, TOP_RATIOS, "Current Price", &NUMBER),
        Probe::new(Field::CurrentPrice, ANY_LIST_ITEM, "Current Price", &NUMBER),
        Probe::new(Field::PeRatio, TOP_RATIOS, "Stock P/E", &NUMBER),
        Probe::new(Field::PeRatio, ANY_LIST_ITEM, "Price to Earning", &NUMBER),
        Probe::new(Field::BookValue, TOP_RATIOS, "Book Value", &NUMBER),
        Probe::new(Field::Roe, TOP_RATIOS, "ROE", &PERCENT),
        Probe::new(Field::Roe, TOP_RATIOS, "Return on equity", &PERCENT),
        Probe::new(Field::Roce, TOP_RATIOS, "ROCE", &PERCENT),
        Probe::new(Field::Roce, TOP_RATIOS, "Return on capital", &PERCENT),
    ];
}

/// One (selector, label, pattern) heuristic for a numeric field
struct Probe {
    field: Field,
    selector: &'static str,
    label: &'static str,
    pattern: &'static Regex,
}

impl Probe {
    fn new(field: Field, selector: &'static str, label: &'static str, pattern: &'static Regex) -> Self {
        Self {
            field,
            selector,
            label,
            pattern,
        }
    }

    /// Value from the first node carrying the label whose trailing text matches
    fn apply(&self, document: &Document) -> Option<f64> {
        let label = self.label.to_lowercase();
        let selector = markup::selector(self.selector)?;

        let value = document.texts(&selector).find_map(|text| {
            let lowered = text.to_lowercase();
            let at = lowered.find(&label)?;
            // Lowercasing can shift byte offsets for non-ASCII text
            let rest = text.get(at + label.len()..)?;
            let captures = self.pattern.captures(rest)?;
            parse_number_text(captures.get(1)?.as_str())
        });
        value
    }
}

fn probe_field(document: &Document, field: Field) -> Option<f64> {
    PROBES
        .iter()
        .filter(|probe| probe.field == field)
        .find_map(|probe| probe.apply(document))
}

/// Extract every supported field from a company page
pub(crate) fn parse_company_page(markup: &str) -> PartialRecord {
    let document = Document::parse(markup);

    PartialRecord {
        market_cap: probe_field(&document, Field::MarketCap),
        current_price: probe_field(&document, Field::CurrentPrice),
        pe_ratio: probe_field(&document, Field::PeRatio),
        book_value: probe_field(&document, Field::BookValue),
        roe: probe_field(&document, Field::Roe),
        roce: probe_field(&document, Field::Roce),
        company_name: markup::selector("h1").and_then(|h1| document.first_text(&h1)),
        ..Default::default()
    }
}

pub struct ScreenerExtractor {
    http: Arc<dyn HttpFetcher>,
    base_url: String,
}

impl ScreenerExtractor {
    pub fn new(http: Arc<dyn HttpFetcher>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn company_url(&self, symbol: &Symbol) -> String {
        format!(
            "{}/company/{}/consolidated/",
            self.base_url,
            symbol.as_str().replace('&', "%26")
        )
    }
}

#[async_trait]
impl Extractor for ScreenerExtractor {
    fn source(&self) -> SourceId {
        SourceId::Screener
    }

    async fn extract(&self, symbol: &Symbol) -> Result<PartialRecord> {
        let url = self.company_url(symbol);
        let markup = fetch_body(
            self.http.as_ref(),
            SourceId::Screener,
            &url,
            &[("User-Agent", BROWSER_USER_AGENT), ("Accept", "text/html")],
        )
        .await?;

        let record = parse_company_page(&markup);
        debug!(symbol = %symbol, fields = record.populated_fields().len(), "Screener page parsed");
        Ok(record)
    }
}

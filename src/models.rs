//! Core data models for the equity aggregator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AnalysisError;

const MAX_SYMBOL_LEN: usize = 20;
const EXCHANGE_SUFFIXES: &[&str] = &[".NS", ".BO"];

//
// ================= Symbol =================
//

/// Uppercase ticker, normalized once on entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let mut normalized = raw.trim().to_uppercase();

        for suffix in EXCHANGE_SUFFIXES {
            if let Some(stripped) = normalized.strip_suffix(suffix) {
                normalized = stripped.to_string();
                break;
            }
        }

        if normalized.is_empty() {
            return Err(AnalysisError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }

        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(AnalysisError::InvalidSymbol(format!(
                "'{}' exceeds {} characters",
                normalized, MAX_SYMBOL_LEN
            )));
        }

        let valid = normalized
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '&' | '-' | '.'));

        let leads_alphanumeric = normalized
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric());

        if !valid || !leads_alphanumeric {
            return Err(AnalysisError::InvalidSymbol(format!(
                "'{}' contains unsupported characters",
                normalized
            )));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ================= Sources & Fields =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Yahoo,
    Nse,
    Screener,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Yahoo, SourceId::Nse, SourceId::Screener];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Yahoo => "yahoo",
            SourceId::Nse => "nse",
            SourceId::Screener => "screener",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Yahoo => "Yahoo Finance",
            SourceId::Nse => "NSE India",
            SourceId::Screener => "Screener.in",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed field vocabulary shared by every component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CurrentPrice,
    PreviousClose,
    ChangePercent,
    Volume,
    MarketCap,
    PeRatio,
    Roe,
    Roce,
    BookValue,
    CompanyName,
    Exchange,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::CurrentPrice,
        Field::PreviousClose,
        Field::ChangePercent,
        Field::Volume,
        Field::MarketCap,
        Field::PeRatio,
        Field::Roe,
        Field::Roce,
        Field::BookValue,
        Field::CompanyName,
        Field::Exchange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CurrentPrice => "current_price",
            Field::PreviousClose => "previous_close",
            Field::ChangePercent => "change_percent",
            Field::Volume => "volume",
            Field::MarketCap => "market_cap",
            Field::PeRatio => "pe_ratio",
            Field::Roe => "roe",
            Field::Roce => "roce",
            Field::BookValue => "book_value",
            Field::CompanyName => "company_name",
            Field::Exchange => "exchange",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ================= PartialRecord =================
//

/// Sparse single-source field set. Absent means "not extracted", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<u64>,
    /// ₹ crore
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub roce: Option<f64>,
    pub book_value: Option<f64>,
    pub company_name: Option<String>,
    pub exchange: Option<String>,
}

impl PartialRecord {
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::CurrentPrice => self.current_price.is_some(),
            Field::PreviousClose => self.previous_close.is_some(),
            Field::ChangePercent => self.change_percent.is_some(),
            Field::Volume => self.volume.is_some(),
            Field::MarketCap => self.market_cap.is_some(),
            Field::PeRatio => self.pe_ratio.is_some(),
            Field::Roe => self.roe.is_some(),
            Field::Roce => self.roce.is_some(),
            Field::BookValue => self.book_value.is_some(),
            Field::CompanyName => self.company_name.is_some(),
            Field::Exchange => self.exchange.is_some(),
        }
    }

    pub fn populated_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| self.has(*f)).collect()
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| !self.has(*f))
    }
}

//
// ================= SourceOutcome =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// One extractor's settled result for a request
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    source: SourceId,
    status: OutcomeStatus,
    record: PartialRecord,
    error: Option<String>,
    elapsed_ms: u64,
}

impl SourceOutcome {
    pub fn success(source: SourceId, record: PartialRecord, elapsed_ms: u64) -> Self {
        Self {
            source,
            status: OutcomeStatus::Success,
            record,
            error: None,
            elapsed_ms,
        }
    }

    /// A failed source contributes a fully-absent record
    pub fn failure(source: SourceId, reason: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            source,
            status: OutcomeStatus::Failed,
            record: PartialRecord::default(),
            error: Some(reason.into()),
            elapsed_ms,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    pub fn record(&self) -> &PartialRecord {
        &self.record
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

//
// ================= CanonicalRecord =================
//

/// A resolved value and the source it was taken from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: SourceId,
}

/// Merged, provenance-tagged record. Built once by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub(crate) symbol: Symbol,
    pub(crate) current_price: Option<Resolved<f64>>,
    pub(crate) previous_close: Option<Resolved<f64>>,
    pub(crate) change_percent: Option<Resolved<f64>>,
    pub(crate) volume: Option<Resolved<u64>>,
    pub(crate) market_cap: Option<Resolved<f64>>,
    pub(crate) pe_ratio: Option<Resolved<f64>>,
    pub(crate) roe: Option<Resolved<f64>>,
    pub(crate) roce: Option<Resolved<f64>>,
    pub(crate) book_value: Option<Resolved<f64>>,
    pub(crate) company_name: Option<Resolved<String>>,
    pub(crate) exchange: Option<Resolved<String>>,
    pub(crate) contributing_sources: Vec<SourceId>,
}

impl CanonicalRecord {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn current_price(&self) -> Option<f64> {
        self.current_price.as_ref().map(|r| r.value)
    }

    pub fn previous_close(&self) -> Option<f64> {
        self.previous_close.as_ref().map(|r| r.value)
    }

    pub fn change_percent(&self) -> Option<f64> {
        self.change_percent.as_ref().map(|r| r.value)
    }

    pub fn volume(&self) -> Option<u64> {
        self.volume.as_ref().map(|r| r.value)
    }

    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap.as_ref().map(|r| r.value)
    }

    pub fn pe_ratio(&self) -> Option<f64> {
        self.pe_ratio.as_ref().map(|r| r.value)
    }

    pub fn roe(&self) -> Option<f64> {
        self.roe.as_ref().map(|r| r.value)
    }

    pub fn roce(&self) -> Option<f64> {
        self.roce.as_ref().map(|r| r.value)
    }

    pub fn book_value(&self) -> Option<f64> {
        self.book_value.as_ref().map(|r| r.value)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_ref().map(|r| r.value.as_str())
    }

    pub fn exchange(&self) -> Option<&str> {
        self.exchange.as_ref().map(|r| r.value.as_str())
    }

    /// Which source a field was resolved from, `None` when unresolved
    pub fn provenance(&self, field: Field) -> Option<SourceId> {
        match field {
            Field::CurrentPrice => self.current_price.as_ref().map(|r| r.source),
            Field::PreviousClose => self.previous_close.as_ref().map(|r| r.source),
            Field::ChangePercent => self.change_percent.as_ref().map(|r| r.source),
            Field::Volume => self.volume.as_ref().map(|r| r.source),
            Field::MarketCap => self.market_cap.as_ref().map(|r| r.source),
            Field::PeRatio => self.pe_ratio.as_ref().map(|r| r.source),
            Field::Roe => self.roe.as_ref().map(|r| r.source),
            Field::Roce => self.roce.as_ref().map(|r| r.source),
            Field::BookValue => self.book_value.as_ref().map(|r| r.source),
            Field::CompanyName => self.company_name.as_ref().map(|r| r.source),
            Field::Exchange => self.exchange.as_ref().map(|r| r.source),
        }
    }

    pub fn unresolved_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.provenance(*f).is_none())
            .collect()
    }

    /// Sources whose extraction succeeded, in fan-out order
    pub fn contributing_sources(&self) -> &[SourceId] {
        &self.contributing_sources
    }

    pub fn display_name(&self) -> &str {
        self.company_name().unwrap_or(self.symbol.as_str())
    }
}

//
// ================= Derived Metrics =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValuationTier {
    Cheap,
    Fair,
    Expensive,
    #[serde(rename = "Very Expensive")]
    VeryExpensive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivedMetrics {
    pub valuation: ValuationTier,
    pub risk: RiskTier,
}

impl fmt::Display for ValuationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValuationTier::Cheap => "Cheap",
            ValuationTier::Fair => "Fair",
            ValuationTier::Expensive => "Expensive",
            ValuationTier::VeryExpensive => "Very Expensive",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Report =================
//

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub symbol: Symbol,
    /// Enriched text when available, the deterministic text otherwise
    pub summary: String,
    pub deterministic_summary: String,
    pub enriched_summary: Option<String>,
    pub enrichment_error: Option<String>,
    /// Display names of the sources that succeeded
    pub sources: Vec<String>,
    pub metrics: DerivedMetrics,
    pub record: CanonicalRecord,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn is_enriched(&self) -> bool {
        self.enriched_summary.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::parse("  reliance ").unwrap().as_str(), "RELIANCE");
        assert_eq!(Symbol::parse("tcs.ns").unwrap().as_str(), "TCS");
        assert_eq!(Symbol::parse("M&M").unwrap().as_str(), "M&M");
        assert_eq!(Symbol::parse("bajaj-auto").unwrap().as_str(), "BAJAJ-AUTO");
    }

    #[test]
    fn test_symbol_rejections() {
        for raw in [
            "",
            "   ",
            ".NS",
            ".",
            "..",
            "-",
            "&",
            "../ETC",
            "RELI ANCE",
            "ABC$",
            "AVERYLONGSYMBOLNAMEXYZ",
        ] {
            let err = Symbol::parse(raw).unwrap_err();
            assert!(
                matches!(err, AnalysisError::InvalidSymbol(_)),
                "expected InvalidSymbol for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_partial_record_population() {
        let record = PartialRecord {
            current_price: Some(101.5),
            company_name: Some("Infosys Limited".to_string()),
            ..Default::default()
        };

        assert!(!record.is_empty());
        assert_eq!(
            record.populated_fields(),
            vec![Field::CurrentPrice, Field::CompanyName]
        );
        assert!(PartialRecord::default().is_empty());
    }

    #[test]
    fn test_failed_outcome_is_fully_absent() {
        let outcome = SourceOutcome::failure(SourceId::Nse, "HTTP 403", 12);
        assert!(!outcome.is_success());
        assert!(outcome.record().is_empty());
        assert_eq!(outcome.error(), Some("HTTP 403"));
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(ValuationTier::VeryExpensive.to_string(), "Very Expensive");
        assert_eq!(RiskTier::Medium.to_string(), "Medium");
        assert_eq!(
            serde_json::to_string(&ValuationTier::VeryExpensive).unwrap(),
            "\"Very Expensive\""
        );
    }
}

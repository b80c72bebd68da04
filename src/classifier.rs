//! Metrics Classifier
//!
//! Derives valuation and risk tiers from a canonical record:
//! - Valuation: P/E bands (Cheap < 15 ≤ Fair ≤ 30 < Expensive ≤ 50 < Very Expensive)
//! - Risk: Medium by default, Low for cheap and profitable, High for P/E > 50
//!
//! Absent inputs never fail; they fall back to the neutral tier.

use crate::models::{CanonicalRecord, DerivedMetrics, RiskTier, ValuationTier};

const CHEAP_BELOW_PE: f64 = 15.0;
const FAIR_UP_TO_PE: f64 = 30.0;
const EXPENSIVE_UP_TO_PE: f64 = 50.0;

const LOW_RISK_BELOW_PE: f64 = 20.0;
const LOW_RISK_ABOVE_ROE: f64 = 15.0;
const HIGH_RISK_ABOVE_PE: f64 = 50.0;

/// Metrics classifier
pub struct MetricsClassifier;

impl MetricsClassifier {
    pub fn classify(record: &CanonicalRecord) -> DerivedMetrics {
        Self::classify_values(record.pe_ratio(), record.roe())
    }

    pub fn classify_values(pe_ratio: Option<f64>, roe: Option<f64>) -> DerivedMetrics {
        DerivedMetrics {
            valuation: valuation_tier(pe_ratio),
            risk: risk_tier(pe_ratio, roe),
        }
    }
}

pub fn valuation_tier(pe_ratio: Option<f64>) -> ValuationTier {
    match pe_ratio {
        None => ValuationTier::Fair,
        Some(pe) if pe < CHEAP_BELOW_PE => ValuationTier::Cheap,
        Some(pe) if pe <= FAIR_UP_TO_PE => ValuationTier::Fair,
        Some(pe) if pe <= EXPENSIVE_UP_TO_PE => ValuationTier::Expensive,
        Some(_) => ValuationTier::VeryExpensive,
    }
}

/// High is checked first so it wins whenever both conditions hold
pub fn risk_tier(pe_ratio: Option<f64>, roe: Option<f64>) -> RiskTier {
    if matches!(pe_ratio, Some(pe) if pe > HIGH_RISK_ABOVE_PE) {
        return RiskTier::High;
    }

    match (pe_ratio, roe) {
        (Some(pe), Some(roe)) if pe < LOW_RISK_BELOW_PE && roe > LOW_RISK_ABOVE_ROE => RiskTier::Low,
        _ => RiskTier::Medium,
    }
}

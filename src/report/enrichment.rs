//! Optional generative enrichment
//!
//! Selected once at construction: a Gemini-backed enricher when a key is
//! configured, otherwise one that always reports itself unavailable.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::Assessment;
use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::gemini::{GeminiClient, ModelConfig};
use crate::models::{CanonicalRecord, DerivedMetrics};
use crate::Result;

const SYSTEM_PROMPT: &str = r#"You are a sell-side equity analyst covering Indian listed companies.

Guidelines:
- Use only the figures supplied; never invent numbers
- Be concise and neutral
- Follow the requested output format exactly"#;

/// Everything an enricher may use
pub struct EnrichmentRequest<'a> {
    pub record: &'a CanonicalRecord,
    pub metrics: &'a DerivedMetrics,
    pub assessment: &'a Assessment,
    pub deterministic_summary: &'a str,
    pub source_names: &'a [String],
}

/// Trait for enrichment strategies
#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn enrich(&self, request: &EnrichmentRequest<'_>) -> Result<String>;
}

/// Gemini-backed analyst summary
pub struct GeminiEnricher {
    client: GeminiClient,
    model: ModelConfig,
}

impl GeminiEnricher {
    pub fn new(client: GeminiClient, model: ModelConfig) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl Enricher for GeminiEnricher {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn enrich(&self, request: &EnrichmentRequest<'_>) -> Result<String> {
        let prompt = build_prompt(request);
        self.client.generate(&prompt, SYSTEM_PROMPT, &self.model).await
    }
}

/// Used when no credential is configured
pub struct DeterministicOnly;

#[async_trait]
impl Enricher for DeterministicOnly {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    async fn enrich(&self, _request: &EnrichmentRequest<'_>) -> Result<String> {
        Err(AnalysisError::EnrichmentUnavailable(
            "GEMINI_API_KEY not configured".to_string(),
        ))
    }
}

pub fn enricher_from_config(config: &AppConfig) -> Result<Arc<dyn Enricher>> {
    match &config.gemini_api_key {
        Some(key) => {
            info!(model = %config.gemini_model, "Report enrichment enabled");
            let client = GeminiClient::new(key.clone(), config.enrichment_timeout)?;
            Ok(Arc::new(GeminiEnricher::new(
                client,
                ModelConfig::new(config.gemini_model.clone()),
            )))
        }
        None => {
            info!("GEMINI_API_KEY not set, reports will use the deterministic summary");
            Ok(Arc::new(DeterministicOnly))
        }
    }
}

/// Fixed-format analyst summary request
pub fn build_prompt(request: &EnrichmentRequest<'_>) -> String {
    let record = request.record;
    let record_json = serde_json::to_string_pretty(record).unwrap_or_default();

    format!(
        r#"Write an analyst summary for {name} ({symbol}) in exactly this format:

Stock: <company name> (<symbol>)
Price: <current price and today's change>
Valuation: <one sentence judgment; the P/E tier is {valuation}>
Risk Level: {risk}
Strengths:
- <2-3 bullet points>
Concerns:
- <2-3 bullet points>
Data Reliability: <one sentence stating the figures come from {count} source(s)>

Deterministic report:
---
{summary}
---

Derived strengths: {strengths}
Derived concerns: {concerns}
Contributing sources ({count}): {sources}

Canonical record with provenance:
{record_json}"#,
        name = record.display_name(),
        symbol = record.symbol(),
        valuation = request.metrics.valuation,
        risk = request.metrics.risk,
        count = request.source_names.len(),
        summary = request.deterministic_summary,
        strengths = request.assessment.strengths.join("; "),
        concerns = request.assessment.concerns.join("; "),
        sources = request.source_names.join(", "),
        record_json = record_json,
    )
}

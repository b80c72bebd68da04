//! Stock analyzer - the end-to-end pipeline
//!
//! SYMBOL → FETCH (fan-out) → RECONCILE → CLASSIFY → RENDER

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::classifier::MetricsClassifier;
use crate::config::AppConfig;
use crate::extractors::create_default_extractors;
use crate::http::{HttpFetcher, ReqwestFetcher};
use crate::models::{Report, Symbol};
use crate::orchestrator::FetchOrchestrator;
use crate::reconciliation::Reconciler;
use crate::report::enrichment::enricher_from_config;
use crate::report::ReportRenderer;
use crate::Result;

pub struct StockAnalyzer {
    orchestrator: FetchOrchestrator,
    reconciler: Reconciler,
    renderer: ReportRenderer,
}

impl StockAnalyzer {
    pub fn new(
        orchestrator: FetchOrchestrator,
        reconciler: Reconciler,
        renderer: ReportRenderer,
    ) -> Self {
        Self {
            orchestrator,
            reconciler,
            renderer,
        }
    }

    /// Wire the live sources and the configured enricher
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(config.source_timeout)?);
        let extractors = create_default_extractors(config, http);
        let enricher = enricher_from_config(config)?;

        info!(
            sources = extractors.len(),
            enricher = enricher.name(),
            source_timeout_ms = config.source_timeout.as_millis() as u64,
            "Stock analyzer initialized"
        );

        Ok(Self::new(
            FetchOrchestrator::new(extractors, config.source_timeout),
            Reconciler::default(),
            ReportRenderer::new(enricher, config.enrichment_timeout),
        ))
    }

    /// Only `InvalidSymbol` and `AllSourcesFailed` are returned as errors
    pub async fn analyze(&self, raw_symbol: &str) -> Result<Report> {
        self.run(raw_symbol, None).await
    }

    /// As `analyze`, with the whole request bounded by `budget`.
    /// A budget too large to represent is no bound at all.
    pub async fn analyze_with_deadline(&self, raw_symbol: &str, budget: Duration) -> Result<Report> {
        self.run(raw_symbol, Instant::now().checked_add(budget)).await
    }

    async fn run(&self, raw_symbol: &str, deadline: Option<Instant>) -> Result<Report> {
        let symbol = Symbol::parse(raw_symbol)?;
        let start = Instant::now();

        info!(symbol = %symbol, "Analysis started");

        let outcomes = self.orchestrator.run_all_until(&symbol, deadline).await?;
        let record = self.reconciler.merge(&symbol, &outcomes);
        let metrics = MetricsClassifier::classify(&record);

        let source_names: Vec<String> = record
            .contributing_sources()
            .iter()
            .map(|s| s.display_name().to_string())
            .collect();

        let report = self
            .renderer
            .render_until(record, metrics, source_names, deadline)
            .await;

        info!(
            symbol = %symbol,
            sources = report.sources.len(),
            valuation = %report.metrics.valuation,
            risk = %report.metrics.risk,
            enriched = report.is_enriched(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(report)
    }
}

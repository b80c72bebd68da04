//! Fetch orchestrator
//!
//! Launches every extractor at once and waits for all of them to settle.
//! Each call is bounded and isolated: an error or timeout becomes a failed
//! `SourceOutcome`, never a pipeline fault. Only zero successes is fatal.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::extractors::Extractor;
use crate::models::{SourceOutcome, Symbol};
use crate::Result;

pub struct FetchOrchestrator {
    extractors: Vec<Arc<dyn Extractor>>,
    per_call_timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(extractors: Vec<Arc<dyn Extractor>>, per_call_timeout: Duration) -> Self {
        Self {
            extractors,
            per_call_timeout,
        }
    }

    pub fn source_count(&self) -> usize {
        self.extractors.len()
    }

    /// Fan out to every source; outcomes come back in extractor order
    pub async fn run_all(&self, symbol: &Symbol) -> Result<Vec<SourceOutcome>> {
        self.run_all_until(symbol, None).await
    }

    /// As `run_all`, but calls still pending at `deadline` settle as failures
    pub async fn run_all_until(
        &self,
        symbol: &Symbol,
        deadline: Option<Instant>,
    ) -> Result<Vec<SourceOutcome>> {
        debug!(symbol = %symbol, sources = self.extractors.len(), "Starting source fan-out");

        let calls = self
            .extractors
            .iter()
            .map(|extractor| self.run_one(extractor.as_ref(), symbol, deadline));

        let outcomes = join_all(calls).await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();

        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            warn!(
                symbol = %symbol,
                source = %outcome.source(),
                elapsed_ms = outcome.elapsed_ms(),
                error = outcome.error().unwrap_or("unknown"),
                "Source unavailable"
            );
        }

        if succeeded == 0 {
            return Err(AnalysisError::AllSourcesFailed {
                symbol: symbol.to_string(),
                attempted: outcomes.len(),
            });
        }

        info!(
            symbol = %symbol,
            succeeded,
            failed = outcomes.len() - succeeded,
            "Source fan-out settled"
        );

        Ok(outcomes)
    }

    async fn run_one(
        &self,
        extractor: &dyn Extractor,
        symbol: &Symbol,
        deadline: Option<Instant>,
    ) -> SourceOutcome {
        let source = extractor.source();
        let start = Instant::now();
        let call_bound = start.checked_add(self.per_call_timeout);

        let (bound, deadline_bound) = match (deadline, call_bound) {
            (Some(d), Some(c)) if d < c => (Some(d), true),
            (Some(d), None) => (Some(d), true),
            (_, c) => (c, false),
        };

        let result = match bound {
            Some(bound) => timeout_at(bound, extractor.extract(symbol)).await,
            None => Ok(extractor.extract(symbol).await),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(record)) => {
                debug!(
                    source = %source,
                    elapsed_ms,
                    fields = record.populated_fields().len(),
                    "Source extracted"
                );
                SourceOutcome::success(source, record, elapsed_ms)
            }
            Ok(Err(e)) => SourceOutcome::failure(source, e.to_string(), elapsed_ms),
            Err(_) if deadline_bound => {
                SourceOutcome::failure(source, "request deadline exceeded", elapsed_ms)
            }
            Err(_) => SourceOutcome::failure(
                source,
                format!("timed out after {}ms", self.per_call_timeout.as_millis()),
                elapsed_ms,
            ),
        }
    }
}

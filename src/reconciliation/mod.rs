//! Reconciliation engine
//!
//! Merges per-source outcomes into one `CanonicalRecord`. Every field has an
//! ordered list of trusted sources; the first successful source with a value
//! wins. No averaging, no placeholders: a field nobody supplied stays unresolved.

use std::collections::HashMap;
use tracing::debug;

use crate::models::{
    CanonicalRecord, Field, PartialRecord, Resolved, SourceId, SourceOutcome, Symbol,
};

/// Per-field source precedence, defined in one place
#[derive(Debug, Clone)]
pub struct PriorityTable {
    order: HashMap<Field, Vec<SourceId>>,
}

impl PriorityTable {
    /// An empty table resolves nothing
    pub fn empty() -> Self {
        Self {
            order: HashMap::new(),
        }
    }

    pub fn with(mut self, field: Field, sources: &[SourceId]) -> Self {
        self.order.insert(field, sources.to_vec());
        self
    }

    pub fn sources_for(&self, field: Field) -> &[SourceId] {
        self.order.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        use SourceId::{Nse, Screener, Yahoo};

        Self::empty()
            .with(Field::CurrentPrice, &[Yahoo, Nse, Screener])
            .with(Field::PreviousClose, &[Yahoo, Nse])
            .with(Field::ChangePercent, &[Yahoo, Nse])
            .with(Field::Volume, &[Yahoo])
            .with(Field::MarketCap, &[Screener, Nse])
            .with(Field::PeRatio, &[Screener, Nse])
            .with(Field::Roe, &[Screener])
            .with(Field::Roce, &[Screener])
            .with(Field::BookValue, &[Screener])
            .with(Field::CompanyName, &[Nse, Yahoo, Screener])
            .with(Field::Exchange, &[Yahoo, Nse])
    }
}

pub struct Reconciler {
    priorities: PriorityTable,
}

impl Reconciler {
    pub fn new(priorities: PriorityTable) -> Self {
        Self { priorities }
    }

    pub fn priorities(&self) -> &PriorityTable {
        &self.priorities
    }

    pub fn merge(&self, symbol: &Symbol, outcomes: &[SourceOutcome]) -> CanonicalRecord {
        let record = CanonicalRecord {
            symbol: symbol.clone(),
            current_price: self.pick(Field::CurrentPrice, outcomes, |r| r.current_price),
            previous_close: self.pick(Field::PreviousClose, outcomes, |r| r.previous_close),
            change_percent: self.pick(Field::ChangePercent, outcomes, |r| r.change_percent),
            volume: self.pick(Field::Volume, outcomes, |r| r.volume),
            market_cap: self.pick(Field::MarketCap, outcomes, |r| r.market_cap),
            pe_ratio: self.pick(Field::PeRatio, outcomes, |r| r.pe_ratio),
            roe: self.pick(Field::Roe, outcomes, |r| r.roe),
            roce: self.pick(Field::Roce, outcomes, |r| r.roce),
            book_value: self.pick(Field::BookValue, outcomes, |r| r.book_value),
            company_name: self.pick(Field::CompanyName, outcomes, |r| r.company_name.clone()),
            exchange: self.pick(Field::Exchange, outcomes, |r| r.exchange.clone()),
            contributing_sources: contributing_sources(outcomes),
        };

        debug!(
            symbol = %symbol,
            unresolved = ?record.unresolved_fields(),
            "Record reconciled"
        );

        record
    }

    /// First non-absent value in the field's priority order
    fn pick<T, F>(&self, field: Field, outcomes: &[SourceOutcome], get: F) -> Option<Resolved<T>>
    where
        F: Fn(&PartialRecord) -> Option<T>,
    {
        self.priorities.sources_for(field).iter().find_map(|source| {
            outcomes
                .iter()
                .filter(|o| o.is_success() && o.source() == *source)
                .find_map(|o| get(o.record()))
                .map(|value| Resolved {
                    value,
                    source: *source,
                })
        })
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(PriorityTable::default())
    }
}

fn contributing_sources(outcomes: &[SourceOutcome]) -> Vec<SourceId> {
    let mut sources = Vec::with_capacity(outcomes.len());
    for outcome in outcomes.iter().filter(|o| o.is_success()) {
        if !sources.contains(&outcome.source()) {
            sources.push(outcome.source());
        }
    }
    sources
}

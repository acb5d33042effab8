//! Slot extraction: free text in, structured preference fields out.
//!
//! Every sub-extractor is a pure function of the utterance (plus the clock for
//! relative dates). Absence of a signal yields `None`; nothing here fails.

pub mod budget;
pub mod datetime;
pub mod location;
pub mod numbers;
pub mod preference;
pub mod service;
pub mod text;

pub use budget::{extract_budget, BudgetRange};
pub use datetime::{extract_time_signals, TimeSignals};
pub use location::RegionTable;
pub use preference::extract_provider_preference;
pub use service::{ServiceCatalog, ServiceIntent};

use crate::models::{Location, PreferenceRecord};
use chrono::NaiveDateTime;

/// Keyword tables the extractor works from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractorConfig {
    pub catalog: ServiceCatalog,
    pub regions: RegionTable,
}

#[derive(Debug, Clone, Default)]
pub struct SlotExtractor {
    config: ExtractorConfig,
}

impl SlotExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.config.catalog
    }

    pub fn regions(&self) -> &RegionTable {
        &self.config.regions
    }

    /// Fields found in this utterance alone
    pub fn extract_delta(
        &self,
        utterance: &str,
        prior: &PreferenceRecord,
        now: NaiveDateTime,
    ) -> PreferenceRecord {
        let budget = extract_budget(utterance).unwrap_or_default();
        let time = extract_time_signals(utterance, now);
        let pending = prior
            .location
            .as_ref()
            .filter(|l| matches!(l, Location::Ambiguous(_)));

        PreferenceRecord {
            service_type: self.config.catalog.detect(utterance).map(|i| i.service_type),
            budget_min: budget.min,
            budget_max: budget.max,
            time_urgency: time.urgency,
            preferred_date: time.date,
            preferred_time: time.time,
            time_constraint: time.constraint,
            location: self.config.regions.extract(utterance, pending),
            provider_preference: extract_provider_preference(utterance),
            special_notes: None,
        }
    }

    /// Merge this utterance's fields over `prior`; set fields are never cleared
    pub fn extract(&self, utterance: &str, prior: &PreferenceRecord, now: NaiveDateTime) -> PreferenceRecord {
        let delta = self.extract_delta(utterance, prior, now);
        prior.clone().merged(&delta)
    }
}

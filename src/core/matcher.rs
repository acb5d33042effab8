use crate::core::availability::{AvailabilityOutcome, AvailabilityResolver};
use crate::core::engine::EngineConfig;
use crate::core::extract::ServiceCatalog;
use crate::core::filters::{FilterOutcome, FilterPipeline, PipelineStage, StageCounts};
use crate::core::ranking::{RankedCandidate, RankingEngine};
use crate::models::{format_money, Coordinates, PreferenceRecord};
use crate::services::store::{ProviderStore, StoreError};
use chrono::NaiveDateTime;
use tracing::info;

/// Result of one matching phase
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Found {
        ranked: Vec<RankedCandidate>,
        /// Candidates with at least one free slot, before truncation
        total_found: usize,
        counts: StageCounts,
    },
    /// A stage left nothing; `Slots` means candidates existed but none had a free slot
    Empty {
        stage: PipelineStage,
        reason: String,
        counts: StageCounts,
    },
    /// The overall cap fired; nothing partial is reported
    TimedOut,
    /// A collaborator failed
    Unavailable { reason: String },
}

impl MatchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found { .. })
    }

    pub fn ranked(&self) -> &[RankedCandidate] {
        match self {
            MatchOutcome::Found { ranked, .. } => ranked,
            _ => &[],
        }
    }

    pub fn summary_text(&self) -> String {
        match self {
            MatchOutcome::Found { ranked, total_found, .. } => match ranked.first() {
                Some(top) => {
                    let candidate = &top.availability.candidate;
                    format!(
                        "Found {} {}. Top choice: {} (${}, {:.1} stars)",
                        total_found,
                        if *total_found == 1 { "match" } else { "matches" },
                        candidate.provider_name,
                        format_money(candidate.base_price),
                        candidate.rating
                    )
                }
                None => "No matches found.".to_string(),
            },
            MatchOutcome::Empty { stage, reason, .. } => format!("{}. {}", reason, stage.hint()),
            MatchOutcome::TimedOut => "Still searching, please try again in a moment.".to_string(),
            MatchOutcome::Unavailable { .. } => {
                "I couldn't reach our provider directory just now. Please try again shortly.".to_string()
            }
        }
    }
}

/// Matching phase: filter pipeline, then slot resolution, then ranking
///
/// # Pipeline Stages
/// 1. Service, location, budget, availability and quality filters
/// 2. Exact slot resolution for the shortlist
/// 3. Weighted ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    catalog: ServiceCatalog,
    filters: FilterPipeline,
    resolver: AvailabilityResolver,
    ranking: RankingEngine,
    shortlist_size: usize,
}

impl Matcher {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            catalog: config.extractor.catalog.clone(),
            filters: FilterPipeline::new(config.filters.clone()),
            resolver: AvailabilityResolver::new(config.availability.clone()),
            ranking: RankingEngine::new(config.ranking, config.max_results),
            shortlist_size: config.shortlist_size,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(&EngineConfig::default())
    }

    /// Run the whole matching phase for a ready record.
    ///
    /// `now` is the user's wall-clock time. Empty stages come back as `MatchOutcome::Empty`;
    /// only collaborator failures are errors.
    pub async fn find_matches(
        &self,
        store: &dyn ProviderStore,
        record: &PreferenceRecord,
        origin: Option<Coordinates>,
        max_distance_miles: Option<f64>,
        now: NaiveDateTime,
    ) -> Result<MatchOutcome, StoreError> {
        let filtered = self
            .filters
            .run(store, &self.catalog, record, origin, max_distance_miles, now.date())
            .await?;

        let (mut candidates, counts) = match filtered {
            FilterOutcome::Matched { candidates, counts } => (candidates, counts),
            FilterOutcome::Empty { stage, reason, counts } => {
                info!(stage = %stage, %reason, "Matching stopped at empty stage");
                return Ok(MatchOutcome::Empty { stage, reason, counts });
            }
        };
        info!(candidates = candidates.len(), ?counts, "Filter pipeline complete");

        candidates.truncate(self.shortlist_size);
        let resolved = match self.resolver.resolve(store, candidates, record, now).await? {
            AvailabilityOutcome::Available(resolved) => resolved,
            AvailabilityOutcome::NoAvailability { checked } => {
                info!(checked, "No candidate has a free slot");
                return Ok(MatchOutcome::Empty {
                    stage: PipelineStage::Slots,
                    reason: format!("Found {} providers, but none have availability", checked),
                    counts,
                });
            }
        };

        let total_found = resolved.len();
        let ranked = self.ranking.rank(resolved, record);
        info!(total_found, returned = ranked.len(), "Ranking complete");

        Ok(MatchOutcome::Found {
            ranked,
            total_found,
            counts,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_config()
    }
}

use crate::core::availability::AvailabilityConfig;
use crate::core::extract::ExtractorConfig;
use crate::core::filters::FilterConfig;
use crate::core::validation::ValidationRules;
use crate::models::RankingWeights;
use std::time::Duration;

/// Every tunable of the pipeline, handed to components at construction
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub extractor: ExtractorConfig,
    pub filters: FilterConfig,
    pub availability: AvailabilityConfig,
    pub ranking: RankingWeights,
    pub validation: ValidationRules,
    /// Ranked results returned to the caller
    pub max_results: usize,
    /// Filtered candidates passed on to slot resolution
    pub shortlist_size: usize,
    /// Cap on the whole matching phase
    pub match_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            filters: FilterConfig::default(),
            availability: AvailabilityConfig::default(),
            ranking: RankingWeights::default(),
            validation: ValidationRules::default(),
            max_results: 10,
            shortlist_size: 10,
            match_timeout: Duration::from_secs(60),
        }
    }
}

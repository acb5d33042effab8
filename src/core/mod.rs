// Core pipeline exports
pub mod availability;
pub mod distance;
pub mod engine;
pub mod extract;
pub mod filters;
pub mod matcher;
pub mod orchestrator;
pub mod ranking;
pub mod readiness;
pub mod scoring;
pub mod validation;

pub use availability::{AvailabilityConfig, AvailabilityOutcome, AvailabilityResolver, CandidateAvailability};
pub use distance::{distance_between, haversine_miles};
pub use engine::EngineConfig;
pub use extract::{ExtractorConfig, SlotExtractor};
pub use filters::{FilterConfig, FilterOutcome, FilterPipeline, PipelineStage, StageCounts};
pub use matcher::{MatchOutcome, Matcher};
pub use orchestrator::{GatherOutcome, Orchestrator, TurnInput, TurnOutcome};
pub use ranking::{RankedCandidate, RankingEngine};
pub use readiness::{evaluate, MissingField, Readiness};
pub use scoring::{calculate_match_score, component_scores, ComponentScores};
pub use validation::{ValidationRules, ValidationViolation};

/// Round to two decimal places
#[inline]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

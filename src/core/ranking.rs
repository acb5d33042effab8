use crate::core::availability::CandidateAvailability;
use crate::core::round2;
use crate::core::scoring::{component_scores, ComponentScores};
use crate::models::{PreferenceRecord, RankingWeights};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub availability: CandidateAvailability,
    pub scores: ComponentScores,
    #[serde(rename = "overallScore")]
    pub overall_score: f64,
    pub explanation: String,
}

/// Final weighted ordering of available candidates
#[derive(Debug, Clone)]
pub struct RankingEngine {
    weights: RankingWeights,
    max_results: usize,
}

impl RankingEngine {
    pub fn new(weights: RankingWeights, max_results: usize) -> Self {
        Self { weights, max_results }
    }

    pub fn with_default_weights() -> Self {
        Self::new(RankingWeights::default(), 10)
    }

    /// Qualifiers in fixed order, `Good match` when none apply
    pub fn explain(&self, availability: &CandidateAvailability, scores: &ComponentScores) -> String {
        let mut parts = Vec::new();
        if availability.candidate.rating >= self.weights.top_rated_threshold {
            parts.push("Top-rated");
        }
        if scores.price >= 1.0 {
            parts.push("Within budget");
        }
        if availability.slot_count > 0 {
            parts.push("Available");
        }

        if parts.is_empty() {
            "Good match".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Score, sort descending (ties keep input order) and keep the top `max_results`
    pub fn rank(&self, resolved: Vec<CandidateAvailability>, record: &PreferenceRecord) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = resolved
            .into_iter()
            .map(|availability| {
                let scores = component_scores(
                    &availability.candidate,
                    availability.slot_count,
                    record.budget_max,
                    &self.weights,
                );
                let overall_score = round2(scores.overall(&self.weights));
                let explanation = self.explain(&availability, &scores);
                RankedCandidate {
                    rank: 0,
                    availability,
                    scores,
                    overall_score,
                    explanation,
                }
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.max_results);

        for (index, candidate) in ranked.iter_mut().enumerate() {
            candidate.rank = index + 1;
        }
        ranked
    }
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

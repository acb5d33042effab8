use crate::core::filters::StageCounts;
use crate::core::matcher::MatchOutcome;
use crate::core::orchestrator::{GatherOutcome, TurnOutcome};
use crate::core::ranking::RankedCandidate;
use crate::core::availability::AlternativeSlot;
use crate::models::domain::ConversationState;
use serde::{Deserialize, Serialize};

/// Available times shown per ranked option
const DISPLAYED_TIMES: usize = 5;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

pub type GatherResponse = GatherOutcome;

/// One ranked provider as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedOption {
    pub rank: usize,
    #[serde(rename = "merchantId")]
    pub merchant_id: String,
    #[serde(rename = "serviceId")]
    pub service_id: String,
    pub name: String,
    #[serde(rename = "serviceName")]
    pub service_name: String,
    pub price: f64,
    pub rating: f64,
    #[serde(rename = "reviewCount")]
    pub review_count: u32,
    #[serde(rename = "distanceMiles")]
    pub distance_miles: Option<f64>,
    #[serde(rename = "availableTimes")]
    pub available_times: Vec<String>,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: f64,
    pub explanation: String,
    pub alternatives: Vec<AlternativeSlot>,
    #[serde(rename = "workingHours")]
    pub working_hours: String,
    pub timezone: String,
}

impl From<&RankedCandidate> for RankedOption {
    fn from(ranked: &RankedCandidate) -> Self {
        let availability = &ranked.availability;
        let candidate = &availability.candidate;
        Self {
            rank: ranked.rank,
            merchant_id: candidate.provider_id.clone(),
            service_id: candidate.service_id.clone(),
            name: candidate.provider_name.clone(),
            service_name: candidate.service_name.clone(),
            price: candidate.base_price,
            rating: candidate.rating,
            review_count: candidate.review_count,
            distance_miles: candidate.distance_miles,
            available_times: availability
                .slots
                .iter()
                .take(DISPLAYED_TIMES)
                .map(|s| s.display())
                .collect(),
            relevance_score: ranked.overall_score / 100.0,
            explanation: ranked.explanation.clone(),
            alternatives: availability.alternatives.clone(),
            working_hours: availability.working_hours.clone(),
            timezone: availability.timezone.clone(),
        }
    }
}

/// Matching phase result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    /// `found`, `empty`, `timed_out` or `unavailable`
    pub status: String,
    #[serde(rename = "rankedCandidates")]
    pub ranked_candidates: Vec<RankedOption>,
    #[serde(rename = "totalFound")]
    pub total_found: usize,
    #[serde(rename = "summaryText")]
    pub summary_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(rename = "stageCounts", skip_serializing_if = "Option::is_none")]
    pub stage_counts: Option<StageCounts>,
}

impl From<&MatchOutcome> for MatchResponse {
    fn from(outcome: &MatchOutcome) -> Self {
        let summary_text = outcome.summary_text();
        let ranked_candidates = outcome.ranked().iter().map(RankedOption::from).collect();

        let (status, total_found, stage, stage_counts) = match outcome {
            MatchOutcome::Found { total_found, counts, .. } => ("found", *total_found, None, Some(counts.clone())),
            MatchOutcome::Empty { stage, counts, .. } => {
                ("empty", 0, Some(stage.as_str().to_string()), Some(counts.clone()))
            }
            MatchOutcome::TimedOut => ("timed_out", 0, None, None),
            MatchOutcome::Unavailable { .. } => ("unavailable", 0, None, None),
        };

        Self {
            status: status.to_string(),
            ranked_candidates,
            total_found,
            summary_text,
            stage,
            stage_counts,
        }
    }
}

impl From<MatchOutcome> for MatchResponse {
    fn from(outcome: MatchOutcome) -> Self {
        Self::from(&outcome)
    }
}

/// One stateful turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub state: ConversationState,
    #[serde(rename = "responseText")]
    pub response_text: String,
    pub gather: GatherOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<MatchResponse>,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            matches: outcome.matches.as_ref().map(MatchResponse::from),
            session_id: outcome.session_id,
            state: outcome.state,
            response_text: outcome.response_text,
            gather: outcome.gather,
        }
    }
}

pub type ResetResponse = TurnResponse;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::PipelineStage;

    #[test]
    fn test_empty_outcome_response() {
        let outcome = MatchOutcome::Empty {
            stage: PipelineStage::Budget,
            reason: "No services found within budget up to $20".to_string(),
            counts: StageCounts {
                service: 3,
                budget: 0,
                ..Default::default()
            },
        };
        let response = MatchResponse::from(&outcome);
        assert_eq!(response.status, "empty");
        assert_eq!(response.stage.as_deref(), Some("budget"));
        assert!(response.ranked_candidates.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["stageCounts"]["service"], 3);
    }

    #[test]
    fn test_timed_out_response_omits_stage() {
        let response = MatchResponse::from(MatchOutcome::TimedOut);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "timed_out");
        assert!(json.get("stage").is_none());
    }
}

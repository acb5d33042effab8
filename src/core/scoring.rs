use crate::core::round2;
use crate::models::{Candidate, RankingWeights, ScoringWeights};
use serde::{Deserialize, Serialize};

/// Filter-stage match score (0-100) for a candidate that survived every stage
///
/// Scoring formula (points):
/// score = (
///     rating / 5 * 40 +                     # merchant rating
///     max(0, 1 - distance / 10) * 30 +      # closer = higher, neutral 15 when unknown
///     availability_score * 20 +             # neutral 0.5 when the stage was skipped
///     verified * 10
/// )
pub fn calculate_match_score(candidate: &Candidate, weights: &ScoringWeights) -> f64 {
    let rating_points = (candidate.rating / 5.0).clamp(0.0, 1.0) * weights.rating;

    let distance_points = match candidate.distance_miles {
        Some(distance) => distance_fraction(distance, weights.distance_horizon_miles) * weights.distance,
        None => weights.distance / 2.0,
    };

    let availability_points = candidate
        .availability_score
        .unwrap_or(weights.neutral_availability)
        * weights.availability;

    let verified_points = if candidate.is_verified { weights.verified } else { 0.0 };

    round2((rating_points + distance_points + availability_points + verified_points).clamp(0.0, 100.0))
}

/// Linear decay from 1 at zero distance to 0 at the horizon
#[inline]
fn distance_fraction(distance_miles: f64, horizon_miles: f64) -> f64 {
    if horizon_miles <= 0.0 {
        return 0.0;
    }
    (1.0 - distance_miles / horizon_miles).max(0.0)
}

/// Ranking component scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub rating: f64,
    pub price: f64,
    pub availability: f64,
    pub distance: f64,
}

impl ComponentScores {
    /// Weighted blend scaled to 0-100
    pub fn overall(&self, weights: &RankingWeights) -> f64 {
        100.0
            * (weights.rating * self.rating
                + weights.price * self.price
                + weights.availability * self.availability
                + weights.distance * self.distance)
    }
}

/// Component scores for the ranking stage.
///
/// Price fit is binary against the raw `budget_max`; the filter's flexibility does not apply here.
/// Without an upper bound every price fits.
pub fn component_scores(
    candidate: &Candidate,
    slot_count: usize,
    budget_max: Option<f64>,
    weights: &RankingWeights,
) -> ComponentScores {
    let rating = (candidate.rating / 5.0).clamp(0.0, 1.0);
    let price = match budget_max {
        Some(max) if candidate.base_price > max => 0.0,
        _ => 1.0,
    };
    let availability = if weights.full_availability_slots > 0.0 {
        (slot_count as f64 / weights.full_availability_slots).min(1.0)
    } else {
        1.0
    };
    let distance = candidate
        .distance_miles
        .map(|d| distance_fraction(d, weights.distance_horizon_miles))
        .unwrap_or(0.5);

    ComponentScores {
        rating,
        price,
        availability,
        distance,
    }
}

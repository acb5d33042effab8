use crate::core::distance::distance_between;
use crate::core::extract::ServiceCatalog;
use crate::core::round2;
use crate::core::scoring::calculate_match_score;
use crate::models::{Candidate, Coordinates, DateWindow, PreferenceRecord, ProviderStatus, ScoringWeights};
use crate::services::store::{ProviderStore, ServiceQuery, StoreError};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Thresholds of the candidate filter stages
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub max_distance_miles: f64,
    /// Fraction each budget bound is widened by
    pub budget_flexibility: f64,
    pub min_rating: f64,
    /// Workday capacity used by the coarse availability check
    pub bookings_per_day: u32,
    /// Length of the window opened by an `after` constraint
    pub after_window_days: i64,
    /// Booking lookups in flight at once
    pub lookup_concurrency: usize,
    pub weights: ScoringWeights,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_distance_miles: 10.0,
            budget_flexibility: 0.10,
            min_rating: 4.0,
            bookings_per_day: 8,
            after_window_days: 7,
            lookup_concurrency: 8,
            weights: ScoringWeights::default(),
        }
    }
}

/// Stage of the matching pipeline that can run out of candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Service,
    Location,
    Budget,
    Availability,
    Quality,
    /// Exact slot resolution after filtering
    Slots,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Service => "service",
            PipelineStage::Location => "location",
            PipelineStage::Budget => "budget",
            PipelineStage::Availability => "availability",
            PipelineStage::Quality => "quality",
            PipelineStage::Slots => "slots",
        }
    }

    /// Actionable follow-up suggestion for an empty result at this stage
    pub fn hint(&self) -> &'static str {
        match self {
            PipelineStage::Service => "Try describing the service differently.",
            PipelineStage::Location => "Try a larger search radius.",
            PipelineStage::Budget => "Try a different budget.",
            PipelineStage::Availability => "Try a different day or flexible timing.",
            PipelineStage::Quality => "Try a different area or service.",
            PipelineStage::Slots => "Try selecting flexible timing.",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Survivors after each stage; skipped stages stay `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub service: usize,
    pub location: Option<usize>,
    pub budget: usize,
    pub availability: Option<usize>,
    pub quality: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Matched {
        candidates: Vec<Candidate>,
        counts: StageCounts,
    },
    Empty {
        stage: PipelineStage,
        reason: String,
        counts: StageCounts,
    },
}

/// Provider ids split by the quality rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatusReport {
    pub valid: Vec<String>,
    pub invalid: Vec<InvalidProvider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidProvider {
    #[serde(rename = "providerId")]
    pub provider_id: String,
    pub reasons: Vec<String>,
}

/// Case-insensitive substring match of any keyword against name or category
///
/// Stage 1 of the filter pipeline.
#[inline]
pub fn matches_service(candidate: &Candidate, keywords: &[String]) -> bool {
    let name = candidate.service_name.to_lowercase();
    let category = candidate.category.to_lowercase();
    keywords
        .iter()
        .any(|k| name.contains(k.as_str()) || category.contains(k.as_str()))
}

/// Keep candidates within `max_miles` of `origin`, nearest first.
///
/// Stage 2. Candidates without coordinates cannot be placed and are dropped.
pub fn filter_by_distance(candidates: Vec<Candidate>, origin: Coordinates, max_miles: f64) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter_map(|mut candidate| {
            let distance = distance_between(origin, candidate.coordinates()?);
            if distance <= max_miles {
                candidate.distance_miles = Some(round2(distance));
                Some(candidate)
            } else {
                None
            }
        })
        .collect();

    kept.sort_by(|a, b| {
        a.distance_miles
            .partial_cmp(&b.distance_miles)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    kept
}

/// Budget bounds widened by `flexibility`; unset bounds become 0 and infinity
#[inline]
pub fn flexible_budget(min: Option<f64>, max: Option<f64>, flexibility: f64) -> (f64, f64) {
    let low = min.map(|m| m * (1.0 - flexibility)).unwrap_or(0.0);
    let high = max.map(|m| m * (1.0 + flexibility)).unwrap_or(f64::INFINITY);
    (low, high)
}

const PRICE_TOLERANCE: f64 = 1e-9;

/// Stage 3. Keep candidates priced inside the widened budget, cheapest first.
pub fn filter_by_budget(candidates: Vec<Candidate>, min: Option<f64>, max: Option<f64>, flexibility: f64) -> Vec<Candidate> {
    let (low, high) = flexible_budget(min, max, flexibility);
    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.base_price >= low - PRICE_TOLERANCE && c.base_price <= high + PRICE_TOLERANCE)
        .collect();

    kept.sort_by(|a, b| {
        a.base_price
            .partial_cmp(&b.base_price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    kept
}

/// Share of remaining capacity in the window, or `None` when the provider is full
#[inline]
pub fn availability_score(bookings: usize, days: i64, bookings_per_day: u32) -> Option<f64> {
    let capacity = days.max(1) as f64 * bookings_per_day as f64;
    let booked = bookings as f64;
    if booked >= capacity {
        None
    } else {
        Some(1.0 - booked / capacity)
    }
}

/// Split providers into those passing the verification and rating rules and those failing
pub fn classify_providers(provider_ids: &[String], statuses: &[ProviderStatus], min_rating: f64) -> ProviderStatusReport {
    let by_id: HashMap<&str, &ProviderStatus> = statuses
        .iter()
        .map(|s| (s.provider_id.as_str(), s))
        .collect();

    let mut report = ProviderStatusReport::default();
    for id in provider_ids {
        let mut reasons = Vec::new();
        match by_id.get(id.as_str()) {
            None => reasons.push("Provider not found".to_string()),
            Some(status) => {
                if !status.is_verified {
                    reasons.push("Provider not verified".to_string());
                }
                if status.rating < min_rating {
                    reasons.push(format!("Rating {:.1} below minimum {:.1}", status.rating, min_rating));
                }
            }
        }

        if reasons.is_empty() {
            report.valid.push(id.clone());
        } else {
            report.invalid.push(InvalidProvider {
                provider_id: id.clone(),
                reasons,
            });
        }
    }
    report
}

/// Build the store query for the service stage
pub fn service_query(service_type: &str, record: &PreferenceRecord, catalog: &ServiceCatalog) -> ServiceQuery {
    ServiceQuery {
        service_type: service_type.to_string(),
        keywords: catalog.filter_keywords(service_type),
        cities: record
            .location
            .as_ref()
            .map(|l| l.cities())
            .unwrap_or_default(),
    }
}

fn unique_providers(candidates: &[Candidate]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| seen.insert(c.provider_id.as_str()))
        .map(|c| c.provider_id.clone())
        .collect()
}

/// Five-stage candidate filter: service, location, budget, availability, quality
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    config: FilterConfig,
}

impl FilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run every stage in order, stopping at the first stage that leaves nothing.
    ///
    /// Only store failures are errors; empty stages are reported through `FilterOutcome::Empty`.
    pub async fn run(
        &self,
        store: &dyn ProviderStore,
        catalog: &ServiceCatalog,
        record: &PreferenceRecord,
        origin: Option<Coordinates>,
        max_distance_miles: Option<f64>,
        today: NaiveDate,
    ) -> Result<FilterOutcome, StoreError> {
        let mut counts = StageCounts::default();

        // Stage 1: service type
        let Some(service_type) = record.service_type.as_deref() else {
            return Ok(FilterOutcome::Empty {
                stage: PipelineStage::Service,
                reason: "No service type specified".to_string(),
                counts,
            });
        };
        let query = service_query(service_type, record, catalog);
        let candidates: Vec<Candidate> = store
            .find_services_by_type(&query)
            .await?
            .into_iter()
            .filter(|c| matches_service(c, &query.keywords))
            .collect();
        counts.service = candidates.len();
        debug!(stage = "service", count = counts.service, "Filter stage complete");
        if candidates.is_empty() {
            return Ok(FilterOutcome::Empty {
                stage: PipelineStage::Service,
                reason: format!("No services found matching '{}'", service_type),
                counts,
            });
        }

        // Stage 2: distance, only with precise coordinates
        let candidates = match origin {
            Some(origin) => {
                let max_miles = max_distance_miles.unwrap_or(self.config.max_distance_miles);
                let kept = filter_by_distance(candidates, origin, max_miles);
                counts.location = Some(kept.len());
                debug!(stage = "location", count = kept.len(), max_miles, "Filter stage complete");
                if kept.is_empty() {
                    return Ok(FilterOutcome::Empty {
                        stage: PipelineStage::Location,
                        reason: format!("No providers found within {} miles", max_miles),
                        counts,
                    });
                }
                kept
            }
            None => candidates,
        };

        // Stage 3: budget with flexibility
        let candidates = filter_by_budget(
            candidates,
            record.budget_min,
            record.budget_max,
            self.config.budget_flexibility,
        );
        counts.budget = candidates.len();
        debug!(stage = "budget", count = counts.budget, "Filter stage complete");
        if candidates.is_empty() {
            return Ok(FilterOutcome::Empty {
                stage: PipelineStage::Budget,
                reason: format!(
                    "No services found within budget {}",
                    record.budget_label().unwrap_or_default()
                ),
                counts,
            });
        }

        // Stage 4: coarse availability, skipped for flexible timing
        let candidates = match DateWindow::for_preferences(record, today, self.config.after_window_days) {
            Some(window) => {
                let kept = self.filter_by_capacity(store, candidates, window).await?;
                counts.availability = Some(kept.len());
                debug!(stage = "availability", count = kept.len(), days = window.num_days(), "Filter stage complete");
                if kept.is_empty() {
                    return Ok(FilterOutcome::Empty {
                        stage: PipelineStage::Availability,
                        reason: format!(
                            "No providers available for {}",
                            record.timing_label().unwrap_or_else(|| "that time".to_string())
                        ),
                        counts,
                    });
                }
                kept
            }
            None => candidates,
        };

        // Stage 5: verification and rating from fresh provider status
        let provider_ids = unique_providers(&candidates);
        let statuses = store.get_provider_status(&provider_ids).await?;
        let report = classify_providers(&provider_ids, &statuses, self.config.min_rating);
        for invalid in &report.invalid {
            debug!(provider_id = %invalid.provider_id, reasons = ?invalid.reasons, "Provider rejected by quality filter");
        }
        let valid: HashSet<&str> = report.valid.iter().map(String::as_str).collect();
        let fresh: HashMap<&str, &ProviderStatus> = statuses.iter().map(|s| (s.provider_id.as_str(), s)).collect();

        let mut candidates: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| valid.contains(c.provider_id.as_str()))
            .map(|mut c| {
                if let Some(status) = fresh.get(c.provider_id.as_str()) {
                    c.rating = status.rating;
                    c.review_count = status.review_count;
                    c.is_verified = status.is_verified;
                }
                c
            })
            .collect();
        counts.quality = candidates.len();
        debug!(stage = "quality", count = counts.quality, "Filter stage complete");
        if candidates.is_empty() {
            return Ok(FilterOutcome::Empty {
                stage: PipelineStage::Quality,
                reason: "No verified, high-quality providers found".to_string(),
                counts,
            });
        }

        for candidate in candidates.iter_mut() {
            candidate.match_score = Some(calculate_match_score(candidate, &self.config.weights));
        }
        candidates.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(FilterOutcome::Matched { candidates, counts })
    }

    /// Stage 4 body: count calendar-blocking bookings per provider against workday capacity
    async fn filter_by_capacity(
        &self,
        store: &dyn ProviderStore,
        candidates: Vec<Candidate>,
        window: DateWindow,
    ) -> Result<Vec<Candidate>, StoreError> {
        let lookups = stream::iter(unique_providers(&candidates))
            .map(|provider_id| async move {
                let bookings = store.get_bookings(&provider_id, window).await;
                (provider_id, bookings)
            })
            .buffer_unordered(self.config.lookup_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut booked: HashMap<String, usize> = HashMap::with_capacity(lookups.len());
        for (provider_id, bookings) in lookups {
            let count = bookings?
                .iter()
                .filter(|b| b.status.blocks_calendar() && window.contains(b.date))
                .count();
            booked.insert(provider_id, count);
        }

        let mut kept: Vec<Candidate> = candidates
            .into_iter()
            .filter_map(|mut candidate| {
                let bookings = booked.get(&candidate.provider_id).copied().unwrap_or(0);
                let score = availability_score(bookings, window.num_days(), self.config.bookings_per_day)?;
                candidate.availability_score = Some(round2(score));
                Some(candidate)
            })
            .collect();

        kept.sort_by(|a, b| {
            b.availability_score
                .partial_cmp(&a.availability_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(kept)
    }
}

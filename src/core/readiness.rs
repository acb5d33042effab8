use crate::core::extract::RegionTable;
use crate::models::{Location, PreferenceRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A required preference that still blocks matching.
///
/// Variants are declared in asking order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum MissingField {
    ServiceType,
    Budget,
    TimeInfo,
    Location,
    /// City needs disambiguation before it can be served
    LocationAmbiguous(String),
    /// Place is outside every served region
    LocationUnsupported(String),
}

impl MissingField {
    pub fn key(&self) -> &'static str {
        match self {
            MissingField::ServiceType => "service_type",
            MissingField::Budget => "budget",
            MissingField::TimeInfo => "time_info",
            MissingField::Location => "location",
            MissingField::LocationAmbiguous(_) => "location_ambiguous",
            MissingField::LocationUnsupported(_) => "location_unsupported",
        }
    }

    /// Fixed clarifying question for this field
    pub fn question(&self, regions: &RegionTable) -> String {
        let served = regions.served_label();
        match self {
            MissingField::ServiceType => "What service are you looking for?".to_string(),
            MissingField::Budget => "What's your budget for this service?".to_string(),
            MissingField::TimeInfo => "When do you need this?".to_string(),
            MissingField::Location => format!(
                "Where would you like to get this done? We're currently serving {}.",
                served
            ),
            MissingField::LocationAmbiguous(city) => {
                let option = regions
                    .clarification_for(city)
                    .map(str::to_string)
                    .unwrap_or_else(|| city.clone());
                format!(
                    "Did you mean {} or somewhere else? We're currently serving {}.",
                    option, served
                )
            }
            MissingField::LocationUnsupported(place) => format!(
                "Sorry, we don't serve {} yet. We're currently serving {}. Is there a spot in one of those areas that works?",
                place, served
            ),
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Outcome of a readiness check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    #[serde(rename = "missingFields")]
    pub missing_fields: Vec<MissingField>,
    /// Share of the four required fields already answered
    pub completeness: f64,
}

impl Readiness {
    pub fn next_field(&self) -> Option<&MissingField> {
        self.missing_fields.first()
    }
}

const REQUIRED_FIELDS: f64 = 4.0;

/// Check the record against the required fields in asking order
pub fn evaluate(record: &PreferenceRecord) -> Readiness {
    let mut missing = Vec::new();

    if record.service_type.is_none() {
        missing.push(MissingField::ServiceType);
    }
    if !record.has_budget() {
        missing.push(MissingField::Budget);
    }
    if !record.has_time_info() {
        missing.push(MissingField::TimeInfo);
    }
    match &record.location {
        None => missing.push(MissingField::Location),
        Some(Location::Ambiguous(city)) => missing.push(MissingField::LocationAmbiguous(city.clone())),
        Some(Location::Unsupported(place)) => {
            missing.push(MissingField::LocationUnsupported(place.clone()))
        }
        Some(Location::Resolved(_)) => {}
    }

    let completeness = (REQUIRED_FIELDS - missing.len() as f64) / REQUIRED_FIELDS;

    Readiness {
        ready: missing.is_empty(),
        missing_fields: missing,
        completeness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeUrgency;

    #[test]
    fn test_empty_record_asks_for_service_first() {
        let readiness = evaluate(&PreferenceRecord::default());
        assert!(!readiness.ready);
        assert_eq!(readiness.missing_fields.len(), 4);
        assert_eq!(readiness.next_field(), Some(&MissingField::ServiceType));
        assert_eq!(readiness.completeness, 0.0);
    }

    #[test]
    fn test_any_time_signal_suffices() {
        let record = PreferenceRecord {
            service_type: Some("nails".to_string()),
            budget_min: Some(50.0),
            time_constraint: Some(crate::models::TimeConstraint::Before),
            location: Some(Location::Resolved("New York, NY".to_string())),
            ..Default::default()
        };
        assert!(evaluate(&record).ready);
    }

    #[test]
    fn test_ambiguous_location_is_distinguished() {
        let record = PreferenceRecord {
            service_type: Some("haircut".to_string()),
            budget_max: Some(60.0),
            time_urgency: Some(TimeUrgency::Today),
            location: Some(Location::Ambiguous("cambridge".to_string())),
            ..Default::default()
        };

        let readiness = evaluate(&record);
        assert!(!readiness.ready);
        assert_eq!(
            readiness.next_field(),
            Some(&MissingField::LocationAmbiguous("cambridge".to_string()))
        );

        let question = readiness.next_field().unwrap().question(&RegionTable::default());
        assert!(question.starts_with("Did you mean Cambridge, Massachusetts"));
        assert_ne!(question, MissingField::Location.question(&RegionTable::default()));
    }

    #[test]
    fn test_provider_preference_never_blocks() {
        let record = PreferenceRecord {
            service_type: Some("massage".to_string()),
            budget_max: Some(120.0),
            time_urgency: Some(TimeUrgency::Flexible),
            location: Some(Location::Resolved("Boston, MA".to_string())),
            provider_preference: None,
            ..Default::default()
        };
        let readiness = evaluate(&record);
        assert!(readiness.ready);
        assert_eq!(readiness.completeness, 1.0);
    }
}

use super::text::Keywords;
use serde::{Deserialize, Serialize};

/// Confidence multiplier for partial keyword hits
const PARTIAL_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub name: String,
    /// Keywords that name the service outright
    pub exact: Vec<String>,
    /// Keywords that only hint at it
    pub partial: Vec<String>,
    /// Synonyms used to match provider service names and categories
    pub filter_keywords: Vec<String>,
}

/// Detected service type with its confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceIntent {
    pub service_type: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub categories: Vec<ServiceCategory>,
}

fn category(name: &str, exact: &[&str], partial: &[&str], filter_keywords: &[&str]) -> ServiceCategory {
    let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    ServiceCategory {
        name: name.to_string(),
        exact: owned(exact),
        partial: owned(partial),
        filter_keywords: owned(filter_keywords),
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self {
            categories: vec![
                category(
                    "haircut",
                    &["haircut", "hair cut", "haircuts", "trim", "barber", "hairstylist", "hair stylist"],
                    &["hair", "cut", "style", "styling", "blowout", "bangs", "fade"],
                    &["haircut", "cut", "trim", "style", "barber", "stylist", "hair"],
                ),
                category(
                    "nails",
                    &["nails", "nail", "manicure", "pedicure", "mani pedi"],
                    &["mani", "pedi", "gel", "acrylic", "polish", "nail art"],
                    &["nail", "manicure", "pedicure", "mani", "pedi"],
                ),
                category(
                    "massage",
                    &["massage", "massages", "masseuse"],
                    &["deep tissue", "swedish", "hot stone", "back rub", "rub", "knots", "sore"],
                    &["massage", "deep tissue", "swedish", "hot stone", "body work", "bodywork"],
                ),
                category(
                    "spa",
                    &["spa", "spa day"],
                    &["relaxation", "relax", "pamper", "sauna", "treatment"],
                    &["spa", "relaxation", "treatment"],
                ),
                category(
                    "facial",
                    &["facial", "facials"],
                    &["skincare", "skin care", "face", "peel"],
                    &["facial", "skincare", "skin care", "face"],
                ),
                category(
                    "waxing",
                    &["waxing", "wax"],
                    &["hair removal", "brazilian", "threading", "eyebrows"],
                    &["wax", "hair removal", "brazilian"],
                ),
                category(
                    "makeup",
                    &["makeup", "make up"],
                    &["glam", "cosmetics", "bridal", "lashes"],
                    &["makeup", "cosmetic", "beauty", "glam"],
                ),
                category(
                    "cleaning",
                    &["cleaning", "house cleaning", "maid", "housekeeping", "cleaner"],
                    &["clean", "tidy", "deep clean"],
                    &["clean", "maid", "housekeeping"],
                ),
            ],
        }
    }
}

impl ServiceCatalog {
    /// Detect the requested service. An exact keyword wins immediately; otherwise
    /// the longest partial keyword wins, earlier categories breaking ties.
    pub fn detect(&self, utterance: &str) -> Option<ServiceIntent> {
        let keywords = Keywords::new(utterance);

        for category in &self.categories {
            if keywords.has_any(&category.exact) {
                return Some(ServiceIntent {
                    service_type: category.name.clone(),
                    confidence: 1.0,
                });
            }
        }

        let mut best: Option<(&ServiceCategory, usize)> = None;
        for category in &self.categories {
            let longest = category
                .partial
                .iter()
                .filter(|k| keywords.has(k))
                .map(|k| k.len())
                .max();
            if let Some(length) = longest {
                if best.map_or(true, |(_, current)| length > current) {
                    best = Some((category, length));
                }
            }
        }

        best.map(|(category, _)| ServiceIntent {
            service_type: category.name.clone(),
            confidence: PARTIAL_CONFIDENCE,
        })
    }

    pub fn is_known(&self, service_type: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(service_type))
    }

    /// Lowercase synonyms for matching provider data; unknown types match themselves
    pub fn filter_keywords(&self, service_type: &str) -> Vec<String> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(service_type))
            .map(|c| c.filter_keywords.iter().map(|k| k.to_lowercase()).collect())
            .unwrap_or_else(|| vec![service_type.to_lowercase()])
    }
}

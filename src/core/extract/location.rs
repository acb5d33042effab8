use super::text::Keywords;
use crate::models::Location;
use serde::{Deserialize, Serialize};

/// A served city and the keywords (neighborhoods, nicknames) that point at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedCity {
    pub canonical: String,
    pub keywords: Vec<String>,
}

/// Named place (station, landmark, square) with its canonical `"Place, City, ST"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmark {
    pub keyword: String,
    pub canonical: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedRegion {
    pub name: String,
    /// How the region is named in questions, e.g. `Boston, Cambridge (MA)`
    pub display_name: String,
    /// Words that place the user in this region's state
    pub state_keywords: Vec<String>,
    pub default_city: String,
    pub cities: Vec<ServedCity>,
    pub landmarks: Vec<Landmark>,
}

/// City name that needs context before it can be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousCity {
    pub name: String,
    pub region: String,
    pub resolves_to: String,
    /// Wording used when asking the user to confirm
    pub clarification: String,
}

/// Keyword tables for every served region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTable {
    pub regions: Vec<ServedRegion>,
    pub ambiguous: Vec<AmbiguousCity>,
    /// Places that are clearly outside the served regions
    pub unserved: Vec<String>,
    pub anywhere_phrases: Vec<String>,
    pub anywhere_default: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn landmarks(items: &[(&str, &str)]) -> Vec<Landmark> {
    items
        .iter()
        .map(|(keyword, canonical)| Landmark {
            keyword: keyword.to_string(),
            canonical: canonical.to_string(),
        })
        .collect()
}

impl Default for RegionTable {
    fn default() -> Self {
        let boston = ServedRegion {
            name: "boston".to_string(),
            display_name: "Boston, Cambridge (MA)".to_string(),
            state_keywords: strings(&["ma", "mass", "massachusetts"]),
            default_city: "Boston, MA".to_string(),
            cities: vec![
                ServedCity {
                    canonical: "Boston, MA".to_string(),
                    keywords: strings(&[
                        "boston", "back bay", "south end", "north end", "beacon hill", "fenway",
                        "jamaica plain", "dorchester", "south boston", "southie", "charlestown",
                        "allston", "brighton", "roxbury", "seaport", "financial district",
                        "chinatown", "west end", "east boston", "brookline", "newton",
                    ]),
                },
                ServedCity {
                    canonical: "Cambridge, MA".to_string(),
                    keywords: strings(&[
                        "cambridge ma", "cambridge mass", "cambridge massachusetts", "inman square",
                        "east cambridge", "cambridgeport", "mit",
                    ]),
                },
                ServedCity {
                    canonical: "Somerville, MA".to_string(),
                    keywords: strings(&["somerville", "assembly row"]),
                },
            ],
            landmarks: landmarks(&[
                ("mit station", "MIT station, Cambridge, MA"),
                ("kendall square", "Kendall Square, Cambridge, MA"),
                ("kendall", "Kendall Square, Cambridge, MA"),
                ("harvard square", "Harvard Square, Cambridge, MA"),
                ("harvard", "Harvard Square, Cambridge, MA"),
                ("central square", "Central Square, Cambridge, MA"),
                ("porter square", "Porter Square, Cambridge, MA"),
                ("porter", "Porter Square, Cambridge, MA"),
                ("davis square", "Davis Square, Somerville, MA"),
                ("davis", "Davis Square, Somerville, MA"),
                ("park street", "Park Street, Boston, MA"),
                ("downtown crossing", "Downtown Crossing, Boston, MA"),
                ("south station", "South Station, Boston, MA"),
                ("north station", "North Station, Boston, MA"),
                ("back bay station", "Back Bay Station, Boston, MA"),
                ("copley square", "Copley Square, Boston, MA"),
                ("copley", "Copley Square, Boston, MA"),
                ("prudential center", "Prudential Center, Boston, MA"),
                ("prudential", "Prudential Center, Boston, MA"),
                ("fenway park", "Fenway Park, Boston, MA"),
                ("newbury street", "Newbury Street, Boston, MA"),
            ]),
        };

        let new_york = ServedRegion {
            name: "new_york".to_string(),
            display_name: "New York City".to_string(),
            state_keywords: strings(&["ny", "new york state"]),
            default_city: "New York, NY".to_string(),
            cities: vec![ServedCity {
                canonical: "New York, NY".to_string(),
                keywords: strings(&[
                    "new york", "new york city", "nyc", "manhattan", "brooklyn", "queens", "bronx",
                    "staten island", "harlem", "soho", "tribeca", "chelsea", "midtown",
                    "upper east side", "upper west side", "east village", "west village",
                    "greenwich village", "lower east side", "williamsburg", "astoria",
                ]),
            }],
            landmarks: landmarks(&[
                ("times square", "Times Square, New York, NY"),
                ("grand central", "Grand Central, New York, NY"),
                ("penn station", "Penn Station, New York, NY"),
                ("union square", "Union Square, New York, NY"),
                ("columbus circle", "Columbus Circle, New York, NY"),
                ("rockefeller center", "Rockefeller Center, New York, NY"),
                ("rockefeller", "Rockefeller Center, New York, NY"),
                ("central park", "Central Park, New York, NY"),
                ("brooklyn bridge", "Brooklyn Bridge, New York, NY"),
                ("world trade center", "World Trade Center, New York, NY"),
                ("world trade", "World Trade Center, New York, NY"),
            ]),
        };

        Self {
            regions: vec![boston, new_york],
            ambiguous: vec![AmbiguousCity {
                name: "cambridge".to_string(),
                region: "boston".to_string(),
                resolves_to: "Cambridge, MA".to_string(),
                clarification: "Cambridge, Massachusetts (near Boston)".to_string(),
            }],
            unserved: strings(&[
                "los angeles", "san francisco", "chicago", "seattle", "miami", "houston", "dallas",
                "austin", "philadelphia", "atlanta", "denver", "washington dc", "london", "uk",
                "england", "toronto", "california", "texas", "florida", "new jersey",
            ]),
            anywhere_phrases: strings(&[
                "anywhere", "either area", "either city", "both areas", "any area",
                "doesnt matter where",
            ]),
            anywhere_default: "Boston, MA/Cambridge, MA".to_string(),
        }
    }
}

const LOCATION_CUES: &[&str] = &[
    "in", "near", "close to", "located", "live", "living", "from", "neighborhood", "area",
    "station", "square", "street", "downtown", "around here",
];

impl RegionTable {
    /// `Boston, Cambridge (MA) and New York City`
    pub fn served_label(&self) -> String {
        let names: Vec<&str> = self.regions.iter().map(|r| r.display_name.as_str()).collect();
        match names.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
            Some((last, _)) => last.to_string(),
            None => String::new(),
        }
    }

    pub fn clarification_for(&self, city: &str) -> Option<&str> {
        self.ambiguous
            .iter()
            .find(|a| a.name == city)
            .map(|a| a.clarification.as_str())
    }

    fn region(&self, name: &str) -> Option<&ServedRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Whether the utterance talks about a place at all; gates the model fallback
    pub fn has_location_cue(&self, utterance: &str) -> bool {
        Keywords::new(utterance).has_any(LOCATION_CUES)
    }

    /// Keyword-only location extraction.
    ///
    /// `pending` is the location already on record. When it is an ambiguous city,
    /// the city counts as mentioned so a follow-up like "Massachusetts" resolves it.
    pub fn extract(&self, utterance: &str, pending: Option<&Location>) -> Option<Location> {
        let keywords = Keywords::new(utterance);

        let mut all_landmarks: Vec<&Landmark> =
            self.regions.iter().flat_map(|r| r.landmarks.iter()).collect();
        all_landmarks.sort_by_key(|l| std::cmp::Reverse(l.keyword.len()));
        if let Some(landmark) = all_landmarks.iter().find(|l| keywords.has(&l.keyword)) {
            return Some(Location::Resolved(landmark.canonical.clone()));
        }

        let unserved = self.unserved.iter().find(|u| keywords.has(u));

        let mut found: Vec<String> = Vec::new();
        for region in &self.regions {
            for city in &region.cities {
                if keywords.has_any(&city.keywords) && !found.contains(&city.canonical) {
                    found.push(city.canonical.clone());
                }
            }
        }

        for ambiguous in &self.ambiguous {
            let pending_here = matches!(pending, Some(Location::Ambiguous(name)) if *name == ambiguous.name);
            if !keywords.has(&ambiguous.name) && !pending_here {
                continue;
            }

            let in_context = self.region(&ambiguous.region).is_some_and(|region| {
                keywords.has_any(&region.state_keywords)
                    || region.cities.iter().any(|c| found.contains(&c.canonical))
            });
            // "yes" to "Did you mean Cambridge, Massachusetts?"
            let confirmed = pending_here && unserved.is_none() && keywords.affirms();

            if in_context || confirmed {
                if !found.contains(&ambiguous.resolves_to) {
                    found.push(ambiguous.resolves_to.clone());
                }
            } else if let Some(place) = unserved {
                return Some(Location::Unsupported(format!("{} {}", ambiguous.name, place)));
            } else if found.is_empty() {
                return Some(Location::Ambiguous(ambiguous.name.clone()));
            }
        }

        if !found.is_empty() {
            return Some(Location::Resolved(found.join("/")));
        }

        if let Some(place) = unserved {
            return Some(Location::Unsupported(place.clone()));
        }

        if let Some(region) = self
            .regions
            .iter()
            .find(|r| keywords.has_any(&r.state_keywords))
        {
            return Some(Location::Resolved(region.default_city.clone()));
        }

        if keywords.has_any(&self.anywhere_phrases) {
            return Some(Location::Resolved(self.anywhere_default.clone()));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(value: &str) -> Option<Location> {
        Some(Location::Resolved(value.to_string()))
    }

    #[test]
    fn test_city_keywords() {
        let table = RegionTable::default();
        assert_eq!(table.extract("today in Boston", None), resolved("Boston, MA"));
        assert_eq!(table.extract("I live in Brooklyn", None), resolved("New York, NY"));
        assert_eq!(table.extract("somewhere in back bay", None), resolved("Boston, MA"));
    }

    #[test]
    fn test_landmarks_win_and_longest_first() {
        let table = RegionTable::default();
        assert_eq!(
            table.extract("near Harvard Square please", None),
            resolved("Harvard Square, Cambridge, MA")
        );
        assert_eq!(
            table.extract("by back bay station", None),
            resolved("Back Bay Station, Boston, MA")
        );
        assert_eq!(
            table.extract("close to central park", None),
            resolved("Central Park, New York, NY")
        );
    }

    #[test]
    fn test_greater_boston_towns() {
        let table = RegionTable::default();
        assert_eq!(table.extract("I'm in Brookline", None), resolved("Boston, MA"));
        assert_eq!(table.extract("near newton centre", None), resolved("Boston, MA"));
        // Chelsea is the Manhattan neighborhood in this table
        assert_eq!(table.extract("in chelsea", None), resolved("New York, NY"));
    }

    #[test]
    fn test_pending_ambiguity_confirmed_by_yes() {
        let table = RegionTable::default();
        let pending = Location::Ambiguous("cambridge".to_string());
        assert_eq!(table.extract("yes", Some(&pending)), resolved("Cambridge, MA"));
        assert_eq!(table.extract("yeah, that one", Some(&pending)), resolved("Cambridge, MA"));
        assert_eq!(
            table.extract("no", Some(&pending)),
            Some(Location::Ambiguous("cambridge".to_string()))
        );
        assert_eq!(
            table.extract("yes, the one in england", Some(&pending)),
            Some(Location::Unsupported("cambridge england".to_string()))
        );
        // without a pending question a bare yes says nothing about place
        assert_eq!(table.extract("yes", None), None);
    }

    #[test]
    fn test_bare_cambridge_is_ambiguous() {
        let table = RegionTable::default();
        assert_eq!(
            table.extract("I'm in cambridge", None),
            Some(Location::Ambiguous("cambridge".to_string()))
        );
    }

    #[test]
    fn test_cambridge_with_context_resolves() {
        let table = RegionTable::default();
        assert_eq!(table.extract("Cambridge, MA", None), resolved("Cambridge, MA"));
        assert_eq!(
            table.extract("cambridge or boston", None),
            resolved("Boston, MA/Cambridge, MA")
        );
    }

    #[test]
    fn test_pending_ambiguity_resolved_by_state() {
        let table = RegionTable::default();
        let pending = Location::Ambiguous("cambridge".to_string());
        assert_eq!(
            table.extract("the one in massachusetts", Some(&pending)),
            resolved("Cambridge, MA")
        );
    }

    #[test]
    fn test_unserved_places() {
        let table = RegionTable::default();
        assert_eq!(
            table.extract("I'm in Chicago", None),
            Some(Location::Unsupported("chicago".to_string()))
        );
        assert_eq!(
            table.extract("cambridge in the UK", None),
            Some(Location::Unsupported("cambridge uk".to_string()))
        );
    }

    #[test]
    fn test_no_location_signal() {
        let table = RegionTable::default();
        assert_eq!(table.extract("I need a massage", None), None);
        assert_eq!(table.extract("around $60", None), None);
    }

    #[test]
    fn test_served_label() {
        assert_eq!(
            RegionTable::default().served_label(),
            "Boston, Cambridge (MA) and New York City"
        );
    }
}

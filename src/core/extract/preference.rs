use super::text::Keywords;

const OPEN_PHRASES: &[&str] = &[
    "anyone", "anybody", "no preference", "open to any", "doesnt matter who", "dont care who",
];
const FEMALE_WORDS: &[&str] = &["female", "woman", "women", "lady", "girl"];
const MALE_WORDS: &[&str] = &["male", "man", "men", "guy"];
const EXPERIENCE_WORDS: &[&str] = &["experienced", "senior", "expert", "professional", "veteran"];

pub const OPEN_TO_ANYONE: &str = "open to anyone";

/// Provider qualifiers such as `female`, `experienced`, or the explicit `open to anyone`
pub fn extract_provider_preference(utterance: &str) -> Option<String> {
    let keywords = Keywords::new(utterance);

    if keywords.has_any(OPEN_PHRASES) {
        return Some(OPEN_TO_ANYONE.to_string());
    }

    let mut qualifiers = Vec::new();
    if keywords.has_any(FEMALE_WORDS) {
        qualifiers.push("female");
    } else if keywords.has_any(MALE_WORDS) {
        qualifiers.push("male");
    }
    if keywords.has_any(EXPERIENCE_WORDS) {
        qualifiers.push("experienced");
    }

    if qualifiers.is_empty() {
        None
    } else {
        Some(qualifiers.join(", "))
    }
}

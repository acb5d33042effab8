use super::numbers::words_to_digits;
use super::text::{chars_after, chars_before, leading_word, normalize, Keywords};
use crate::core::round2;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extracted budget bounds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl BudgetRange {
    fn between(a: f64, b: f64) -> Self {
        Self {
            min: Some(round2(a.min(b))),
            max: Some(round2(a.max(b))),
        }
    }
}

const AMOUNT: &str = r"(\d+(?:\.\d{1,2})?)";

static CEILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:up to|under|less than|below|not more than|no more than|at most|max(?:imum)?)\s*(?:of\s*)?\$?\s*{}",
        AMOUNT
    ))
    .expect("ceiling pattern")
});

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\$?\s*{a}\s*\$?\s*(?:-|\bto\b)\s*\$?\s*{a}",
        a = AMOUNT
    ))
    .expect("range pattern")
});

static DOLLAR_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\$\s*{}", AMOUNT)).expect("dollar prefix pattern"));

static DOLLAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{}\s*\$", AMOUNT)).expect("dollar suffix pattern"));

static CURRENCY_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{}\s*(?:dollars?|bucks?|usd)\b", AMOUNT)).expect("currency word pattern")
});

static BUDGET_LEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bbudget\s*(?:is|of|:)?\s*(?:around|about|approximately|roughly)?\s*\$?\s*{}",
        AMOUNT
    ))
    .expect("budget lead pattern")
});

const TIME_CONTEXT: &[&str] = &[
    "am", "pm", "between", "available", "open", "hours", "hour", "time", "oclock",
];

const BUDGET_CONTEXT: &[&str] = &[
    "budget", "price", "cost", "costs", "dollar", "dollars", "bucks", "pay", "spend", "afford",
];

const APPROXIMATE: &[&str] = &["around", "about", "approximately", "approx", "roughly"];

const FLOOR: &[&str] = &["at least", "min", "minimum", "over", "more than", "above"];

/// Words that mark a number as something other than money
const NON_MONEY_UNITS: &[&str] = &[
    "am", "pm", "min", "mins", "minute", "minutes", "hour", "hours", "hr", "hrs", "mile", "miles",
    "mi", "km", "oclock", "people", "person", "persons", "percent",
];

fn parse_amount(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn followed_by_unit(rest: &str) -> bool {
    let trimmed = rest.trim_start();
    if trimmed.starts_with(':') || trimmed.starts_with('%') {
        return true;
    }
    NON_MONEY_UNITS.contains(&leading_word(trimmed))
}

/// A numeric range that is really a clock range (`9-5`, `between 10 and 12`)
fn looks_like_time_range(text: &str, start: usize, end: usize, low: f64, high: f64) -> bool {
    if low >= 24.0 || high >= 24.0 {
        return false;
    }

    let window = format!(
        "{} {}",
        chars_before(text, start, 15),
        chars_after(text, end, 10)
    );
    let time_context = Keywords::new(&window).has_any(TIME_CONTEXT);
    let budget_context = text.contains('$') || Keywords::new(text).has_any(BUDGET_CONTEXT);

    time_context || (!budget_context && high < 25.0)
}

fn touches_colon(text: &str, start: usize, end: usize) -> bool {
    text[..start].trim_end().ends_with(':') || text[end..].trim_start().starts_with(':')
}

/// Money amounts with their byte positions, in utterance order
fn collect_amounts(text: &str) -> Vec<(usize, f64)> {
    let mut amounts: Vec<(usize, f64)> = Vec::new();

    for pattern in [&*DOLLAR_PREFIX, &*DOLLAR_SUFFIX, &*CURRENCY_WORD, &*BUDGET_LEAD] {
        for caps in pattern.captures_iter(text) {
            if let Some(group) = caps.get(1) {
                if let Some(value) = parse_amount(group.as_str()) {
                    amounts.push((group.start(), value));
                }
            }
        }
    }

    amounts.sort_by_key(|(position, _)| *position);
    amounts.dedup_by_key(|(position, _)| *position);
    amounts
}

/// Parse a budget signal out of one utterance.
///
/// Order of precedence: ceiling phrases (`up to $80`), explicit ranges
/// (`$30-$60`), then single amounts shaped by a preceding qualifier
/// (`around $60`, `at least $50`). A plain amount is a maximum.
pub fn extract_budget(utterance: &str) -> Option<BudgetRange> {
    let text = words_to_digits(&normalize(utterance));

    for caps in CEILING.captures_iter(&text) {
        let (Some(whole), Some(group)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if followed_by_unit(&text[whole.end()..]) {
            continue;
        }
        if let Some(value) = parse_amount(group.as_str()) {
            return Some(BudgetRange {
                min: Some(0.0),
                max: Some(round2(value)),
            });
        }
    }

    for caps in RANGE.captures_iter(&text) {
        let (Some(whole), Some(a), Some(b)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if touches_colon(&text, whole.start(), whole.end()) || followed_by_unit(&text[whole.end()..]) {
            continue;
        }
        let (Some(a), Some(b)) = (parse_amount(a.as_str()), parse_amount(b.as_str())) else {
            continue;
        };
        if looks_like_time_range(&text, whole.start(), whole.end(), a.min(b), a.max(b)) {
            continue;
        }
        return Some(BudgetRange::between(a, b));
    }

    let amounts = collect_amounts(&text);
    let &(position, amount) = amounts.first()?;

    if amounts.len() >= 2 {
        let keywords = Keywords::new(&text);
        if text.contains('-') || keywords.has("to") {
            let low = amounts.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
            let high = amounts.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
            return Some(BudgetRange::between(low, high));
        }
    }

    let qualifier = Keywords::new(&text[..position]).tail(4);
    if qualifier.has_any(APPROXIMATE) {
        return Some(BudgetRange {
            min: Some(round2(amount * 0.8)),
            max: Some(round2(amount * 1.2)),
        });
    }
    if qualifier.has_any(FLOOR) {
        return Some(BudgetRange {
            min: Some(round2(amount)),
            max: None,
        });
    }

    Some(BudgetRange {
        min: None,
        max: Some(round2(amount)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: Option<f64>, max: Option<f64>) -> Option<BudgetRange> {
        Some(BudgetRange { min, max })
    }

    #[test]
    fn test_around_amount() {
        assert_eq!(extract_budget("around $60"), range(Some(48.0), Some(72.0)));
        assert_eq!(extract_budget("My budget is about 100 dollars"), range(Some(80.0), Some(120.0)));
    }

    #[test]
    fn test_ceiling_phrases() {
        assert_eq!(extract_budget("up to $80"), range(Some(0.0), Some(80.0)));
        assert_eq!(extract_budget("under 50 bucks please"), range(Some(0.0), Some(50.0)));
        assert_eq!(extract_budget("max of $45"), range(Some(0.0), Some(45.0)));
    }

    #[test]
    fn test_ranges_in_either_order() {
        assert_eq!(extract_budget("$30-$60"), range(Some(30.0), Some(60.0)));
        assert_eq!(extract_budget("$60 - $30"), range(Some(30.0), Some(60.0)));
        assert_eq!(extract_budget("somewhere 50 to 80 dollars"), range(Some(50.0), Some(80.0)));
    }

    #[test]
    fn test_floor_phrase() {
        assert_eq!(extract_budget("at least $50"), range(Some(50.0), None));
    }

    #[test]
    fn test_plain_amount_is_max_only() {
        assert_eq!(extract_budget("$75"), range(None, Some(75.0)));
        assert_eq!(extract_budget("I can pay 40$"), range(None, Some(40.0)));
    }

    #[test]
    fn test_word_numbers() {
        assert_eq!(extract_budget("around fifty dollars"), range(Some(40.0), Some(60.0)));
        assert_eq!(extract_budget("up to one hundred twenty dollars"), range(Some(0.0), Some(120.0)));
    }

    #[test]
    fn test_clock_ranges_are_not_budgets() {
        assert_eq!(extract_budget("available between 9 and 5"), None);
        assert_eq!(extract_budget("I'm free 9-5"), None);
        assert_eq!(extract_budget("open 10 to 6 pm"), None);
        assert_eq!(extract_budget("sometime 3:30-4:30"), None);
    }

    #[test]
    fn test_small_range_with_budget_keyword_is_budget() {
        assert_eq!(extract_budget("my budget is $15-$20"), range(Some(15.0), Some(20.0)));
    }

    #[test]
    fn test_non_money_numbers_ignored() {
        assert_eq!(extract_budget("under 5 miles away"), None);
        assert_eq!(extract_budget("a 30 min haircut"), None);
        assert_eq!(extract_budget("tomorrow at 3pm"), None);
    }
}

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const NUMBER_WORDS: &str = "zero|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|\
thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|thirty|forty|fifty|sixty|\
seventy|eighty|ninety|hundred|thousand";

static NUMBER_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:{words})(?:(?:\s+|-)(?:{words}))*\b",
        words = NUMBER_WORDS
    ))
    .expect("number word pattern")
});

fn word_value(word: &str) -> Option<u64> {
    let value = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        "thousand" => 1000,
        _ => return None,
    };
    Some(value)
}

/// Try to extend `current` with the next word value, following English
/// number grammar (`twenty five`, `one hundred fifty`). `None` means the
/// word starts a new number (`nine five` is two numbers).
fn extend(current: u64, value: u64) -> Option<u64> {
    let low = current % 100;
    match value {
        0 => None,
        100 if (1..=99).contains(&(current % 1000)) => Some(current - low + low * 100),
        1000 if (1..=999).contains(&current) => Some(current * 1000),
        100 | 1000 => None,
        10..=90 if value % 10 == 0 && value >= 20 => {
            (current > 0 && low == 0).then_some(current + value)
        }
        10..=19 => (current > 0 && low == 0).then_some(current + value),
        1..=9 => {
            let after_tens = low >= 20 && low % 10 == 0;
            ((current > 0 && low == 0) || after_tens).then_some(current + value)
        }
        _ => None,
    }
}

/// Compose a run of number words into one or more values
pub fn compose(words: &[&str]) -> Vec<u64> {
    let mut values = Vec::new();
    let mut current: Option<u64> = None;

    for word in words {
        let Some(value) = word_value(word) else {
            continue;
        };
        current = match current {
            None => Some(value),
            Some(c) => match extend(c, value) {
                Some(next) => Some(next),
                None => {
                    values.push(c);
                    Some(value)
                }
            },
        };
    }

    values.extend(current);
    values
}

/// Replace spelled-out numbers with digits: `fifty` -> `50`, `twenty-five` -> `25`.
///
/// Input is expected to be lowercase.
pub fn words_to_digits(text: &str) -> String {
    NUMBER_RUN
        .replace_all(text, |caps: &Captures| {
            let words: Vec<&str> = caps[0]
                .split(|c: char| c.is_whitespace() || c == '-')
                .filter(|w| !w.is_empty())
                .collect();
            compose(&words)
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_words() {
        assert_eq!(words_to_digits("around fifty dollars"), "around 50 dollars");
        assert_eq!(words_to_digits("twenty-five bucks"), "25 bucks");
    }

    #[test]
    fn test_compound_numbers() {
        assert_eq!(words_to_digits("one hundred fifty"), "150");
        assert_eq!(words_to_digits("two thousand"), "2000");
        assert_eq!(words_to_digits("ninety nine"), "99");
    }

    #[test]
    fn test_separate_numbers_stay_separate() {
        assert_eq!(words_to_digits("between nine and five"), "between 9 and 5");
        assert_eq!(words_to_digits("five thirty"), "5 30");
        assert_eq!(words_to_digits("nine five"), "9 5");
    }

    #[test]
    fn test_embedded_words_untouched() {
        assert_eq!(words_to_digits("someone often"), "someone often");
    }
}

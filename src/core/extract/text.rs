/// Normalize typographic quotes and dotted meridiem markers before matching
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
        .replace("o'clock", "oclock")
        .replace("o clock", "oclock")
}

/// Token form used for phrase lookups: lowercase alphanumeric words separated
/// by single spaces, apostrophes dropped, digits split from letters (`5pm` -> `5 pm`).
pub fn tokenize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            if let Some(p) = prev {
                let boundary = (p.is_ascii_digit() && ch.is_alphabetic())
                    || (p.is_alphabetic() && ch.is_ascii_digit());
                if boundary {
                    out.push(' ');
                }
            }
            out.push(ch);
            prev = Some(ch);
        } else {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            prev = None;
        }
    }

    out.trim_end().to_string()
}

const AFFIRMATIONS: &[&str] = &[
    "yes", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "right", "exactly", "that one",
    "sounds good", "that works", "works for me", "perfect", "great", "lets do it", "book it",
    "ill take it", "lets go", "confirm", "confirmed", "accept", "agreed",
];

const NEGATIONS: &[&str] = &["no", "nope", "nah", "not", "dont", "doesnt", "wont", "cant"];

/// Word-boundary phrase index over one utterance
#[derive(Debug, Clone)]
pub struct Keywords {
    padded: String,
}

impl Keywords {
    pub fn new(text: &str) -> Self {
        Self {
            padded: format!(" {} ", tokenize(text)),
        }
    }

    /// True when `phrase` occurs as whole words
    pub fn has(&self, phrase: &str) -> bool {
        let needle = tokenize(phrase);
        if needle.is_empty() {
            return false;
        }
        self.padded.contains(&format!(" {} ", needle))
    }

    pub fn has_any<I, S>(&self, phrases: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        phrases.into_iter().any(|p| self.has(p.as_ref()))
    }

    /// First phrase from `phrases` that occurs
    pub fn first_of<'a>(&self, phrases: &'a [&'a str]) -> Option<&'a str> {
        phrases.iter().copied().find(|p| self.has(p))
    }

    /// Last `count` words, for qualifier lookups right before an amount
    pub fn tail(&self, count: usize) -> Keywords {
        let words: Vec<&str> = self.padded.split_whitespace().collect();
        let start = words.len().saturating_sub(count);
        Keywords {
            padded: format!(" {} ", words[start..].join(" ")),
        }
    }

    /// Agreement with no negation anywhere ("yes", "sounds good", but not "no, not that")
    pub fn affirms(&self) -> bool {
        self.has_any(AFFIRMATIONS) && !self.has_any(NEGATIONS)
    }

    pub fn is_empty(&self) -> bool {
        self.padded.trim().is_empty()
    }
}

/// Up to `count` characters immediately before byte offset `at`
pub fn chars_before(text: &str, at: usize, count: usize) -> &str {
    let head = &text[..at];
    let start = head
        .char_indices()
        .rev()
        .nth(count.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    &head[start..]
}

/// Up to `count` characters starting at byte offset `at`
pub fn chars_after(text: &str, at: usize, count: usize) -> &str {
    let tail = &text[at..];
    let end = tail
        .char_indices()
        .nth(count)
        .map(|(i, _)| i)
        .unwrap_or(tail.len());
    &tail[..end]
}

/// First word of `text`, ignoring leading whitespace
pub fn leading_word(text: &str) -> &str {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

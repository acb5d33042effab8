use super::numbers::words_to_digits;
use super::text::{normalize, Keywords};
use crate::models::{TimeConstraint, TimeUrgency};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const HOUR_WORDS: &str = "one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

const MINUTE_WORDS: &str = "oh five|o five|fifteen|twenty[- ]five|twenty|thirty[- ]five|thirty|\
forty[- ]five|forty|fifty[- ]five|fifty|hundred|five|ten";

static SPOKEN_HOUR_MINUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b({h})\s+({m})\s*(am|pm)\b",
        h = HOUR_WORDS,
        m = MINUTE_WORDS
    ))
    .expect("spoken hour minute pattern")
});

static SPOKEN_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b({})\s*(am|pm|oclock)\b", HOUR_WORDS)).expect("spoken hour pattern")
});

static DIGIT_OCLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*oclock\b").expect("oclock pattern"));

static NOON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnoon\b").expect("noon pattern"));

static MIDNIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmidnight\b").expect("midnight pattern"));

static TIME_12H_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\s*(am|pm)\b").expect("12h minutes pattern"));

static TIME_12H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*(am|pm)\b").expect("12h pattern"));

static TIME_24H: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").expect("24h pattern"));

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const ASAP_WORDS: &[&str] = &[
    "asap", "as soon as possible", "urgent", "urgently", "now", "right now", "immediately",
    "emergency",
];
const TODAY_WORDS: &[&str] = &["today", "this afternoon", "tonight", "this evening", "this morning"];
const TOMORROW_WORDS: &[&str] = &["tomorrow", "tmr", "tmrw"];
const WEEK_WORDS: &[&str] = &["this week", "next week", "next few days", "soon", "weekend"];
const FLEXIBLE_WORDS: &[&str] = &["flexible", "whenever", "anytime", "any time", "no rush"];

/// Every time-related signal found in one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSignals {
    pub urgency: Option<TimeUrgency>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub constraint: Option<TimeConstraint>,
}

fn minute_value(word: &str) -> Option<u32> {
    let compact: String = word.chars().filter(|c| c.is_alphabetic()).collect();
    let minutes = match compact.as_str() {
        "ohfive" | "ofive" | "five" => 5,
        "ten" => 10,
        "fifteen" => 15,
        "twenty" => 20,
        "twentyfive" => 25,
        "thirty" => 30,
        "thirtyfive" => 35,
        "forty" => 40,
        "fortyfive" => 45,
        "fifty" => 50,
        "fiftyfive" => 55,
        "hundred" => 0,
        _ => return None,
    };
    Some(minutes)
}

fn hour_value(word: &str) -> Option<u32> {
    HOUR_WORDS
        .split('|')
        .position(|w| w == word)
        .map(|index| index as u32 + 1)
}

/// Rewrite spoken clock times into digits: `five thirty pm` -> `5:30 pm`,
/// `three o'clock` -> `3:00`, `noon` -> `12:00 pm`. Remaining number words
/// are converted as well.
pub fn normalize_spoken_times(utterance: &str) -> String {
    let text = normalize(utterance);

    let text = SPOKEN_HOUR_MINUTE.replace_all(&text, |caps: &Captures| {
        match (hour_value(&caps[1]), minute_value(&caps[2])) {
            (Some(hour), Some(minute)) => format!("{}:{:02} {}", hour, minute, &caps[3]),
            _ => caps[0].to_string(),
        }
    });

    let text = SPOKEN_HOUR.replace_all(&text, |caps: &Captures| match hour_value(&caps[1]) {
        Some(hour) => format!("{} {}", hour, &caps[2]),
        None => caps[0].to_string(),
    });

    let text = NOON.replace_all(&text, "12:00 pm");
    let text = MIDNIGHT.replace_all(&text, "12:00 am");
    let text = DIGIT_OCLOCK.replace_all(&text, "$1:00");

    words_to_digits(&text)
}

fn to_time(hour: u32, minute: u32, meridiem: Option<&str>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(m) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            match (m, hour) {
                ("pm", 12) => 12,
                ("pm", h) => h + 12,
                ("am", 12) => 0,
                (_, h) => h,
            }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn number(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Clock time from already-normalized text, trying `H:MM am/pm`, `H am/pm`, then `HH:MM`
pub fn extract_time(normalized: &str) -> Option<NaiveTime> {
    if let Some(time) = TIME_12H_MINUTES.captures_iter(normalized).find_map(|caps| {
        to_time(number(&caps, 1)?, number(&caps, 2)?, caps.get(3).map(|m| m.as_str()))
    }) {
        return Some(time);
    }

    if let Some(time) = TIME_12H
        .captures_iter(normalized)
        .find_map(|caps| to_time(number(&caps, 1)?, 0, caps.get(2).map(|m| m.as_str())))
    {
        return Some(time);
    }

    TIME_24H
        .captures_iter(normalized)
        .find_map(|caps| to_time(number(&caps, 1)?, number(&caps, 2)?, None))
}

pub fn extract_constraint(keywords: &Keywords) -> Option<TimeConstraint> {
    if keywords.has("before") {
        Some(TimeConstraint::Before)
    } else if keywords.has("after") {
        Some(TimeConstraint::After)
    } else if keywords.has_any(["by", "no later than"]) {
        Some(TimeConstraint::By)
    } else {
        None
    }
}

fn named_weekday(keywords: &Keywords) -> Option<u32> {
    WEEKDAYS
        .iter()
        .position(|day| keywords.has(day))
        .map(|index| index as u32)
}

/// Resolve a relative date expression against `now`.
///
/// Checked in order: today, tomorrow, weekend, end of week, next week, weekday name.
pub fn extract_date(
    keywords: &Keywords,
    now: NaiveDateTime,
    constraint: Option<TimeConstraint>,
) -> Option<NaiveDate> {
    let today = now.date();
    let weekday = today.weekday().num_days_from_monday() as i64;
    let is_next = keywords.has("next");
    let named_day = named_weekday(keywords);
    let in_days = |days: i64| Some(today + Duration::days(days));

    if keywords.has("today") {
        return Some(today);
    }

    if keywords.has_any(TOMORROW_WORDS) {
        return in_days(1);
    }

    if keywords.has("weekend") {
        let days = match weekday {
            0..=4 => 5 - weekday + if is_next { 7 } else { 0 },
            5 => if is_next { 7 } else { 0 },
            _ => if is_next { 13 } else { 6 },
        };
        return in_days(days);
    }

    if keywords.has_any(["end of week", "end of the week"]) {
        let mut days = (4 - weekday).rem_euclid(7);
        if days == 0 && now.hour() >= 17 {
            days = 7;
        }
        return in_days(days);
    }

    if keywords.has("next week") && named_day.is_none() {
        let days = match (7 - weekday) % 7 {
            0 => 7,
            d => d,
        };
        return in_days(days);
    }

    let target = named_day? as i64;
    let mut days = target - weekday;
    if is_next {
        days += 7;
    } else if days < 0 {
        days += 7;
    } else if days == 0 {
        let holds_today = matches!(constraint, Some(TimeConstraint::Before | TimeConstraint::By));
        if !holds_today {
            days = 7;
        }
    }
    in_days(days)
}

/// Urgency keywords. Yields `None` when a more specific time signal in the same
/// utterance should win.
pub fn extract_urgency(keywords: &Keywords, has_time: bool, has_constraint: bool) -> Option<TimeUrgency> {
    if keywords.has_any(ASAP_WORDS) {
        return Some(TimeUrgency::Asap);
    }

    if keywords.has_any(TODAY_WORDS) {
        return (!has_time).then_some(TimeUrgency::Today);
    }

    let near_term = keywords.has_any(TOMORROW_WORDS)
        || WEEKDAYS.iter().any(|day| keywords.has(day))
        || keywords.has_any(WEEK_WORDS);
    if near_term {
        return (!has_time && !has_constraint).then_some(TimeUrgency::Week);
    }

    if keywords.has_any(FLEXIBLE_WORDS) {
        return Some(TimeUrgency::Flexible);
    }

    None
}

/// Extract urgency, date, clock time and constraint from one utterance
pub fn extract_time_signals(utterance: &str, now: NaiveDateTime) -> TimeSignals {
    let normalized = normalize_spoken_times(utterance);
    let keywords = Keywords::new(&normalized);

    let time = extract_time(&normalized);
    let constraint = extract_constraint(&keywords);
    let date = extract_date(&keywords, now, constraint);
    let urgency = extract_urgency(&keywords, time.is_some(), constraint.is_some());

    TimeSignals {
        urgency,
        date,
        time,
        constraint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2024-03-14 is a Thursday, 2024-03-11 a Monday
    const THURSDAY: (i32, u32, u32) = (2024, 3, 14);
    const MONDAY: (i32, u32, u32) = (2024, 3, 11);

    fn thursday() -> NaiveDateTime {
        at(THURSDAY.0, THURSDAY.1, THURSDAY.2, 10)
    }

    fn monday() -> NaiveDateTime {
        at(MONDAY.0, MONDAY.1, MONDAY.2, 10)
    }

    #[test]
    fn test_next_weekday_same_day() {
        let signals = extract_time_signals("next thursday", thursday());
        assert_eq!(signals.date, NaiveDate::from_ymd_opt(2024, 3, 21));
    }

    #[test]
    fn test_same_day_weekday_without_constraint_is_next_week() {
        let signals = extract_time_signals("thursday", thursday());
        assert_eq!(signals.date, NaiveDate::from_ymd_opt(2024, 3, 21));
    }

    #[test]
    fn test_weekday_with_constraint_from_monday() {
        let signals = extract_time_signals("thursday before 3pm", monday());
        assert_eq!(signals.date, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(signals.time, Some(hm(15, 0)));
        assert_eq!(signals.constraint, Some(TimeConstraint::Before));
        assert_eq!(signals.urgency, None);
    }

    #[test]
    fn test_same_day_with_before_stays_today() {
        let signals = extract_time_signals("thursday before 5pm", thursday());
        assert_eq!(signals.date, NaiveDate::from_ymd_opt(2024, 3, 14));
    }

    #[test]
    fn test_past_weekday_rolls_forward() {
        let signals = extract_time_signals("monday works", thursday());
        assert_eq!(signals.date, NaiveDate::from_ymd_opt(2024, 3, 18));
        assert_eq!(signals.urgency, Some(TimeUrgency::Week));
    }

    #[test]
    fn test_weekend_resolution() {
        assert_eq!(
            extract_time_signals("this weekend", monday()).date,
            NaiveDate::from_ymd_opt(2024, 3, 16)
        );
        assert_eq!(
            extract_time_signals("next weekend", monday()).date,
            NaiveDate::from_ymd_opt(2024, 3, 23)
        );
        let sunday = at(2024, 3, 17, 10);
        assert_eq!(
            extract_time_signals("weekend", sunday).date,
            NaiveDate::from_ymd_opt(2024, 3, 23)
        );
    }

    #[test]
    fn test_end_of_week() {
        assert_eq!(
            extract_time_signals("by end of week", monday()).date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        let friday_evening = at(2024, 3, 15, 18);
        assert_eq!(
            extract_time_signals("end of week", friday_evening).date,
            NaiveDate::from_ymd_opt(2024, 3, 22)
        );
    }

    #[test]
    fn test_next_week_yields_to_named_weekday() {
        assert_eq!(
            extract_time_signals("next week", thursday()).date,
            NaiveDate::from_ymd_opt(2024, 3, 18)
        );
        assert_eq!(
            extract_time_signals("next week on wednesday", monday()).date,
            NaiveDate::from_ymd_opt(2024, 3, 20)
        );
    }

    #[test]
    fn test_clock_formats() {
        assert_eq!(extract_time(&normalize_spoken_times("at 5:30 pm")), Some(hm(17, 30)));
        assert_eq!(extract_time(&normalize_spoken_times("around 11am")), Some(hm(11, 0)));
        assert_eq!(extract_time(&normalize_spoken_times("at 14:15")), Some(hm(14, 15)));
        assert_eq!(extract_time(&normalize_spoken_times("12 am")), Some(hm(0, 0)));
        assert_eq!(extract_time(&normalize_spoken_times("13 pm")), None);
    }

    #[test]
    fn test_spoken_times() {
        assert_eq!(extract_time(&normalize_spoken_times("five thirty pm")), Some(hm(17, 30)));
        assert_eq!(extract_time(&normalize_spoken_times("three o'clock")), Some(hm(3, 0)));
        assert_eq!(extract_time(&normalize_spoken_times("at three pm")), Some(hm(15, 0)));
        assert_eq!(extract_time(&normalize_spoken_times("around noon")), Some(hm(12, 0)));
    }

    #[test]
    fn test_urgency_keywords() {
        assert_eq!(extract_time_signals("I need it asap", monday()).urgency, Some(TimeUrgency::Asap));
        assert_eq!(extract_time_signals("today in Boston", monday()).urgency, Some(TimeUrgency::Today));
        assert_eq!(extract_time_signals("whenever works", monday()).urgency, Some(TimeUrgency::Flexible));
        assert_eq!(extract_time_signals("sometime this week", monday()).urgency, Some(TimeUrgency::Week));
    }

    #[test]
    fn test_urgency_suppressed_by_specific_time() {
        let signals = extract_time_signals("today at 4pm", monday());
        assert_eq!(signals.urgency, None);
        assert_eq!(signals.date, NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(signals.time, Some(hm(16, 0)));
    }

    #[test]
    fn test_words_that_contain_keywords_do_not_fire() {
        let signals = extract_time_signals("I don't know, maybe a baby cut", monday());
        assert_eq!(signals, TimeSignals::default());
    }
}

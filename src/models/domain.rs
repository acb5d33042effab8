use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How soon the user needs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUrgency {
    #[serde(rename = "ASAP")]
    Asap,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "flexible")]
    Flexible,
}

impl TimeUrgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUrgency::Asap => "ASAP",
            TimeUrgency::Today => "today",
            TimeUrgency::Week => "week",
            TimeUrgency::Flexible => "flexible",
        }
    }
}

impl fmt::Display for TimeUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifier narrowing a date/time preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeConstraint {
    Before,
    After,
    By,
}

impl TimeConstraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeConstraint::Before => "before",
            TimeConstraint::After => "after",
            TimeConstraint::By => "by",
        }
    }
}

/// Location signal attached to a preference record
///
/// Only `Resolved` satisfies readiness. The other two variants make the
/// orchestrator ask a targeted question instead of the generic one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Location {
    /// Canonical `"City, ST"` or `"Place, City, ST"`, several joined with `/`
    Resolved(String),
    /// City name that needs disambiguation, e.g. `cambridge`
    Ambiguous(String),
    /// Place that is clearly outside the served regions
    Unsupported(String),
}

impl Location {
    pub fn resolved(&self) -> Option<&str> {
        match self {
            Location::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// City names (without state) named by a resolved location
    ///
    /// `"Kendall Square, Cambridge, MA/Boston, MA"` yields `["cambridge", "boston"]`.
    pub fn cities(&self) -> Vec<String> {
        let Some(value) = self.resolved() else {
            return Vec::new();
        };

        let mut cities: Vec<String> = value
            .split('/')
            .filter_map(|part| {
                let pieces: Vec<&str> = part.split(',').map(str::trim).collect();
                if pieces.len() >= 2 {
                    Some(pieces[pieces.len() - 2].to_lowercase())
                } else {
                    None
                }
            })
            .filter(|city| !city.is_empty())
            .collect();
        cities.dedup();
        cities
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Resolved(value) => f.write_str(value),
            Location::Ambiguous(city) => write!(f, "AMBIGUOUS:{}", city),
            Location::Unsupported(place) => write!(f, "UNSUPPORTED:{}", place),
        }
    }
}

/// Structured booking preferences gathered across conversation turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    #[serde(rename = "serviceType", default)]
    pub service_type: Option<String>,
    #[serde(rename = "budgetMin", default)]
    pub budget_min: Option<f64>,
    #[serde(rename = "budgetMax", default)]
    pub budget_max: Option<f64>,
    #[serde(rename = "timeUrgency", default)]
    pub time_urgency: Option<TimeUrgency>,
    #[serde(rename = "preferredDate", default)]
    pub preferred_date: Option<NaiveDate>,
    #[serde(rename = "preferredTime", default)]
    pub preferred_time: Option<NaiveTime>,
    #[serde(rename = "timeConstraint", default)]
    pub time_constraint: Option<TimeConstraint>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(rename = "providerPreference", default)]
    pub provider_preference: Option<String>,
    #[serde(rename = "specialNotes", default)]
    pub special_notes: Option<String>,
}

impl PreferenceRecord {
    pub fn has_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }

    pub fn has_time_info(&self) -> bool {
        self.time_urgency.is_some()
            || self.preferred_date.is_some()
            || self.preferred_time.is_some()
            || self.time_constraint.is_some()
    }

    /// Overlay every non-null field of `update` onto `self`.
    ///
    /// A field that is already set is never cleared by a null in `update`.
    pub fn merge(&mut self, update: &PreferenceRecord) {
        fn overlay<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        overlay(&mut self.service_type, &update.service_type);
        overlay(&mut self.budget_min, &update.budget_min);
        overlay(&mut self.budget_max, &update.budget_max);
        overlay(&mut self.time_urgency, &update.time_urgency);
        overlay(&mut self.preferred_date, &update.preferred_date);
        overlay(&mut self.preferred_time, &update.preferred_time);
        overlay(&mut self.time_constraint, &update.time_constraint);
        overlay(&mut self.location, &update.location);
        overlay(&mut self.provider_preference, &update.provider_preference);
        overlay(&mut self.special_notes, &update.special_notes);
    }

    pub fn merged(mut self, update: &PreferenceRecord) -> Self {
        self.merge(update);
        self
    }

    /// Human-readable budget, e.g. `$48-$72`, `up to $80`
    pub fn budget_label(&self) -> Option<String> {
        match (self.budget_min, self.budget_max) {
            (Some(min), Some(max)) if min > 0.0 => {
                Some(format!("${}-${}", format_money(min), format_money(max)))
            }
            (_, Some(max)) => Some(format!("up to ${}", format_money(max))),
            (Some(min), None) => Some(format!("at least ${}", format_money(min))),
            (None, None) => None,
        }
    }

    /// Human-readable timing, e.g. `before 15:00 on 2024-03-14`
    pub fn timing_label(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(constraint) = self.time_constraint {
            parts.push(constraint.as_str().to_string());
        }
        if let Some(time) = self.preferred_time {
            parts.push(time.format("%H:%M").to_string());
        }
        if let Some(date) = self.preferred_date {
            if self.preferred_time.is_some() {
                parts.push("on".to_string());
            }
            parts.push(date.format("%a %Y-%m-%d").to_string());
        }
        if parts.is_empty() {
            return self.time_urgency.map(|u| u.to_string());
        }
        Some(parts.join(" "))
    }

    /// One-line recap: `Service: haircut | Budget: $48-$72 | When: today | Location: Boston, MA`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(service) = &self.service_type {
            parts.push(format!("Service: {}", service));
        }
        if let Some(budget) = self.budget_label() {
            parts.push(format!("Budget: {}", budget));
        }
        if let Some(timing) = self.timing_label() {
            parts.push(format!("When: {}", timing));
        }
        if let Some(location) = &self.location {
            parts.push(format!("Location: {}", location));
        }
        if let Some(preference) = &self.provider_preference {
            parts.push(format!("Provider: {}", preference));
        }
        parts.join(" | ")
    }
}

/// Format an amount without trailing cents when it is whole
pub fn format_money(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

/// Precise user coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One (provider, service) pairing flowing through the matching pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "providerId")]
    pub provider_id: String,
    #[serde(rename = "providerName")]
    pub provider_name: String,
    #[serde(rename = "serviceName")]
    pub service_name: String,
    pub category: String,
    #[serde(rename = "basePrice")]
    pub base_price: f64,
    #[serde(rename = "durationMinutes", default)]
    pub duration_minutes: Option<u32>,
    pub rating: f64,
    #[serde(rename = "reviewCount", default)]
    pub review_count: u32,
    #[serde(rename = "isVerified", default)]
    pub is_verified: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "distanceMiles", default)]
    pub distance_miles: Option<f64>,
    #[serde(rename = "availabilityScore", default)]
    pub availability_score: Option<f64>,
    #[serde(rename = "matchScore", default)]
    pub match_score: Option<f64>,
}

impl Candidate {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }
}

/// Booking status as stored by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Whether the booking still occupies the provider's calendar
    pub fn blocks_calendar(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Pending)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Existing appointment on a provider's calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "providerId")]
    pub provider_id: String,
    pub date: NaiveDate,
    #[serde(rename = "startTime")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<NaiveTime>,
    pub status: BookingStatus,
}

impl Booking {
    /// End of the booking, assuming `default_minutes` when the store has none
    pub fn end_or(&self, default_minutes: i64) -> NaiveTime {
        self.end_time
            .unwrap_or_else(|| self.start_time + Duration::minutes(default_minutes))
    }
}

/// A discrete bookable interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(rename = "startTime")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    pub fn start(&self) -> chrono::NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn end(&self) -> chrono::NaiveDateTime {
        self.date.and_time(self.end_time)
    }
}

/// Opening and closing time for one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl DayHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    fn hm(open: (u32, u32), close: (u32, u32)) -> Option<Self> {
        Some(Self {
            open: NaiveTime::from_hms_opt(open.0, open.1, 0)?,
            close: NaiveTime::from_hms_opt(close.0, close.1, 0)?,
        })
    }
}

/// Business-hours interval as delivered by directory data (`day` 0 = Monday, `HHMM` strings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursInterval {
    pub day: u8,
    pub start: String,
    pub end: String,
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.len() != 4 {
        return None;
    }
    let hour: u32 = raw.get(0..2)?.parse().ok()?;
    let minute: u32 = raw.get(2..4)?.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Weekly working hours of one provider, indexed Monday..Sunday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub days: [Option<DayHours>; 7],
    #[serde(default)]
    pub timezone: Option<String>,
}

const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

impl WorkingHours {
    /// Mon–Fri 09:00–18:00, Sat 10:00–16:00, Sun closed
    pub fn default_schedule() -> Self {
        let weekday = DayHours::hm((9, 0), (18, 0));
        let saturday = DayHours::hm((10, 0), (16, 0));
        Self {
            days: [weekday, weekday, weekday, weekday, weekday, saturday, None],
            timezone: None,
        }
    }

    pub fn for_weekday(&self, weekday: Weekday) -> Option<DayHours> {
        self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<DayHours> {
        self.for_weekday(date.weekday())
    }

    /// Collapse day-indexed intervals to one open/close pair per day,
    /// keeping the earliest open and the latest close.
    pub fn from_intervals(intervals: &[BusinessHoursInterval], timezone: Option<String>) -> Self {
        let mut days: [Option<DayHours>; 7] = [None; 7];

        for interval in intervals {
            let index = interval.day as usize;
            if index >= 7 {
                continue;
            }
            let (Some(open), Some(close)) = (parse_hhmm(&interval.start), parse_hhmm(&interval.end))
            else {
                continue;
            };
            if close <= open {
                continue;
            }

            days[index] = Some(match days[index] {
                Some(existing) => DayHours {
                    open: existing.open.min(open),
                    close: existing.close.max(close),
                },
                None => DayHours { open, close },
            });
        }

        Self { days, timezone }
    }

    /// Grouped summary such as `Mon-Fri 09:00-18:00, Sat 10:00-16:00, Sun closed`
    pub fn summary(&self) -> String {
        let mut groups: Vec<(usize, usize, Option<DayHours>)> = Vec::new();
        for (index, hours) in self.days.iter().enumerate() {
            match groups.last_mut() {
                Some((_, end, last)) if *last == *hours => *end = index,
                _ => groups.push((index, index, *hours)),
            }
        }

        groups
            .into_iter()
            .map(|(start, end, hours)| {
                let label = if start == end {
                    DAY_LABELS[start].to_string()
                } else {
                    format!("{}-{}", DAY_LABELS[start], DAY_LABELS[end])
                };
                match hours {
                    Some(h) => format!(
                        "{} {}-{}",
                        label,
                        h.open.format("%H:%M"),
                        h.close.format("%H:%M")
                    ),
                    None => format!("{} closed", label),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self::default_schedule()
    }
}

/// Fresh verification/rating data for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    #[serde(rename = "providerId")]
    pub provider_id: String,
    pub rating: f64,
    #[serde(rename = "reviewCount")]
    pub review_count: u32,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
}

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Builds a window, collapsing an inverted range onto `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end: end.max(start) }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// `days` days starting at `start`, i.e. `[start, start + days]`
    pub fn spanning(start: NaiveDate, days: i64) -> Self {
        Self::new(start, start + Duration::days(days.max(0)))
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.num_days()).map(move |offset| start + Duration::days(offset))
    }

    /// Date window implied by the user's time signals, or `None` when timing is flexible.
    ///
    /// An explicit date wins over urgency. Constraint words shape the window around
    /// that date: `before` ends the day before (or on the day when a time is also
    /// given), `by` ends on the day, `after` starts after the day (or on it with a
    /// time) and runs `after_days` further.
    pub fn for_preferences(record: &PreferenceRecord, today: NaiveDate, after_days: i64) -> Option<Self> {
        if let Some(date) = record.preferred_date {
            let with_time = record.preferred_time.is_some();
            let window = match record.time_constraint {
                Some(TimeConstraint::Before) => {
                    let end = if with_time { date } else { date - Duration::days(1) };
                    DateWindow::new(today, end)
                }
                Some(TimeConstraint::By) => DateWindow::new(today, date),
                Some(TimeConstraint::After) => {
                    let start = if with_time { date } else { date + Duration::days(1) };
                    DateWindow::spanning(start.max(today), after_days)
                }
                None => DateWindow::single(date.max(today)),
            };
            return Some(window);
        }

        match record.time_urgency {
            Some(TimeUrgency::Asap) | Some(TimeUrgency::Today) => Some(DateWindow::single(today)),
            Some(TimeUrgency::Week) => Some(DateWindow::spanning(today, 7)),
            Some(TimeUrgency::Flexible) | None => None,
        }
    }
}

/// Points awarded by the filter-stage match score (0–100 total)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub rating: f64,
    pub distance: f64,
    pub availability: f64,
    pub verified: f64,
    /// Distance at which the distance component reaches zero
    pub distance_horizon_miles: f64,
    /// Availability fraction assumed when the availability stage was skipped
    pub neutral_availability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rating: 40.0,
            distance: 30.0,
            availability: 20.0,
            verified: 10.0,
            distance_horizon_miles: 10.0,
            neutral_availability: 0.5,
        }
    }
}

/// Weights of the final ranking blend (fractions summing to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub rating: f64,
    pub price: f64,
    pub availability: f64,
    pub distance: f64,
    pub distance_horizon_miles: f64,
    /// Slot count that earns a full availability score
    pub full_availability_slots: f64,
    pub top_rated_threshold: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            rating: 0.40,
            price: 0.30,
            availability: 0.20,
            distance: 0.10,
            distance_horizon_miles: 10.0,
            full_availability_slots: 3.0,
            top_rated_threshold: 4.5,
        }
    }
}

/// Conversation phase of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Gathering,
    ReadyToMatch,
    Matching,
    ResultsDelivered,
}

/// What the session store keeps between turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: ConversationState,
    pub record: PreferenceRecord,
    pub turns: u32,
    /// Calendar slot offered on the last turn
    #[serde(rename = "suggestedSlot", default)]
    pub suggested_slot: Option<NaiveDateTime>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new() -> Self {
        Self {
            state: ConversationState::Gathering,
            record: PreferenceRecord::default(),
            turns: 0,
            suggested_slot: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// One message of the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Opaque identity of the current user, used only to scope calendar reads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(pub String);

impl UserIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Busy block on the user's own calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: chrono::NaiveDateTime,
    pub end: chrono::NaiveDateTime,
}

impl BusyInterval {
    pub fn overlaps(&self, start: chrono::NaiveDateTime, end: chrono::NaiveDateTime) -> bool {
        start < self.end && end > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_merge_keeps_existing_fields() {
        let mut record = PreferenceRecord {
            service_type: Some("haircut".to_string()),
            budget_max: Some(60.0),
            ..Default::default()
        };

        record.merge(&PreferenceRecord {
            location: Some(Location::Resolved("Boston, MA".to_string())),
            ..Default::default()
        });

        assert_eq!(record.service_type.as_deref(), Some("haircut"));
        assert_eq!(record.budget_max, Some(60.0));
        assert_eq!(record.location.as_ref().and_then(|l| l.resolved()), Some("Boston, MA"));
    }

    #[test]
    fn test_merge_overwrites_with_new_values() {
        let record = PreferenceRecord {
            budget_max: Some(60.0),
            ..Default::default()
        }
        .merged(&PreferenceRecord {
            budget_max: Some(80.0),
            ..Default::default()
        });

        assert_eq!(record.budget_max, Some(80.0));
    }

    #[test]
    fn test_summary_format() {
        let record = PreferenceRecord {
            service_type: Some("haircut".to_string()),
            budget_min: Some(48.0),
            budget_max: Some(72.0),
            time_urgency: Some(TimeUrgency::Today),
            location: Some(Location::Resolved("Boston, MA".to_string())),
            ..Default::default()
        };

        assert_eq!(
            record.summary(),
            "Service: haircut | Budget: $48-$72 | When: today | Location: Boston, MA"
        );
    }

    #[test]
    fn test_location_cities() {
        let location = Location::Resolved("Kendall Square, Cambridge, MA/Boston, MA".to_string());
        assert_eq!(location.cities(), vec!["cambridge", "boston"]);
        assert!(Location::Ambiguous("cambridge".to_string()).cities().is_empty());
    }

    #[test]
    fn test_working_hours_from_intervals_collapses_split_days() {
        let intervals = vec![
            BusinessHoursInterval { day: 0, start: "0900".into(), end: "1200".into() },
            BusinessHoursInterval { day: 0, start: "1300".into(), end: "1900".into() },
            BusinessHoursInterval { day: 2, start: "1000".into(), end: "1600".into() },
        ];

        let hours = WorkingHours::from_intervals(&intervals, None);
        let monday = hours.for_weekday(Weekday::Mon).unwrap();
        assert_eq!(monday.open, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(monday.close, NaiveTime::from_hms_opt(19, 0, 0).unwrap());
        assert!(hours.for_weekday(Weekday::Tue).is_none());
    }

    #[test]
    fn test_default_schedule_summary() {
        assert_eq!(
            WorkingHours::default_schedule().summary(),
            "Mon-Fri 09:00-18:00, Sat 10:00-16:00, Sun closed"
        );
    }

    #[test]
    fn test_date_window_from_urgency() {
        let today = date(2024, 3, 11);
        let record = PreferenceRecord {
            time_urgency: Some(TimeUrgency::Week),
            ..Default::default()
        };
        let window = DateWindow::for_preferences(&record, today, 7).unwrap();
        assert_eq!(window.start, today);
        assert_eq!(window.end, date(2024, 3, 18));
        assert_eq!(window.num_days(), 8);

        let flexible = PreferenceRecord {
            time_urgency: Some(TimeUrgency::Flexible),
            ..Default::default()
        };
        assert!(DateWindow::for_preferences(&flexible, today, 7).is_none());
    }

    #[test]
    fn test_date_window_with_constraint() {
        let today = date(2024, 3, 11);
        let thursday = date(2024, 3, 14);

        let before_day = PreferenceRecord {
            preferred_date: Some(thursday),
            time_constraint: Some(TimeConstraint::Before),
            ..Default::default()
        };
        let window = DateWindow::for_preferences(&before_day, today, 7).unwrap();
        assert_eq!((window.start, window.end), (today, date(2024, 3, 13)));

        let before_time = PreferenceRecord {
            preferred_time: NaiveTime::from_hms_opt(15, 0, 0),
            ..before_day.clone()
        };
        let window = DateWindow::for_preferences(&before_time, today, 7).unwrap();
        assert_eq!(window.end, thursday);

        let after_day = PreferenceRecord {
            preferred_date: Some(thursday),
            time_constraint: Some(TimeConstraint::After),
            ..Default::default()
        };
        let window = DateWindow::for_preferences(&after_day, today, 7).unwrap();
        assert_eq!(window.start, date(2024, 3, 15));
    }

    #[test]
    fn test_booking_status_parsing() {
        assert_eq!("Confirmed".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert!(!BookingStatus::Cancelled.blocks_calendar());
        assert!("unknown".parse::<BookingStatus>().is_err());
    }
}

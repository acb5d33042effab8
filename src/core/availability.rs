use crate::models::{
    Booking, BusyInterval, Candidate, DateWindow, DayHours, PreferenceRecord, TimeConstraint, TimeSlot,
    WorkingHours,
};
use crate::services::store::{ProviderStore, StoreError};
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Slot-resolution settings
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityConfig {
    /// Granularity of generated slots
    pub slot_minutes: i64,
    pub default_service_minutes: i64,
    /// Assumed length of a booking stored without an end time
    pub default_booking_minutes: i64,
    pub max_slots: usize,
    pub max_alternatives_considered: usize,
    pub max_alternatives: usize,
    pub alternative_window_minutes: i64,
    pub concurrency: usize,
    /// Window searched when timing is flexible
    pub flexible_days: i64,
    pub after_window_days: i64,
    pub user_timezone: Tz,
    /// Used for providers that never published hours
    pub default_hours: WorkingHours,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            default_service_minutes: 30,
            default_booking_minutes: 60,
            max_slots: 10,
            max_alternatives_considered: 5,
            max_alternatives: 3,
            alternative_window_minutes: 60,
            concurrency: 8,
            flexible_days: 30,
            after_window_days: 7,
            user_timezone: chrono_tz::America::New_York,
            default_hours: WorkingHours::default_schedule(),
        }
    }
}

/// A free slot in provider-local time, with the user's view when the zones differ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    #[serde(flatten)]
    pub slot: TimeSlot,
    #[serde(rename = "userStart", default, skip_serializing_if = "Option::is_none")]
    pub user_start: Option<DateTime<FixedOffset>>,
    /// User offset minus provider offset
    #[serde(rename = "offsetHours", default)]
    pub offset_hours: f64,
}

impl AvailableSlot {
    /// `Thu 03/14 02:30 PM`, in the user's zone when converted
    pub fn display(&self) -> String {
        match self.user_start {
            Some(start) => start.format("%a %m/%d %I:%M %p").to_string(),
            None => self.slot.start().format("%a %m/%d %I:%M %p").to_string(),
        }
    }
}

/// Free slot close to a preferred time that had no exact match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSlot {
    #[serde(flatten)]
    pub slot: TimeSlot,
    #[serde(rename = "diffMinutes")]
    pub diff_minutes: i64,
    #[serde(rename = "isBefore")]
    pub is_before: bool,
    /// `N min before` / `N min after`
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAvailability {
    pub candidate: Candidate,
    pub slots: Vec<AvailableSlot>,
    /// Free slots before truncation to `max_slots`
    #[serde(rename = "slotCount")]
    pub slot_count: usize,
    #[serde(rename = "workingHours")]
    pub working_hours: String,
    pub timezone: String,
    #[serde(rename = "userTimezone")]
    pub user_timezone: String,
    pub alternatives: Vec<AlternativeSlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityOutcome {
    Available(Vec<CandidateAvailability>),
    /// Every checked candidate came back without a single free slot
    NoAvailability { checked: usize },
}

/// `[slot_start, slot_end)` overlaps `[booking_start, booking_end)`
#[inline]
pub fn conflicts_with(
    slot_start: NaiveDateTime,
    slot_end: NaiveDateTime,
    booking_start: NaiveDateTime,
    booking_end: NaiveDateTime,
) -> bool {
    slot_start < booking_end && slot_end > booking_start
}

#[inline]
pub fn within_working_hours(slot: &TimeSlot, hours: DayHours) -> bool {
    slot.start_time >= hours.open && slot.end_time <= hours.close && slot.start_time < slot.end_time
}

fn booking_interval(booking: &Booking, default_minutes: i64) -> (NaiveDateTime, NaiveDateTime) {
    let start = booking.date.and_time(booking.start_time);
    let end = booking.date.and_time(booking.end_or(default_minutes));
    if end <= start {
        // end wrapped past midnight
        (start, start + Duration::minutes(default_minutes))
    } else {
        (start, end)
    }
}

/// IANA zone for a US state code; Eastern when unknown
pub fn timezone_for_state(state: &str) -> Tz {
    match state.trim().to_ascii_uppercase().as_str() {
        "CA" | "WA" | "OR" | "NV" => chrono_tz::America::Los_Angeles,
        "IL" | "TX" | "MN" | "WI" | "MO" | "LA" => chrono_tz::America::Chicago,
        "CO" | "UT" | "NM" => chrono_tz::America::Denver,
        "AZ" => chrono_tz::America::Phoenix,
        _ => chrono_tz::America::New_York,
    }
}

/// Zone a provider works in: explicit zone from its hours, else derived from its state
pub fn provider_timezone(candidate: &Candidate, hours: &WorkingHours) -> Tz {
    hours
        .timezone
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
        .or_else(|| candidate.state.as_deref().map(timezone_for_state))
        .unwrap_or(chrono_tz::America::New_York)
}

fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _later) => Some(earlier),
        // spring-forward gap
        LocalResult::None => None,
    }
}

/// Re-express a provider-local slot start in the user's zone
pub fn convert_slot(slot: TimeSlot, provider_tz: Tz, user_tz: Tz) -> AvailableSlot {
    if provider_tz == user_tz {
        return AvailableSlot {
            slot,
            user_start: None,
            offset_hours: 0.0,
        };
    }

    match localize(provider_tz, slot.start()) {
        Some(provider_start) => {
            let user_start = provider_start.with_timezone(&user_tz);
            let provider_offset = provider_start.offset().fix().local_minus_utc();
            let user_offset = user_start.offset().fix().local_minus_utc();
            AvailableSlot {
                slot,
                user_start: Some(user_start.fixed_offset()),
                offset_hours: (user_offset - provider_offset) as f64 / 3600.0,
            }
        }
        None => AvailableSlot {
            slot,
            user_start: None,
            offset_hours: 0.0,
        },
    }
}

/// Free slots on one day: start on a free unit, span enough contiguous free units
/// for the service, stay inside working hours, and clear every booking.
pub fn generate_slots(
    date: NaiveDate,
    hours: DayHours,
    bookings: &[(NaiveDateTime, NaiveDateTime)],
    service_minutes: i64,
    slot_minutes: i64,
    not_before: Option<NaiveTime>,
) -> Vec<TimeSlot> {
    if slot_minutes <= 0 || service_minutes <= 0 || hours.close <= hours.open {
        return Vec::new();
    }

    let unit = Duration::minutes(slot_minutes);
    let open = date.and_time(hours.open);
    let close = date.and_time(hours.close);

    // free/busy flag per unit across the working day
    let mut units: Vec<(NaiveDateTime, bool)> = Vec::new();
    let mut cursor = open;
    while cursor + unit <= close {
        let end = cursor + unit;
        let free = !bookings.iter().any(|(b_start, b_end)| conflicts_with(cursor, end, *b_start, *b_end));
        units.push((cursor, free));
        cursor = end;
    }

    let needed = ((service_minutes + slot_minutes - 1) / slot_minutes) as usize;
    let service = Duration::minutes(service_minutes);

    let mut slots = Vec::new();
    for (index, (start, _)) in units.iter().enumerate() {
        if let Some(cutoff) = not_before {
            if start.time() < cutoff {
                continue;
            }
        }
        let Some(run) = units.get(index..index + needed) else {
            break;
        };
        if !run.iter().all(|(_, free)| *free) {
            continue;
        }

        let slot = TimeSlot {
            date,
            start_time: start.time(),
            end_time: (*start + service).time(),
        };
        if !within_working_hours(&slot, hours) {
            continue;
        }
        // double-booking safety net against the raw intervals
        let end = *start + service;
        if bookings.iter().any(|(b_start, b_end)| conflicts_with(*start, end, *b_start, *b_end)) {
            continue;
        }
        slots.push(slot);
    }
    slots
}

/// Nearest free slots within `window_minutes` of `preferred`, closest first
pub fn suggest_alternatives(
    slots: &[TimeSlot],
    preferred: NaiveDateTime,
    window_minutes: i64,
    max: usize,
) -> Vec<AlternativeSlot> {
    let mut near: Vec<(i64, &TimeSlot)> = slots
        .iter()
        .map(|slot| ((slot.start() - preferred).num_minutes(), slot))
        .filter(|(diff, _)| diff.abs() <= window_minutes)
        .collect();
    near.sort_by_key(|(diff, _)| diff.abs());

    near.into_iter()
        .take(max)
        .map(|(diff, slot)| {
            let is_before = diff < 0;
            AlternativeSlot {
                slot: *slot,
                diff_minutes: diff.abs(),
                is_before,
                label: format!("{} min {}", diff.abs(), if is_before { "before" } else { "after" }),
            }
        })
        .collect()
}

/// Keep slots honoring a before/after/by constraint on the preferred time.
///
/// Compares full datetimes when a date is known, otherwise time of day.
pub fn apply_time_constraint(
    slots: Vec<TimeSlot>,
    constraint: TimeConstraint,
    time: NaiveTime,
    date: Option<NaiveDate>,
) -> Vec<TimeSlot> {
    slots
        .into_iter()
        .filter(|slot| {
            let (start, end, limit) = match date {
                Some(date) => (slot.start(), slot.end(), date.and_time(time)),
                None => (
                    slot.date.and_time(slot.start_time),
                    slot.date.and_time(slot.end_time),
                    slot.date.and_time(time),
                ),
            };
            match constraint {
                TimeConstraint::Before => start < limit,
                TimeConstraint::After => start > limit,
                TimeConstraint::By => end <= limit,
            }
        })
        .collect()
}

/// First whole hour in `[from, from + days)` inside `work_hours` that clears every busy interval
pub fn first_free_hour(
    busy: &[BusyInterval],
    from: NaiveDateTime,
    days: i64,
    work_hours: DayHours,
) -> Option<NaiveDateTime> {
    let hour = Duration::hours(1);
    for offset in 0..days.max(0) {
        let date = from.date() + Duration::days(offset);
        let mut cursor = date.and_time(work_hours.open);
        let close = date.and_time(work_hours.close);
        while cursor + hour <= close {
            if cursor >= from && !busy.iter().any(|b| b.overlaps(cursor, cursor + hour)) {
                return Some(cursor);
            }
            cursor += hour;
        }
    }
    None
}

/// Computes concrete open slots per candidate from bookings and working hours
#[derive(Debug, Clone, Default)]
pub struct AvailabilityResolver {
    config: AvailabilityConfig,
}

impl AvailabilityResolver {
    pub fn new(config: AvailabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AvailabilityConfig {
        &self.config
    }

    /// Date window searched for the record; flexible timing opens `flexible_days`
    pub fn window_for(&self, record: &PreferenceRecord, today: NaiveDate) -> DateWindow {
        DateWindow::for_preferences(record, today, self.config.after_window_days)
            .unwrap_or_else(|| DateWindow::spanning(today, self.config.flexible_days))
    }

    /// Pure slot computation for one candidate, given its bookings and hours.
    ///
    /// `now` is the user's wall-clock time; slots already started are never offered.
    pub fn resolve_candidate(
        &self,
        candidate: Candidate,
        bookings: &[Booking],
        hours: Option<WorkingHours>,
        record: &PreferenceRecord,
        window: DateWindow,
        now: NaiveDateTime,
    ) -> CandidateAvailability {
        let hours = hours.unwrap_or_else(|| self.config.default_hours.clone());
        let provider_tz = provider_timezone(&candidate, &hours);
        let user_tz = self.config.user_timezone;

        let provider_now = localize(user_tz, now)
            .map(|dt| dt.with_timezone(&provider_tz).naive_local())
            .unwrap_or(now);

        let service_minutes = candidate
            .duration_minutes
            .map(i64::from)
            .filter(|m| *m > 0)
            .unwrap_or(self.config.default_service_minutes);

        let intervals: Vec<(NaiveDate, (NaiveDateTime, NaiveDateTime))> = bookings
            .iter()
            .filter(|b| b.status.blocks_calendar())
            .map(|b| (b.date, booking_interval(b, self.config.default_booking_minutes)))
            .collect();

        let mut slots = Vec::new();
        for date in window.dates() {
            if date < provider_now.date() {
                continue;
            }
            let Some(day_hours) = hours.for_date(date) else {
                continue;
            };
            let day_bookings: Vec<(NaiveDateTime, NaiveDateTime)> = intervals
                .iter()
                .filter(|(d, _)| *d == date)
                .map(|(_, interval)| *interval)
                .collect();
            let not_before = (date == provider_now.date()).then(|| provider_now.time());
            slots.extend(generate_slots(
                date,
                day_hours,
                &day_bookings,
                service_minutes,
                self.config.slot_minutes,
                not_before,
            ));
        }

        let mut alternatives = Vec::new();
        if let (Some(time), None) = (record.preferred_time, record.time_constraint) {
            let anchor = record.preferred_date.unwrap_or(window.start).and_time(time);
            let exact = slots.iter().any(|s| s.start() == anchor);
            if !exact {
                alternatives = suggest_alternatives(
                    &slots,
                    anchor,
                    self.config.alternative_window_minutes,
                    self.config.max_alternatives_considered,
                );
                alternatives.truncate(self.config.max_alternatives);
            }
        }

        if let (Some(time), Some(constraint)) = (record.preferred_time, record.time_constraint) {
            slots = apply_time_constraint(slots, constraint, time, record.preferred_date);
        }

        let slot_count = slots.len();
        let slots = slots
            .into_iter()
            .take(self.config.max_slots)
            .map(|slot| convert_slot(slot, provider_tz, user_tz))
            .collect();

        CandidateAvailability {
            candidate,
            slots,
            slot_count,
            working_hours: hours.summary(),
            timezone: provider_tz.name().to_string(),
            user_timezone: user_tz.name().to_string(),
            alternatives,
        }
    }

    /// Resolve every candidate concurrently, dropping those left without slots.
    ///
    /// A failed lookup drops only that candidate; the error is returned when every lookup failed.
    pub async fn resolve(
        &self,
        store: &dyn ProviderStore,
        candidates: Vec<Candidate>,
        record: &PreferenceRecord,
        now: NaiveDateTime,
    ) -> Result<AvailabilityOutcome, StoreError> {
        let checked = candidates.len();
        let window = self.window_for(record, now.date());
        debug!(candidates = checked, start = %window.start, end = %window.end, "Resolving availability");

        let mut lookups = stream::iter(candidates.into_iter().enumerate())
            .map(|(index, candidate)| async move {
                let fetched = futures::try_join!(
                    store.get_bookings(&candidate.provider_id, window),
                    store.get_working_hours(&candidate.provider_id),
                );
                (index, candidate, fetched)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;
        lookups.sort_by_key(|(index, _, _)| *index);

        let mut first_error = None;
        let mut failures = 0;
        let mut resolved = Vec::new();
        for (_, candidate, fetched) in lookups {
            match fetched {
                Ok((bookings, hours)) => {
                    let availability = self.resolve_candidate(candidate, &bookings, hours, record, window, now);
                    debug!(
                        provider_id = %availability.candidate.provider_id,
                        slots = availability.slot_count,
                        "Candidate availability resolved"
                    );
                    if availability.slot_count > 0 {
                        resolved.push(availability);
                    }
                }
                Err(err) => {
                    warn!(provider_id = %candidate.provider_id, "Availability lookup failed: {}", err);
                    failures += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        if checked > 0 && failures == checked {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        if resolved.is_empty() {
            return Ok(AvailabilityOutcome::NoAvailability { checked });
        }

        resolved.sort_by(|a, b| b.slot_count.cmp(&a.slot_count));
        Ok(AvailabilityOutcome::Available(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, TimeUrgency};
    use crate::services::memory::InMemoryProviderStore;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn booking(provider: &str, day: NaiveDate, start: NaiveTime, end: Option<NaiveTime>) -> Booking {
        Booking {
            provider_id: provider.to_string(),
            date: day,
            start_time: start,
            end_time: end,
            status: BookingStatus::Confirmed,
        }
    }

    fn candidate(id: &str) -> Candidate {
        Candidate {
            service_id: format!("svc-{}", id),
            provider_id: id.to_string(),
            provider_name: format!("Provider {}", id),
            service_name: "Haircut".to_string(),
            category: "Hair".to_string(),
            base_price: 50.0,
            rating: 4.5,
            is_verified: true,
            state: Some("MA".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_conflict_is_half_open() {
        let day = date(14);
        assert!(conflicts_with(day.and_time(t(10, 0)), day.and_time(t(10, 30)), day.and_time(t(10, 15)), day.and_time(t(11, 0))));
        assert!(!conflicts_with(day.and_time(t(10, 0)), day.and_time(t(10, 30)), day.and_time(t(10, 30)), day.and_time(t(11, 0))));
    }

    #[test]
    fn test_generate_slots_skips_bookings() {
        let day = date(14);
        let hours = DayHours::new(t(9, 0), t(12, 0));
        let bookings = vec![(day.and_time(t(10, 0)), day.and_time(t(11, 0)))];
        let slots = generate_slots(day, hours, &bookings, 30, 30, None);
        let starts: Vec<_> = slots.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![t(9, 0), t(9, 30), t(11, 0), t(11, 30)]);
    }

    #[test]
    fn test_long_service_needs_contiguous_units() {
        let day = date(14);
        let hours = DayHours::new(t(9, 0), t(12, 0));
        let bookings = vec![(day.and_time(t(10, 0)), day.and_time(t(10, 30)))];
        let slots = generate_slots(day, hours, &bookings, 60, 30, None);
        let starts: Vec<_> = slots.iter().map(|s| s.start_time).collect();
        // 09:30 would run into the 10:00 booking; 11:30 would run past close
        assert_eq!(starts, vec![t(9, 0), t(10, 30), t(11, 0)]);
        assert!(slots.iter().all(|s| s.end_time <= t(12, 0)));
    }

    #[test]
    fn test_past_slots_are_skipped() {
        let day = date(14);
        let hours = DayHours::new(t(9, 0), t(11, 0));
        let slots = generate_slots(day, hours, &[], 30, 30, Some(t(9, 45)));
        let starts: Vec<_> = slots.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![t(10, 0), t(10, 30)]);
    }

    #[test]
    fn test_alternatives_sorted_by_proximity() {
        let day = date(14);
        let slots: Vec<TimeSlot> = [t(13, 0), t(14, 30), t(15, 30), t(17, 0)]
            .iter()
            .map(|s| TimeSlot { date: day, start_time: *s, end_time: *s + Duration::minutes(30) })
            .collect();
        let alternatives = suggest_alternatives(&slots, day.and_time(t(15, 0)), 60, 5);
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0].label, "30 min before");
        assert_eq!(alternatives[1].label, "30 min after");
    }

    #[test]
    fn test_time_constraints() {
        let day = date(14);
        let slots: Vec<TimeSlot> = [t(14, 0), t(14, 30), t(15, 0)]
            .iter()
            .map(|s| TimeSlot { date: day, start_time: *s, end_time: *s + Duration::minutes(30) })
            .collect();
        let before = apply_time_constraint(slots.clone(), TimeConstraint::Before, t(15, 0), Some(day));
        assert_eq!(before.len(), 2);
        let by = apply_time_constraint(slots.clone(), TimeConstraint::By, t(15, 0), Some(day));
        assert_eq!(by.len(), 2);
        let after = apply_time_constraint(slots, TimeConstraint::After, t(14, 0), None);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_timezone_conversion_keeps_offset() {
        let slot = TimeSlot { date: date(14), start_time: t(9, 0), end_time: t(9, 30) };
        let converted = convert_slot(slot, chrono_tz::America::Los_Angeles, chrono_tz::America::New_York);
        assert_eq!(converted.offset_hours, 3.0);
        assert_eq!(converted.user_start.unwrap().format("%H:%M").to_string(), "12:00");

        let same = convert_slot(slot, chrono_tz::America::New_York, chrono_tz::America::New_York);
        assert!(same.user_start.is_none());
    }

    #[test]
    fn test_state_timezones() {
        assert_eq!(timezone_for_state("ca"), chrono_tz::America::Los_Angeles);
        assert_eq!(timezone_for_state("TX"), chrono_tz::America::Chicago);
        assert_eq!(timezone_for_state("MA"), chrono_tz::America::New_York);
    }

    #[test]
    fn test_first_free_hour_skips_busy() {
        let from = date(14).and_time(t(8, 0));
        let busy = vec![BusyInterval { start: date(14).and_time(t(9, 0)), end: date(14).and_time(t(11, 30)) }];
        let free = first_free_hour(&busy, from, 3, DayHours::new(t(9, 0), t(17, 0)));
        assert_eq!(free, Some(date(14).and_time(t(12, 0))));
    }

    #[tokio::test]
    async fn test_fully_booked_reports_no_availability() {
        // Thursday with default 09:00-18:00 hours, booked solid
        let day = date(14);
        let store = InMemoryProviderStore::new()
            .with_service(candidate("p1"))
            .with_booking(booking("p1", day, t(9, 0), Some(t(18, 0))));
        let record = PreferenceRecord {
            preferred_date: Some(day),
            ..Default::default()
        };

        let outcome = AvailabilityResolver::default()
            .resolve(&store, vec![candidate("p1")], &record, date(13).and_time(t(12, 0)))
            .await
            .unwrap();
        assert_eq!(outcome, AvailabilityOutcome::NoAvailability { checked: 1 });
    }

    #[tokio::test]
    async fn test_resolved_slots_never_overlap_bookings() {
        let day = date(14);
        let bookings = vec![
            booking("p1", day, t(10, 0), Some(t(11, 0))),
            booking("p1", day, t(13, 15), None),
        ];
        let mut store = InMemoryProviderStore::new().with_service(candidate("p1")).with_service(candidate("p2"));
        for b in bookings.clone() {
            store = store.with_booking(b);
        }
        let record = PreferenceRecord {
            time_urgency: Some(TimeUrgency::Today),
            ..Default::default()
        };

        let outcome = AvailabilityResolver::default()
            .resolve(&store, vec![candidate("p1"), candidate("p2")], &record, day.and_time(t(7, 0)))
            .await
            .unwrap();
        let AvailabilityOutcome::Available(resolved) = outcome else {
            panic!("expected availability");
        };

        // p2 has an empty calendar and sorts first
        assert_eq!(resolved[0].candidate.provider_id, "p2");
        assert_eq!(resolved[0].slot_count, 18);
        assert_eq!(resolved[0].slots.len(), 10);
        assert_eq!(resolved[0].working_hours, "Mon-Fri 09:00-18:00, Sat 10:00-16:00, Sun closed");

        let p1 = &resolved[1];
        for slot in &p1.slots {
            for b in &bookings {
                let (b_start, b_end) = booking_interval(b, 60);
                assert!(!conflicts_with(slot.slot.start(), slot.slot.end(), b_start, b_end));
            }
        }
    }

    #[tokio::test]
    async fn test_alternatives_offered_without_exact_match() {
        let day = date(14);
        let store = InMemoryProviderStore::new()
            .with_service(candidate("p1"))
            .with_booking(booking("p1", day, t(15, 0), Some(t(16, 0))));
        let record = PreferenceRecord {
            preferred_date: Some(day),
            preferred_time: Some(t(15, 0)),
            ..Default::default()
        };

        let outcome = AvailabilityResolver::default()
            .resolve(&store, vec![candidate("p1")], &record, date(13).and_time(t(12, 0)))
            .await
            .unwrap();
        let AvailabilityOutcome::Available(resolved) = outcome else {
            panic!("expected availability");
        };
        let labels: Vec<_> = resolved[0].alternatives.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["30 min before", "60 min before", "60 min after"]);
    }
}

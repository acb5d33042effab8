//! Conversation state machine.
//!
//! `Gathering -> ReadyToMatch -> Matching -> ResultsDelivered`, with `Gathering`
//! re-entered on reset, on a fresh session, or when a business rule bounces the record.

use crate::core::availability::first_free_hour;
use crate::core::engine::EngineConfig;
use crate::core::extract::text::Keywords;
use crate::core::extract::SlotExtractor;
use crate::core::matcher::{MatchOutcome, Matcher};
use crate::core::readiness::{evaluate, MissingField};
use crate::models::{
    ChatMessage, ConversationState, Coordinates, DateWindow, DayHours, PreferenceRecord, SessionSnapshot,
    UserIdentity,
};
use crate::services::cache::SessionStore;
use crate::services::calendar::CalendarSource;
use crate::services::llm::LocationResolver;
use crate::services::store::ProviderStore;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const READY_MESSAGE: &str = "Perfect! Let me find the best matches for you!";

/// Messages of history echoed back with every gather result
const RECENT_HISTORY: usize = 4;
/// Days of the user's calendar scanned for a suggestion
const CALENDAR_LOOKAHEAD_DAYS: i64 = 3;
const SUGGESTION_FORMAT: &str = "%a %m/%d at %I:%M %p";

/// Reads a suggestion back out of an earlier assistant reply
static SUGGESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"calendar looks free on [A-Za-z]{3} (\d{2})/(\d{2}) at (\d{2}):(\d{2}) (AM|PM)")
        .expect("calendar suggestion pattern")
});

/// Slot offered in the last assistant message of `history`, if it offered one.
///
/// The reply carries no year, so the earliest year putting the day at or after
/// yesterday is used.
pub fn suggestion_from_history(history: &[ChatMessage], now: NaiveDateTime) -> Option<NaiveDateTime> {
    let last = history
        .iter()
        .rev()
        .find(|m| m.role.eq_ignore_ascii_case("assistant"))?;
    let caps = SUGGESTION.captures(&last.content)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (month, day, hour, minute) = (field(1)?, field(2)?, field(3)?, field(4)?);

    let hour = match (caps.get(5)?.as_str(), hour) {
        ("AM", 12) => 0,
        ("PM", h) if h < 12 => h + 12,
        (_, h) => h,
    };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let earliest = now.date() - Duration::days(1);
    let date = [now.year() - 1, now.year(), now.year() + 1]
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= earliest)?;
    Some(date.and_time(time))
}

/// Result of one preference-gathering step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherOutcome {
    pub record: PreferenceRecord,
    #[serde(rename = "readyToMatch")]
    pub ready_to_match: bool,
    #[serde(rename = "responseText")]
    pub response_text: String,
    #[serde(rename = "nextQuestionField")]
    pub next_question_field: Option<MissingField>,
    #[serde(rename = "missingFields")]
    pub missing_fields: Vec<MissingField>,
    pub completeness: f64,
    #[serde(rename = "contextSummary")]
    pub context_summary: String,
    #[serde(rename = "recentHistory")]
    pub recent_history: Vec<ChatMessage>,
    pub warnings: Vec<String>,
    /// Calendar slot offered with the time question, applied if the user agrees next turn
    #[serde(rename = "suggestedSlot", default, skip_serializing_if = "Option::is_none")]
    pub suggested_slot: Option<NaiveDateTime>,
}

/// One user turn of a stateful conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnInput {
    pub utterance: String,
    pub history: Vec<ChatMessage>,
    pub coordinates: Option<Coordinates>,
    pub max_distance_miles: Option<f64>,
    pub user: Option<UserIdentity>,
}

impl TurnInput {
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub session_id: String,
    pub state: ConversationState,
    pub gather: GatherOutcome,
    /// Present when the turn ran the matching phase
    pub matches: Option<MatchOutcome>,
    pub response_text: String,
}

pub struct Orchestrator {
    config: EngineConfig,
    extractor: SlotExtractor,
    matcher: Matcher,
    providers: Arc<dyn ProviderStore>,
    sessions: Arc<dyn SessionStore>,
    location_resolver: Option<Arc<dyn LocationResolver>>,
    calendar: Option<Arc<dyn CalendarSource>>,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, providers: Arc<dyn ProviderStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            extractor: SlotExtractor::new(config.extractor.clone()),
            matcher: Matcher::new(&config),
            config,
            providers,
            sessions,
            location_resolver: None,
            calendar: None,
        }
    }

    pub fn with_location_resolver(mut self, resolver: Arc<dyn LocationResolver>) -> Self {
        self.location_resolver = Some(resolver);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarSource>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn providers(&self) -> &Arc<dyn ProviderStore> {
        &self.providers
    }

    /// Current wall-clock time in the user's zone
    pub fn now(&self) -> NaiveDateTime {
        Utc::now()
            .with_timezone(&self.config.availability.user_timezone)
            .naive_local()
    }

    pub async fn gather_preferences(
        &self,
        utterance: &str,
        history: &[ChatMessage],
        current: &PreferenceRecord,
        user: Option<&UserIdentity>,
    ) -> GatherOutcome {
        self.gather_preferences_at(utterance, history, current, user, self.now())
            .await
    }

    /// Extract, check readiness and pick the next question. Never fails: collaborator
    /// errors only drop the optional enrichment they would have provided.
    pub async fn gather_preferences_at(
        &self,
        utterance: &str,
        history: &[ChatMessage],
        current: &PreferenceRecord,
        user: Option<&UserIdentity>,
        now: NaiveDateTime,
    ) -> GatherOutcome {
        let offered = suggestion_from_history(history, now);
        self.gather(utterance, history, current, user, now, offered).await
    }

    async fn gather(
        &self,
        utterance: &str,
        history: &[ChatMessage],
        current: &PreferenceRecord,
        user: Option<&UserIdentity>,
        now: NaiveDateTime,
        offered: Option<NaiveDateTime>,
    ) -> GatherOutcome {
        let mut delta = self.extractor.extract_delta(utterance, current, now);

        if let Some(slot) = offered.filter(|_| !current.has_time_info() && !delta.has_time_info()) {
            if Keywords::new(utterance).affirms() {
                debug!(%slot, "Calendar suggestion accepted");
                delta.preferred_date = Some(slot.date());
                delta.preferred_time = Some(slot.time());
                // the agreement answers the time question, not a pending location one
                delta.location = self.extractor.regions().extract(utterance, None);
            }
        }

        if delta.location.is_none() && self.extractor.regions().has_location_cue(utterance) {
            if let Some(resolver) = &self.location_resolver {
                match resolver
                    .resolve(utterance, current.location.as_ref(), self.extractor.regions())
                    .await
                {
                    Ok(found) => {
                        debug!(location = ?found, "Location resolved by model fallback");
                        delta.location = found;
                    }
                    Err(err) => warn!("Location fallback failed, keeping keyword result: {}", err),
                }
            }
        }

        let record = current.clone().merged(&delta);
        let readiness = evaluate(&record);
        let recent_history = history
            .iter()
            .skip(history.len().saturating_sub(RECENT_HISTORY))
            .cloned()
            .collect();
        let context_summary = record.summary();

        if let Some(next) = readiness.next_field().cloned() {
            let mut response_text = next.question(self.extractor.regions());
            let mut suggested_slot = None;
            if next == MissingField::TimeInfo {
                if let Some(slot) = self.calendar_suggestion(user, now).await {
                    response_text = format!(
                        "{} Your calendar looks free on {}.",
                        response_text,
                        slot.format(SUGGESTION_FORMAT)
                    );
                    suggested_slot = Some(slot);
                }
            }
            debug!(next = %next, completeness = readiness.completeness, "Record not ready");

            return GatherOutcome {
                record,
                ready_to_match: false,
                response_text,
                next_question_field: Some(next),
                missing_fields: readiness.missing_fields,
                completeness: readiness.completeness,
                context_summary,
                recent_history,
                warnings: Vec::new(),
                suggested_slot,
            };
        }

        match self.config.validation.check(&record, self.extractor.catalog()) {
            Ok(warnings) => {
                for warning in &warnings {
                    debug!(%warning, "Validation warning");
                }
                GatherOutcome {
                    record,
                    ready_to_match: true,
                    response_text: READY_MESSAGE.to_string(),
                    next_question_field: None,
                    missing_fields: Vec::new(),
                    completeness: readiness.completeness,
                    context_summary,
                    recent_history,
                    warnings,
                    suggested_slot: None,
                }
            }
            Err(violation) => {
                info!(%violation, "Record failed validation, asking again");
                GatherOutcome {
                    record,
                    ready_to_match: false,
                    response_text: violation.clarification(),
                    next_question_field: Some(violation.field()),
                    missing_fields: vec![violation.field()],
                    completeness: readiness.completeness,
                    context_summary,
                    recent_history,
                    warnings: Vec::new(),
                    suggested_slot: None,
                }
            }
        }
    }

    async fn calendar_suggestion(&self, user: Option<&UserIdentity>, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let (calendar, user) = (self.calendar.as_ref()?, user?);
        let window = DateWindow::spanning(now.date(), CALENDAR_LOOKAHEAD_DAYS - 1);

        let busy = match calendar.busy_intervals(user, window).await {
            Ok(busy) => busy,
            Err(err) => {
                warn!("Calendar lookup failed, asking without a suggestion: {}", err);
                return None;
            }
        };

        let work_hours = DayHours::new(NaiveTime::from_hms_opt(9, 0, 0)?, NaiveTime::from_hms_opt(18, 0, 0)?);
        first_free_hour(&busy, now, CALENDAR_LOOKAHEAD_DAYS, work_hours)
    }

    pub async fn match_and_rank(
        &self,
        record: &PreferenceRecord,
        origin: Option<Coordinates>,
        max_distance_miles: Option<f64>,
    ) -> MatchOutcome {
        self.match_and_rank_at(record, origin, max_distance_miles, self.now())
            .await
    }

    /// Run the matching phase under the overall timeout. Collaborator failures and
    /// the timeout become outcome variants; nothing partial is returned.
    pub async fn match_and_rank_at(
        &self,
        record: &PreferenceRecord,
        origin: Option<Coordinates>,
        max_distance_miles: Option<f64>,
        now: NaiveDateTime,
    ) -> MatchOutcome {
        let search = self
            .matcher
            .find_matches(self.providers.as_ref(), record, origin, max_distance_miles, now);

        match tokio::time::timeout(self.config.match_timeout, search).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                error!("Provider store failed during matching: {}", err);
                MatchOutcome::Unavailable {
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                warn!(timeout = ?self.config.match_timeout, "Matching timed out");
                MatchOutcome::TimedOut
            }
        }
    }

    pub async fn handle_turn(&self, session_id: &str, input: TurnInput) -> TurnOutcome {
        self.handle_turn_at(session_id, input, self.now()).await
    }

    /// Advance one session by one user turn
    pub async fn handle_turn_at(&self, session_id: &str, input: TurnInput, now: NaiveDateTime) -> TurnOutcome {
        let mut snapshot = self.load_session(session_id).await;
        if snapshot.state == ConversationState::ResultsDelivered {
            // refinement after results keeps what we know
            snapshot.state = ConversationState::Gathering;
        }
        snapshot.turns += 1;

        let offered = suggestion_from_history(&input.history, now).or(snapshot.suggested_slot);
        let gather = self
            .gather(&input.utterance, &input.history, &snapshot.record, input.user.as_ref(), now, offered)
            .await;
        snapshot.record = gather.record.clone();
        snapshot.suggested_slot = gather.suggested_slot;

        if !gather.ready_to_match {
            snapshot.state = ConversationState::Gathering;
            self.save_session(session_id, &mut snapshot).await;
            return TurnOutcome {
                session_id: session_id.to_string(),
                state: snapshot.state,
                response_text: gather.response_text.clone(),
                gather,
                matches: None,
            };
        }

        snapshot.state = ConversationState::ReadyToMatch;
        info!(session_id, summary = %gather.context_summary, "Session ready to match");
        snapshot.state = ConversationState::Matching;

        let outcome = self
            .match_and_rank_at(&gather.record, input.coordinates, input.max_distance_miles, now)
            .await;

        snapshot.state = match outcome {
            MatchOutcome::Found { .. } | MatchOutcome::Empty { .. } => ConversationState::ResultsDelivered,
            // retried on the next turn
            MatchOutcome::TimedOut | MatchOutcome::Unavailable { .. } => ConversationState::ReadyToMatch,
        };
        info!(session_id, state = ?snapshot.state, "Matching phase finished");
        self.save_session(session_id, &mut snapshot).await;

        TurnOutcome {
            session_id: session_id.to_string(),
            state: snapshot.state,
            response_text: outcome.summary_text(),
            gather,
            matches: Some(outcome),
        }
    }

    /// "Search again": forget the record and start gathering from scratch
    pub async fn search_again(&self, session_id: &str) -> TurnOutcome {
        if let Err(err) = self.sessions.discard(session_id).await {
            warn!(session_id, "Failed to discard session: {}", err);
        }
        let mut snapshot = SessionSnapshot::new();
        self.save_session(session_id, &mut snapshot).await;
        info!(session_id, "Session reset");

        let record = PreferenceRecord::default();
        let readiness = evaluate(&record);
        let response_text = MissingField::ServiceType.question(self.extractor.regions());
        TurnOutcome {
            session_id: session_id.to_string(),
            state: snapshot.state,
            response_text: response_text.clone(),
            gather: GatherOutcome {
                context_summary: record.summary(),
                record,
                ready_to_match: false,
                response_text,
                next_question_field: Some(MissingField::ServiceType),
                missing_fields: readiness.missing_fields,
                completeness: readiness.completeness,
                recent_history: Vec::new(),
                warnings: Vec::new(),
                suggested_slot: None,
            },
            matches: None,
        }
    }

    async fn load_session(&self, session_id: &str) -> SessionSnapshot {
        match self.sessions.load(session_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => SessionSnapshot::new(),
            Err(err) => {
                warn!(session_id, "Failed to load session, starting fresh: {}", err);
                SessionSnapshot::new()
            }
        }
    }

    async fn save_session(&self, session_id: &str, snapshot: &mut SessionSnapshot) {
        snapshot.updated_at = Utc::now();
        if let Err(err) = self.sessions.save(session_id, snapshot).await {
            warn!(session_id, "Failed to save session: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusyInterval, Candidate, Location};
    use crate::services::cache::InMemorySessionStore;
    use crate::services::calendar::StaticCalendar;
    use crate::services::memory::InMemoryProviderStore;
    use chrono::NaiveDate;

    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn orchestrator(store: InMemoryProviderStore) -> Orchestrator {
        Orchestrator::new(
            EngineConfig::default(),
            Arc::new(store),
            Arc::new(InMemorySessionStore::default()),
        )
    }

    fn barber() -> Candidate {
        Candidate {
            service_id: "svc-1".to_string(),
            provider_id: "p1".to_string(),
            provider_name: "Fade Factory".to_string(),
            service_name: "Classic Haircut".to_string(),
            category: "Barber".to_string(),
            base_price: 60.0,
            rating: 4.8,
            review_count: 120,
            is_verified: true,
            city: Some("Boston".to_string()),
            state: Some("MA".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_gather_asks_priority_question() {
        let orchestrator = orchestrator(InMemoryProviderStore::new());
        let outcome = orchestrator
            .gather_preferences_at("I need a haircut", &[], &PreferenceRecord::default(), None, monday_morning())
            .await;

        assert!(!outcome.ready_to_match);
        assert_eq!(outcome.next_question_field, Some(MissingField::Budget));
        assert_eq!(outcome.response_text, "What's your budget for this service?");
        assert_eq!(outcome.context_summary, "Service: haircut");
    }

    #[tokio::test]
    async fn test_validation_bounces_back_to_gathering() {
        let orchestrator = orchestrator(InMemoryProviderStore::new());
        let current = PreferenceRecord {
            service_type: Some("haircut".to_string()),
            time_urgency: Some(crate::models::TimeUrgency::Today),
            location: Some(Location::Resolved("Boston, MA".to_string())),
            ..Default::default()
        };
        let outcome = orchestrator
            .gather_preferences_at("my budget is $5000", &[], &current, None, monday_morning())
            .await;

        assert!(!outcome.ready_to_match);
        assert_eq!(outcome.next_question_field, Some(MissingField::Budget));
        assert!(outcome.response_text.starts_with("I need a bit more information:"));
    }

    #[tokio::test]
    async fn test_turns_reach_results_and_refine() {
        let orchestrator = orchestrator(InMemoryProviderStore::new().with_service(barber()));
        let session = "s-1";

        for utterance in ["I need a haircut", "around $60"] {
            let turn = orchestrator
                .handle_turn_at(session, TurnInput::new(utterance), monday_morning())
                .await;
            assert_eq!(turn.state, ConversationState::Gathering);
        }

        let turn = orchestrator
            .handle_turn_at(session, TurnInput::new("today in Boston"), monday_morning())
            .await;
        assert_eq!(turn.state, ConversationState::ResultsDelivered);
        assert!(turn.gather.ready_to_match);
        assert!(turn.response_text.starts_with("Found 1 match. Top choice: Fade Factory"));

        // a follow-up refines the retained record instead of starting over
        let turn = orchestrator
            .handle_turn_at(session, TurnInput::new("actually up to $50"), monday_morning())
            .await;
        assert_eq!(turn.gather.record.service_type.as_deref(), Some("haircut"));
        assert_eq!(turn.gather.record.budget_max, Some(50.0));
        assert!(matches!(turn.matches, Some(MatchOutcome::Empty { .. })));

        let reset = orchestrator.search_again(session).await;
        assert_eq!(reset.state, ConversationState::Gathering);
        assert_eq!(reset.response_text, "What service are you looking for?");
        let turn = orchestrator
            .handle_turn_at(session, TurnInput::new("hello"), monday_morning())
            .await;
        assert_eq!(turn.gather.record, PreferenceRecord::default());
    }

    #[tokio::test]
    async fn test_accepted_calendar_suggestion_completes_record() {
        let today = monday_morning().date();
        let calendar = StaticCalendar::new().with_busy(
            "u1",
            BusyInterval {
                start: today.and_hms_opt(9, 0, 0).unwrap(),
                end: today.and_hms_opt(11, 0, 0).unwrap(),
            },
        );
        let orchestrator = orchestrator(InMemoryProviderStore::new().with_service(barber()))
            .with_calendar(Arc::new(calendar));
        let turn = |utterance: &str| TurnInput {
            user: Some(UserIdentity("u1".to_string())),
            ..TurnInput::new(utterance)
        };

        let asked = orchestrator
            .handle_turn_at("s-cal", turn("haircut under $70 in boston"), monday_morning())
            .await;
        assert_eq!(asked.gather.next_question_field, Some(MissingField::TimeInfo));
        assert_eq!(asked.gather.suggested_slot, Some(today.and_hms_opt(11, 0, 0).unwrap()));

        // no history sent: the session remembers what was offered
        let accepted = orchestrator
            .handle_turn_at("s-cal", turn("sounds good"), monday_morning())
            .await;
        assert!(accepted.gather.ready_to_match);
        assert_eq!(accepted.gather.record.preferred_date, Some(today));
        assert_eq!(accepted.gather.record.preferred_time, NaiveTime::from_hms_opt(11, 0, 0));
        assert_eq!(accepted.state, ConversationState::ResultsDelivered);
    }

    #[tokio::test]
    async fn test_declined_suggestion_asks_again() {
        let orchestrator = orchestrator(InMemoryProviderStore::new());
        let history = vec![ChatMessage {
            role: "assistant".to_string(),
            content: "When do you need this? Your calendar looks free on Mon 03/11 at 11:00 AM.".to_string(),
        }];
        let current = PreferenceRecord {
            service_type: Some("haircut".to_string()),
            budget_max: Some(70.0),
            location: Some(Location::Resolved("Boston, MA".to_string())),
            ..Default::default()
        };

        let outcome = orchestrator
            .gather_preferences_at("no, that doesn't work", &history, &current, None, monday_morning())
            .await;
        assert_eq!(outcome.next_question_field, Some(MissingField::TimeInfo));
        assert_eq!(outcome.record.preferred_date, None);
    }

    #[test]
    fn test_suggestion_read_back_from_history() {
        let message = |role: &str, content: &str| ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        };
        let history = vec![
            message("assistant", "When do you need this? Your calendar looks free on Wed 03/13 at 02:00 PM."),
            message("user", "hmm"),
        ];
        assert_eq!(
            suggestion_from_history(&history, monday_morning()),
            NaiveDate::from_ymd_opt(2024, 3, 13).unwrap().and_hms_opt(14, 0, 0)
        );

        // a later assistant message without an offer supersedes it
        let mut moved_on = history.clone();
        moved_on.push(message("assistant", "What's your budget for this service?"));
        assert_eq!(suggestion_from_history(&moved_on, monday_morning()), None);

        // offered on Dec 31, read on Jan 1
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let late = vec![message("assistant", "Your calendar looks free on Tue 12/31 at 12:00 PM.")];
        assert_eq!(
            suggestion_from_history(&late, new_year),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap().and_hms_opt(12, 0, 0)
        );
    }

    #[test]
    fn test_recent_history_is_bounded() {
        let history: Vec<ChatMessage> = (0..6)
            .map(|i| ChatMessage {
                role: "user".to_string(),
                content: i.to_string(),
            })
            .collect();
        let outcome = tokio_test::block_on(orchestrator(InMemoryProviderStore::new()).gather_preferences_at(
            "hi",
            &history,
            &PreferenceRecord::default(),
            None,
            monday_morning(),
        ));
        let kept: Vec<_> = outcome.recent_history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(kept, vec!["2", "3", "4", "5"]);
    }
}

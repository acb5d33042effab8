// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    format_money, Booking, BookingStatus, BusinessHoursInterval, BusyInterval, Candidate, ChatMessage,
    ConversationState, Coordinates, DateWindow, DayHours, Location, PreferenceRecord, ProviderStatus,
    RankingWeights, ScoringWeights, SessionSnapshot, TimeConstraint, TimeSlot, TimeUrgency, UserIdentity,
    WorkingHours,
};
pub use requests::{FindMatchesRequest, GatherRequest, ResetRequest, TurnRequest};
pub use responses::{
    ErrorResponse, GatherResponse, HealthResponse, MatchResponse, RankedOption, ResetResponse, TurnResponse,
};

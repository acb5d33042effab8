//! Concierge Match - conversational intake and provider matching
//!
//! Turns free-text requests into a structured preference record over several
//! conversation turns, then filters, checks availability for, and ranks local
//! service providers.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{EngineConfig, MatchOutcome, Matcher, Orchestrator, SlotExtractor, TurnInput};
pub use models::{Candidate, Location, PreferenceRecord, TimeUrgency};

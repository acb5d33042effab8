use crate::models::domain::{ChatMessage, Coordinates, PreferenceRecord};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stateless preference-gathering step
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatherRequest {
    #[validate(length(min = 1, max = 2000))]
    #[serde(alias = "user_message", rename = "userMessage")]
    pub user_message: String,
    #[serde(default, alias = "conversation_history", rename = "conversationHistory")]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(default, alias = "current_preferences", rename = "currentPreferences")]
    pub current_preferences: PreferenceRecord,
    #[serde(default, alias = "user_id", rename = "userId")]
    pub user_id: Option<String>,
}

/// Stateless matching request for a record that is already ready
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    pub preferences: PreferenceRecord,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default)]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.5, max = 100.0))]
    #[serde(default, alias = "max_distance_miles", rename = "maxDistanceMiles")]
    pub max_distance_miles: Option<f64>,
}

impl FindMatchesRequest {
    pub fn coordinates(&self) -> Option<Coordinates> {
        coordinates(self.latitude, self.longitude)
    }
}

/// One turn of a stateful conversation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TurnRequest {
    #[validate(length(min = 1, max = 128))]
    #[serde(default, alias = "session_id", rename = "sessionId")]
    pub session_id: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default, alias = "conversation_history", rename = "conversationHistory")]
    pub conversation_history: Vec<ChatMessage>,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default)]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.5, max = 100.0))]
    #[serde(default, alias = "max_distance_miles", rename = "maxDistanceMiles")]
    pub max_distance_miles: Option<f64>,
    #[serde(default, alias = "user_id", rename = "userId")]
    pub user_id: Option<String>,
}

impl TurnRequest {
    pub fn coordinates(&self) -> Option<Coordinates> {
        coordinates(self.latitude, self.longitude)
    }
}

/// "Search again" for one session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "session_id", rename = "sessionId")]
    pub session_id: String,
}

fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
        _ => None,
    }
}

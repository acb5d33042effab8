use crate::core::extract::RegionTable;
use crate::models::Location;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the language model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Fallback interpretation of place names the keyword tables do not know
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// `Ok(None)` when the utterance names no place
    async fn resolve(
        &self,
        utterance: &str,
        current: Option<&Location>,
        regions: &RegionTable,
    ) -> Result<Option<Location>, LlmError>;
}

/// Parse the model's one-line reply: `NONE`, `AMBIGUOUS:<city>`, `UNSUPPORTED:<place>` or `Place, City, ST`
pub fn interpret_reply(reply: &str) -> Option<Location> {
    let reply = reply.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case("none") {
        return None;
    }

    if let Some(city) = reply.strip_prefix("AMBIGUOUS:") {
        return Some(Location::Ambiguous(city.trim().to_lowercase()));
    }
    if let Some(place) = reply.strip_prefix("UNSUPPORTED:") {
        return Some(Location::Unsupported(place.trim().to_string()));
    }

    let state = reply
        .rsplit(',')
        .next()
        .map(str::trim)
        .filter(|s| s.len() == 2 && s.chars().all(|c| c.is_ascii_uppercase()));

    match state {
        Some("MA") | Some("NY") => Some(Location::Resolved(reply.to_string())),
        Some(_) => Some(Location::Unsupported(reply.to_string())),
        None => {
            let lower = reply.to_lowercase();
            let state = if ["new york", "nyc", "brooklyn", "manhattan"].iter().any(|k| lower.contains(k)) {
                "NY"
            } else {
                "MA"
            };
            Some(Location::Resolved(format!("{}, {}", reply, state)))
        }
    }
}

fn prompt(utterance: &str, current: Option<&Location>, regions: &RegionTable) -> String {
    let current = current
        .map(|l| l.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Extract the location from this message for a local services search.\n\n\
         Message: \"{utterance}\"\n\
         Current location: {current}\n\n\
         Rules:\n\
         1. Only extract a place the user explicitly mentions. Never guess or default.\n\
         2. We only serve {served}.\n\
         3. Reply with the place and its city and state, e.g. \"Times Square, New York, NY\".\n\
         4. If a city name could refer to more than one place, reply \"AMBIGUOUS:<city>\".\n\
         5. If the place is outside our service area, reply \"UNSUPPORTED:<place>\".\n\
         6. If no place is mentioned, reply \"NONE\".\n\n\
         Reply with the location string only.",
        utterance = utterance,
        current = current,
        served = regions.served_label(),
    )
}

/// Location resolver backed by an OpenAI-compatible chat completions endpoint
pub struct LlmLocationResolver {
    endpoint: String,
    model: String,
    api_key: String,
    client: Client,
}

impl LlmLocationResolver {
    pub fn new(endpoint: String, model: String, api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            model,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl LocationResolver for LlmLocationResolver {
    async fn resolve(
        &self,
        utterance: &str,
        current: Option<&Location>,
        regions: &RegionTable,
    ) -> Result<Option<Location>, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "user", "content": prompt(utterance, current, regions) }
            ]
        });

        tracing::debug!("Resolving location via: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Api(format!(
                "Location lookup failed: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::InvalidResponse("Missing choices[0].message.content".into()))?;

        Ok(interpret_reply(content))
    }
}

use crate::core::{Orchestrator, TurnInput};
use crate::models::{
    ErrorResponse, FindMatchesRequest, GatherRequest, HealthResponse, MatchResponse, ResetRequest, TurnRequest,
    TurnResponse, UserIdentity,
};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Configure all conversation and matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/preferences/gather", web::post().to(gather_preferences))
        .route("/matches/find", web::post().to(find_matches))
        .route("/conversation/turn", web::post().to(conversation_turn))
        .route("/conversation/reset", web::post().to(conversation_reset));
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Request validation failed: {}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (status, store) = match state.orchestrator.providers().health_check().await {
        Ok(()) => ("healthy", "ok".to_string()),
        Err(e) => {
            tracing::warn!("Provider store health check failed: {}", e);
            ("degraded", e.to_string())
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        timestamp: chrono::Utc::now(),
    })
}

/// Stateless preference gathering
///
/// POST /api/v1/preferences/gather
///
/// ```json
/// { "userMessage": "I need a haircut", "conversationHistory": [], "currentPreferences": {} }
/// ```
async fn gather_preferences(state: web::Data<AppState>, req: web::Json<GatherRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let user = req.user_id.clone().map(UserIdentity);
    let outcome = state
        .orchestrator
        .gather_preferences(
            &req.user_message,
            &req.conversation_history,
            &req.current_preferences,
            user.as_ref(),
        )
        .await;

    tracing::debug!(ready = outcome.ready_to_match, "Gathered preferences");
    HttpResponse::Ok().json(outcome)
}

/// Stateless matching for a ready record
///
/// POST /api/v1/matches/find
async fn find_matches(state: web::Data<AppState>, req: web::Json<FindMatchesRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let outcome = state
        .orchestrator
        .match_and_rank(&req.preferences, req.coordinates(), req.max_distance_miles)
        .await;

    tracing::info!("Matching finished: {}", outcome.summary_text());
    HttpResponse::Ok().json(MatchResponse::from(outcome))
}

/// One turn of a stateful conversation; a session id is issued when absent
///
/// POST /api/v1/conversation/turn
async fn conversation_turn(state: web::Data<AppState>, req: web::Json<TurnRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let req = req.into_inner();
    let session_id = req
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let input = TurnInput {
        coordinates: req.coordinates(),
        max_distance_miles: req.max_distance_miles,
        user: req.user_id.map(UserIdentity),
        utterance: req.message,
        history: req.conversation_history,
    };

    let outcome = state.orchestrator.handle_turn(&session_id, input).await;
    HttpResponse::Ok().json(TurnResponse::from(outcome))
}

/// "Search again"
///
/// POST /api/v1/conversation/reset
async fn conversation_reset(state: web::Data<AppState>, req: web::Json<ResetRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let outcome = state.orchestrator.search_again(&req.session_id).await;
    HttpResponse::Ok().json(TurnResponse::from(outcome))
}

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use concierge_match::config::Settings;
use concierge_match::core::Orchestrator;
use concierge_match::routes::{self, AppState};
use concierge_match::services::{
    InMemorySessionStore, LlmLocationResolver, PostgresProviderStore, RetryPolicy, RetryingStore, SessionCache,
    SessionStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting concierge matching service...");

    let engine = settings
        .engine_config()
        .map_err(|e| startup_error("Invalid matching configuration", e))?;

    // Provider directory
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let db_min_conn = settings.database.min_connections.unwrap_or(1);
    let acquire_timeout = Duration::from_secs(settings.database.acquire_timeout_secs.unwrap_or(5));

    let postgres = PostgresProviderStore::new(&settings.database.url, db_max_conn, db_min_conn, acquire_timeout)
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;
    let providers = RetryingStore::new(
        postgres,
        RetryPolicy {
            max_attempts: settings.database.retry_attempts.unwrap_or(3),
            ..Default::default()
        },
    );

    info!("Provider store initialized (max: {} connections)", db_max_conn);

    // Sessions: Redis when reachable, process memory otherwise
    let session_ttl = settings.cache.ttl_secs.unwrap_or(3600);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let sessions: Arc<dyn SessionStore> =
        match SessionCache::new(&settings.cache.redis_url, l1_cache_size, session_ttl).await {
            Ok(cache) => {
                info!("Session cache initialized (L1: {} entries, TTL: {}s)", l1_cache_size, session_ttl);
                Arc::new(cache)
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), keeping sessions in process memory", e);
                Arc::new(InMemorySessionStore::new(l1_cache_size, session_ttl))
            }
        };

    let mut orchestrator = Orchestrator::new(engine, Arc::new(providers), sessions);

    if let Some(llm) = &settings.llm {
        let timeout = Duration::from_secs(llm.timeout_secs.unwrap_or(10));
        match LlmLocationResolver::new(llm.endpoint.clone(), llm.model.clone(), llm.api_key.clone(), timeout) {
            Ok(resolver) => {
                info!("Location fallback enabled (model: {})", llm.model);
                orchestrator = orchestrator.with_location_resolver(Arc::new(resolver));
            }
            Err(e) => warn!("Location fallback disabled: {}", e),
        }
    }

    let app_state = AppState {
        orchestrator: Arc::new(orchestrator),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

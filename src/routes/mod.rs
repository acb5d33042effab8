// Route exports
pub mod conversation;

pub use conversation::AppState;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(conversation::configure),
    );
}

pub mod handlers;

pub use handlers::AppState;

use crate::error::GraphError;
use crate::metrics;
use actix_web::web;

/// Register every follower-service route on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Undecodable bodies are client mistakes, not internal failures
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| GraphError::validation(format!("invalid body: {err}")).into());

    cfg.app_data(json_config)
        .route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .route("/follow", web::post().to(handlers::follow))
        .route("/follow", web::delete().to(handlers::unfollow))
        .route("/followers/{id}", web::get().to(handlers::followers))
        .route("/following/{id}", web::get().to(handlers::following))
        .route("/recommendations/{id}", web::get().to(handlers::recommendations))
        .route(
            "/visibility/{viewer}/{author}",
            web::get().to(handlers::visibility),
        );
}

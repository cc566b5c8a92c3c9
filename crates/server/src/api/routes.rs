use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{campaigns, handlers, ratio_fixer};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Protected API routes
    let api_routes = Router::new()
        .route("/config", get(handlers::get_config))
        // Campaigns
        .route(
            "/campaigns",
            post(campaigns::create_campaign).get(campaigns::list_campaigns),
        )
        .route("/campaigns/{id}", get(campaigns::get_campaign))
        .route("/campaigns/{id}/metrics", put(campaigns::update_metrics))
        .route("/campaigns/{id}/poll", post(campaigns::poll_campaign))
        .route("/campaigns/{id}/snapshots", get(campaigns::list_snapshots))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // Liveness stays open for probes
        .route("/health", get(handlers::health));

    // Dashboard-facing engine routes
    let ratio_fixer_routes = Router::new()
        .route("/start", post(ratio_fixer::start))
        .route("/status/{external_id}", get(ratio_fixer::status))
        .route("/stop/{external_id}", post(ratio_fixer::stop))
        .route("/health", get(ratio_fixer::health))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/ratio-fixer", ratio_fixer_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! API Router configuration

use super::handlers;
use super::metrics::track_metrics;
use super::request_id::{attach_request_id, make_span};
use super::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Teams
        .route("/teams", get(handlers::list_teams).post(handlers::create_team))
        .route("/teams/:id", delete(handlers::delete_team))
        // Services
        .route(
            "/services",
            get(handlers::list_services).post(handlers::register_service),
        )
        .route(
            "/services/:id",
            get(handlers::get_service)
                .patch(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/services/:id/team", post(handlers::assign_team))
        // Environments
        .route(
            "/services/:id/environments",
            get(handlers::list_environments).post(handlers::provision_environment),
        )
        // Deployments
        .route(
            "/services/:id/environments/:env_id/deployments",
            post(handlers::trigger_deployment),
        )
        .route(
            "/services/:id/deployments",
            get(handlers::deployment_history),
        )
        .route("/deployments/:id", get(handlers::get_deployment))
        .route("/jobs/:id", get(handlers::job_status))
        // Policies
        .route(
            "/policies",
            get(handlers::list_policies).post(handlers::create_policy),
        )
        // Audit
        .route("/audit", get(handlers::audit_log))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler));

    // Build router with middleware
    let router = Router::new()
        .route("/healthz", get(handlers::health_check))
        .nest("/api", api_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), track_metrics))
        .layer(middleware::from_fn(attach_request_id))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

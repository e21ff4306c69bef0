//! HTTP route definitions.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::require_token;
use crate::handlers::{
    health, history, list_crons, list_endpoints, reload_endpoints, update_schedule, update_status,
};
use crate::state::ApiState;

/// Create the administration router.
///
/// ## Route Structure
///
/// ```text
/// GET  /health                    - Liveness probe (never guarded)
///
/// /api (bearer token when configured)
///   GET  /api/crons               - Job settings with live timer state
///   PUT  /api/crons/{name}/schedule - Replace a job's cron expression
///   PUT  /api/crons/{name}/status   - Activate or deactivate a job
///   GET  /api/crons/history       - Paginated execution history
///   GET  /api/endpoints           - Loaded endpoint definitions
///   POST /api/endpoints/reload    - Reload the endpoint table from storage
/// ```
pub fn create_router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/crons", get(list_crons))
        .route("/crons/history", get(history))
        .route("/crons/{name}/schedule", put(update_schedule))
        .route("/crons/{name}/status", put(update_status))
        .route("/endpoints", get(list_endpoints))
        .route("/endpoints/reload", post(reload_endpoints))
        .route_layer(from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Bearer token guard for the admin routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::ApiError;
use crate::state::ApiState;

pub async fn require_token(State(state): State<ApiState>, req: Request<Body>, next: Next) -> Response {
    let Some(expected) = state.api_token.as_deref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match provided {
        Some(token) if token == expected => next.run(req).await,
        Some(_) => {
            warn!("Rejected request to {} with invalid token", req.uri().path());
            ApiError::Unauthorized("Invalid API token".to_string()).into_response()
        }
        None => ApiError::Unauthorized(
            "Missing or invalid Authorization header. Use: Bearer <token>".to_string(),
        )
        .into_response(),
    }
}

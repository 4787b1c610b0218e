//! REST API layer.
//!
//! A thin axum transport over the services: routes mirror the resources
//! (auth, locations, templates, replies) and every handler returns either
//! JSON or a structured [`ApiError`] body.

pub mod auth;
pub mod locations;
pub mod replies;
pub mod templates;

use crate::config::Config;
use crate::db::pool::DbPool;
use crate::error::AppError;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Shared state for all API routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
}

// ── Error handling ───────────────────────────────────────────────────────────

/// JSON error response shape for API consumers.
#[derive(Serialize)]
struct ApiError {
    code: String,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
pub struct ApiErr(pub AppError);

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::InvalidState { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
            AppError::NoTemplate { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "NO_TEMPLATE"),
            AppError::Authentication { .. } | AppError::AuthenticationExpired { .. } => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            AppError::Publish { .. } => (StatusCode::BAD_GATEWAY, "PUBLISH_FAILED"),
            AppError::Network { .. } => (StatusCode::GATEWAY_TIMEOUT, "NETWORK_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        (
            status,
            Json(ApiError {
                code: code.to_string(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sqlx::Error> for ApiErr {
    fn from(err: sqlx::Error) -> Self {
        Self(AppError::from(err))
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router.
pub fn api_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(locations::routes())
        .merge(templates::routes())
        .merge(replies::routes())
        .layer(cors)
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the CORS layer from the configured origins.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(err: AppError) -> StatusCode {
        ApiErr(err).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_for(AppError::not_found("Review")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(AppError::invalid_input("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(AppError::invalid_state("already decided")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(AppError::no_template(3)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(AppError::authentication_expired("expired")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(AppError::publish_terminal("rejected")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(AppError::database("broken")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

/// Bind and serve the API until ctrl-c.
pub async fn serve(config: Config, db: DbPool) -> Result<(), AppError> {
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    log::info!("Server listening on http://{}", addr);

    let state = AppState {
        db,
        config: Arc::new(config),
    };

    axum::serve(listener, api_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))
}

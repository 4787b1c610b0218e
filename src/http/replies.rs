//! Reply workflow routes: suggest, pending queue, approve, reject, edit.

use crate::http::{ApiErr, AppState};
use crate::models::PendingReply;
use crate::services::google_auth::{fresh_account, GoogleAuthService};
use crate::services::google_client::{GoogleClient, GoogleClientConfig};
use crate::services::publisher::GooglePublisher;
use crate::services::replies::{self, PendingReplyWithContext};
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveRequest {
    /// Optional edited version of the reply; overrides the suggestion.
    #[serde(default)]
    edited_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectRequest {
    /// Optional reason, recorded in the log only.
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditRequest {
    suggested_text: String,
}

/// Build the reply workflow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/replies/reviews/{review_id}/suggest", post(suggest))
        .route("/replies/pending", get(list_pending))
        .route("/replies/{id}/approve", post(approve))
        .route("/replies/{id}/reject", post(reject))
        .route("/replies/{id}/edit", post(edit))
        .route("/replies/reviews/{review_id}/reply", delete(delete_reply))
}

/// POST /replies/reviews/:review_id/suggest — generate a suggested reply.
async fn suggest(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
) -> Result<Json<PendingReply>, ApiErr> {
    let pending = replies::suggest_reply(&state.db, review_id)
        .await
        .map_err(ApiErr::from)?;

    Ok(Json(pending))
}

/// GET /replies/pending — list suggestions awaiting a decision.
async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingReplyWithContext>>, ApiErr> {
    let pending = replies::list_pending(&state.db).await.map_err(ApiErr::from)?;
    Ok(Json(pending))
}

/// POST /replies/:id/approve — publish the reply and mark it approved.
///
/// On publish failure the suggestion stays pending so the operator can
/// retry or reject it.
async fn approve(
    State(state): State<AppState>,
    Path(pending_id): Path<i64>,
    Json(input): Json<ApproveRequest>,
) -> Result<Json<PendingReply>, ApiErr> {
    let auth = GoogleAuthService::new(&state.config).map_err(ApiErr::from)?;
    let publisher = GooglePublisher::new(
        state.db.clone(),
        auth,
        state.config.request_timeout_secs,
    );

    let pending = replies::approve_reply(&state.db, &publisher, pending_id, input.edited_text)
        .await
        .map_err(ApiErr::from)?;

    Ok(Json(pending))
}

/// POST /replies/:id/reject — discard a suggestion.
async fn reject(
    State(state): State<AppState>,
    Path(pending_id): Path<i64>,
    Json(input): Json<RejectRequest>,
) -> Result<Json<PendingReply>, ApiErr> {
    if let Some(reason) = &input.reason {
        log::info!("Rejecting pending reply {}: {}", pending_id, reason);
    }

    let pending = replies::reject_reply(&state.db, pending_id)
        .await
        .map_err(ApiErr::from)?;

    Ok(Json(pending))
}

/// POST /replies/:id/edit — update the suggested text of a pending reply.
async fn edit(
    State(state): State<AppState>,
    Path(pending_id): Path<i64>,
    Json(input): Json<EditRequest>,
) -> Result<Json<PendingReply>, ApiErr> {
    let pending = replies::edit_reply(&state.db, pending_id, &input.suggested_text)
        .await
        .map_err(ApiErr::from)?;

    Ok(Json(pending))
}

/// DELETE /replies/reviews/:review_id/reply — remove a published reply
/// from the platform and clear it locally.
async fn delete_reply(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiErr> {
    let review = replies::get_review(&state.db, review_id)
        .await
        .map_err(ApiErr::from)?;
    let location = replies::get_location(&state.db, review.location_id)
        .await
        .map_err(ApiErr::from)?;

    let auth = GoogleAuthService::new(&state.config).map_err(ApiErr::from)?;
    let account = fresh_account(&state.db, &auth, location.account_id)
        .await
        .map_err(ApiErr::from)?;

    let client = GoogleClient::new(GoogleClientConfig {
        access_token: account.access_token,
        timeout_secs: state.config.request_timeout_secs,
    })
    .map_err(ApiErr::from)?;

    let account_name = client.primary_account_name().await.map_err(ApiErr::from)?;
    client
        .delete_reply(&account_name, &location.location_id, &review.review_id)
        .await
        .map_err(ApiErr::from)?;

    replies::clear_review_reply(&state.db, review.id)
        .await
        .map_err(ApiErr::from)?;

    log::info!("Deleted published reply for review {}", review.id);

    Ok(Json(serde_json::json!({
        "message": "Reply deleted successfully"
    })))
}

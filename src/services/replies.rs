//! Reply suggestion and approval workflow.
//!
//! The heart of the application: a suggested reply is generated from a
//! matching template, held as a pending record, and only reaches the
//! review platform after an explicit operator approval. Transitions out of
//! `pending` are guarded in SQL so a record never advances twice.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{Location, PendingReply, Review};
use crate::services::publisher::ReplyPublisher;
use crate::services::template_engine::{self, TemplateVars};
use serde::Serialize;
use sqlx::FromRow;

/// A pending reply joined with its review and location context, as shown
/// in the operator's approval queue.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingReplyWithContext {
    pub id: i64,
    pub review_id: i64,
    pub suggested_text: String,
    pub status: String,
    pub template_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub processed_at: Option<i64>,
    pub review_author_name: String,
    pub review_rating: i64,
    pub review_comment: Option<String>,
    pub location_name: String,
}

/// Generate (or regenerate) a suggested reply for a review.
///
/// Fails with a not-found error when the review does not exist or already
/// carries a published reply, and with a no-template error when no active
/// template covers the review's rating.
///
/// If a pending suggestion already exists for the review it is replaced
/// in place, so at most one pending record per review ever exists.
pub async fn suggest_reply(pool: &DbPool, review_id: i64) -> Result<PendingReply, AppError> {
    let review = get_review(pool, review_id).await?;

    if review.has_reply() {
        return Err(AppError::not_found_with_id(
            "unreplied review",
            review_id.to_string(),
        ));
    }

    let location = get_location(pool, review.location_id).await?;

    let template = template_engine::match_template(pool, review.rating)
        .await?
        .ok_or_else(|| AppError::no_template(review.rating))?;

    let vars = TemplateVars::from_review(&review, &location.name);
    let suggested_text = template_engine::render(&template.content, &vars);

    // Replace any existing pending suggestion in place; the partial unique
    // index on (review_id) WHERE status = 'pending' makes this race-safe.
    let pending: PendingReply = sqlx::query_as(
        r#"
        INSERT INTO pending_replies (review_id, suggested_text, template_id)
        VALUES (?, ?, ?)
        ON CONFLICT (review_id) WHERE status = 'pending'
        DO UPDATE SET
            suggested_text = excluded.suggested_text,
            template_id = excluded.template_id,
            updated_at = strftime('%s', 'now'),
            processed_at = NULL
        RETURNING id, review_id, suggested_text, status, template_id,
                  created_at, updated_at, processed_at
        "#,
    )
    .bind(review.id)
    .bind(&suggested_text)
    .bind(template.id)
    .fetch_one(pool)
    .await?;

    log::info!(
        "Suggested reply {} for review {} using template {}",
        pending.id,
        review.id,
        template.id
    );

    Ok(pending)
}

/// List suggestions awaiting a decision, newest first.
pub async fn list_pending(pool: &DbPool) -> Result<Vec<PendingReplyWithContext>, AppError> {
    let rows: Vec<PendingReplyWithContext> = sqlx::query_as(
        r#"
        SELECT
            pr.id, pr.review_id, pr.suggested_text, pr.status, pr.template_id,
            pr.created_at, pr.updated_at, pr.processed_at,
            r.author_name AS review_author_name,
            r.rating AS review_rating,
            r.comment AS review_comment,
            l.name AS location_name
        FROM pending_replies pr
        JOIN reviews r ON r.id = pr.review_id
        JOIN locations l ON l.id = r.location_id
        WHERE pr.status = 'pending'
        ORDER BY pr.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Edit the suggested text of a pending reply.
///
/// Only valid while the record is pending; terminal records fail with an
/// invalid-state error.
pub async fn edit_reply(pool: &DbPool, id: i64, text: &str) -> Result<PendingReply, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            "Reply text must not be empty",
            "suggestedText",
        ));
    }

    let updated = sqlx::query(
        r#"
        UPDATE pending_replies
        SET suggested_text = ?, updated_at = strftime('%s', 'now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(text)
    .bind(id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(not_pending_error(pool, id).await);
    }

    get_pending_reply(pool, id).await
}

/// Approve a pending reply and publish it to the review platform.
///
/// When `edited_text` is supplied it overrides the stored suggestion and is
/// what gets published. The status only advances to approved after the
/// publisher confirms success; on failure the record stays pending and the
/// error propagates so the operator can retry or reject.
pub async fn approve_reply(
    pool: &DbPool,
    publisher: &dyn ReplyPublisher,
    id: i64,
    edited_text: Option<String>,
) -> Result<PendingReply, AppError> {
    let pending = get_pending_reply(pool, id).await?;

    if !pending.is_pending() {
        return Err(AppError::invalid_state_with_current(
            format!("Pending reply {} has already been processed", id),
            pending.status.clone(),
        ));
    }

    let review = get_review(pool, pending.review_id).await?;
    let location = get_location(pool, review.location_id).await?;

    let text = match &edited_text {
        Some(text) if !text.trim().is_empty() => text.as_str(),
        Some(_) => {
            return Err(AppError::invalid_input_field(
                "Edited reply text must not be empty",
                "editedText",
            ))
        }
        None => pending.suggested_text.as_str(),
    };

    // Publish first; the transition below only runs on success.
    publisher.publish(&location, &review.review_id, text).await?;

    mark_review_replied(pool, review.id, text).await?;

    let updated = sqlx::query(
        r#"
        UPDATE pending_replies
        SET suggested_text = ?,
            status = 'approved',
            updated_at = strftime('%s', 'now'),
            processed_at = strftime('%s', 'now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(text)
    .bind(id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        // Raced with another decision between the read above and now.
        return Err(not_pending_error(pool, id).await);
    }

    log::info!("Approved and published reply {} for review {}", id, review.id);

    get_pending_reply(pool, id).await
}

/// Reject a pending reply. No external call is made.
pub async fn reject_reply(pool: &DbPool, id: i64) -> Result<PendingReply, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE pending_replies
        SET status = 'rejected',
            updated_at = strftime('%s', 'now'),
            processed_at = strftime('%s', 'now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(not_pending_error(pool, id).await);
    }

    log::info!("Rejected pending reply {}", id);

    get_pending_reply(pool, id).await
}

/// Fetch a pending reply by ID.
pub async fn get_pending_reply(pool: &DbPool, id: i64) -> Result<PendingReply, AppError> {
    let pending: Option<PendingReply> = sqlx::query_as(
        r#"
        SELECT id, review_id, suggested_text, status, template_id,
               created_at, updated_at, processed_at
        FROM pending_replies WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    pending.ok_or_else(|| AppError::not_found_with_id("PendingReply", id.to_string()))
}

/// Stamp the review row with the published reply text and time.
async fn mark_review_replied(pool: &DbPool, review_id: i64, text: &str) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE reviews SET reply = ?, reply_time = strftime('%s', 'now') WHERE id = ?",
    )
    .bind(text)
    .bind(review_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Clear the review row's published reply fields.
pub async fn clear_review_reply(pool: &DbPool, review_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE reviews SET reply = NULL, reply_time = NULL WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Build the error for a failed guarded transition: not-found when the
/// record is missing, invalid-state (with the current status) otherwise.
async fn not_pending_error(pool: &DbPool, id: i64) -> AppError {
    match get_pending_reply(pool, id).await {
        Ok(pending) => AppError::invalid_state_with_current(
            format!("Pending reply {} is not in pending status", id),
            pending.status,
        ),
        Err(err) => err,
    }
}

pub(crate) async fn get_review(pool: &DbPool, id: i64) -> Result<Review, AppError> {
    let review: Option<Review> = sqlx::query_as(
        r#"
        SELECT id, location_id, review_id, author_name, rating, comment,
               reply, reply_time, created_at, synced_at
        FROM reviews WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    review.ok_or_else(|| AppError::not_found_with_id("Review", id.to_string()))
}

pub(crate) async fn get_location(pool: &DbPool, id: i64) -> Result<Location, AppError> {
    let location: Option<Location> = sqlx::query_as(
        "SELECT id, account_id, location_id, name, address, created_at FROM locations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    location.ok_or_else(|| AppError::not_found_with_id("Location", id.to_string()))
}

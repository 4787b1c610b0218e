//! Synchronization of locations and reviews from Google Business Profile.
//!
//! Sync is operator-triggered through the HTTP layer; rows are upserted by
//! their Google resource IDs so re-running a sync is always safe.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{Location, Review};
use crate::services::google_client::{star_rating_value, GoogleClient, GoogleReview};
use crate::services::replies::get_location;

/// Parse an RFC 3339 timestamp from the API into Unix seconds.
fn parse_rfc3339(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Sync all locations for an account from the platform into SQLite.
///
/// Locations are upserted by their Google `location_id`; locations removed
/// on the platform are kept locally (their reviews remain browsable).
pub async fn sync_locations(
    pool: &DbPool,
    client: &GoogleClient,
    account_id: i64,
) -> Result<Vec<Location>, AppError> {
    let account_name = client.primary_account_name().await?;
    let google_locations = client.list_locations(&account_name).await?;

    for google_location in &google_locations {
        let location_id = google_location.location_id();
        let name = google_location
            .title
            .clone()
            .unwrap_or_else(|| "Unknown Location".to_string());
        let address = google_location
            .storefront_address
            .as_ref()
            .and_then(|a| a.flatten());

        sqlx::query(
            r#"
            INSERT INTO locations (account_id, location_id, name, address)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (location_id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address
            "#,
        )
        .bind(account_id)
        .bind(location_id)
        .bind(&name)
        .bind(&address)
        .execute(pool)
        .await?;
    }

    log::info!(
        "Synced {} locations for account {}",
        google_locations.len(),
        account_id
    );

    let locations: Vec<Location> = sqlx::query_as(
        "SELECT id, account_id, location_id, name, address, created_at FROM locations WHERE account_id = ? ORDER BY name",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(locations)
}

/// Sync all reviews for a location from the platform into SQLite.
///
/// Reviews are upserted by their Google `review_id`. Replies already
/// published on the platform (from any channel) are carried over so the
/// suggestion workflow never targets an answered review.
pub async fn sync_reviews(
    pool: &DbPool,
    client: &GoogleClient,
    location_db_id: i64,
) -> Result<Vec<Review>, AppError> {
    let location = get_location(pool, location_db_id).await?;
    let account_name = client.primary_account_name().await?;

    let google_reviews = client
        .list_reviews(&account_name, &location.location_id)
        .await?;

    let mut synced = 0usize;
    for google_review in &google_reviews {
        if upsert_review(pool, location.id, google_review).await? {
            synced += 1;
        }
    }

    log::info!(
        "Synced {}/{} reviews for location {}",
        synced,
        google_reviews.len(),
        location.location_id
    );

    let reviews: Vec<Review> = sqlx::query_as(
        r#"
        SELECT id, location_id, review_id, author_name, rating, comment,
               reply, reply_time, created_at, synced_at
        FROM reviews WHERE location_id = ? ORDER BY created_at DESC
        "#,
    )
    .bind(location.id)
    .fetch_all(pool)
    .await?;

    Ok(reviews)
}

/// Upsert a single review row. Returns false when the review was skipped
/// (no usable star rating).
async fn upsert_review(
    pool: &DbPool,
    location_db_id: i64,
    google_review: &GoogleReview,
) -> Result<bool, AppError> {
    let Some(rating) = google_review
        .star_rating
        .as_deref()
        .and_then(star_rating_value)
    else {
        log::warn!(
            "Skipping review {} with unspecified star rating",
            google_review.review_id
        );
        return Ok(false);
    };

    let author_name = google_review
        .reviewer
        .as_ref()
        .and_then(|r| r.display_name.clone())
        .unwrap_or_else(|| "Anonymous".to_string());

    let (reply, reply_time) = match &google_review.review_reply {
        Some(reply) => (
            reply.comment.clone(),
            reply.update_time.as_deref().and_then(parse_rfc3339),
        ),
        None => (None, None),
    };

    let created_at = google_review
        .create_time
        .as_deref()
        .and_then(parse_rfc3339)
        .unwrap_or_else(crate::services::google_auth::now);

    sqlx::query(
        r#"
        INSERT INTO reviews (location_id, review_id, author_name, rating, comment,
                             reply, reply_time, created_at, synced_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, strftime('%s', 'now'))
        ON CONFLICT (review_id) DO UPDATE SET
            author_name = excluded.author_name,
            rating = excluded.rating,
            comment = excluded.comment,
            reply = excluded.reply,
            reply_time = excluded.reply_time,
            synced_at = excluded.synced_at
        "#,
    )
    .bind(location_db_id)
    .bind(&google_review.review_id)
    .bind(&author_name)
    .bind(rating)
    .bind(&google_review.comment)
    .bind(&reply)
    .bind(reply_time)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(parse_rfc3339("1970-01-01T00:00:00Z"), Some(0));
        assert_eq!(parse_rfc3339("2026-01-15T10:30:00+02:00"), Some(1768465800));
        assert_eq!(parse_rfc3339("not a timestamp"), None);
    }
}

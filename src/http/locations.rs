//! Location and review routes.

use crate::http::{ApiErr, AppState};
use crate::models::{Location, Review};
use crate::services::google_auth::{fresh_account, GoogleAuthService};
use crate::services::google_client::{GoogleClient, GoogleClientConfig};
use crate::services::replies::get_location;
use crate::services::sync;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct LocationListQuery {
    account_id: Option<i64>,
}

#[derive(Deserialize)]
struct LocationDetailQuery {
    #[serde(default)]
    include_reviews: bool,
}

/// Location detail with optionally embedded reviews.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationWithReviews {
    #[serde(flatten)]
    location: Location,
    reviews: Vec<Review>,
}

/// Build the location routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/locations/{id}", get(get_location_detail))
        .route("/locations/{account_id}/sync", post(sync_locations))
        .route("/locations/{id}/reviews", get(list_reviews))
        .route("/locations/{id}/reviews/sync", post(sync_reviews))
}

/// GET /locations?account_id=X — list locations, optionally per account.
async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<LocationListQuery>,
) -> Result<Json<Vec<Location>>, ApiErr> {
    let locations: Vec<Location> = match params.account_id {
        Some(account_id) => {
            sqlx::query_as(
                "SELECT id, account_id, location_id, name, address, created_at FROM locations WHERE account_id = ? ORDER BY name",
            )
            .bind(account_id)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT id, account_id, location_id, name, address, created_at FROM locations ORDER BY name",
            )
            .fetch_all(&state.db)
            .await?
        }
    };

    Ok(Json(locations))
}

/// GET /locations/:id?include_reviews=true — location detail.
async fn get_location_detail(
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
    Query(params): Query<LocationDetailQuery>,
) -> Result<Json<LocationWithReviews>, ApiErr> {
    let location = get_location(&state.db, location_id)
        .await
        .map_err(ApiErr::from)?;

    let reviews = if params.include_reviews {
        fetch_reviews(&state, location.id).await?
    } else {
        Vec::new()
    };

    Ok(Json(LocationWithReviews { location, reviews }))
}

/// POST /locations/:account_id/sync — pull locations from the platform.
async fn sync_locations(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<Location>>, ApiErr> {
    let client = client_for_account(&state, account_id).await?;
    let locations = sync::sync_locations(&state.db, &client, account_id)
        .await
        .map_err(ApiErr::from)?;

    Ok(Json(locations))
}

/// GET /locations/:id/reviews — list cached reviews for a location.
async fn list_reviews(
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> Result<Json<Vec<Review>>, ApiErr> {
    // Verify the location exists so a bad ID is a 404, not an empty list
    let location = get_location(&state.db, location_id)
        .await
        .map_err(ApiErr::from)?;

    let reviews = fetch_reviews(&state, location.id).await?;
    Ok(Json(reviews))
}

/// POST /locations/:id/reviews/sync — pull reviews from the platform.
async fn sync_reviews(
    State(state): State<AppState>,
    Path(location_id): Path<i64>,
) -> Result<Json<Vec<Review>>, ApiErr> {
    let location = get_location(&state.db, location_id)
        .await
        .map_err(ApiErr::from)?;

    let client = client_for_account(&state, location.account_id).await?;
    let reviews = sync::sync_reviews(&state.db, &client, location.id)
        .await
        .map_err(ApiErr::from)?;

    Ok(Json(reviews))
}

/// Build an authenticated Google client for an account, refreshing its
/// token when needed.
async fn client_for_account(state: &AppState, account_id: i64) -> Result<GoogleClient, ApiErr> {
    let auth = GoogleAuthService::new(&state.config).map_err(ApiErr::from)?;
    let account = fresh_account(&state.db, &auth, account_id)
        .await
        .map_err(ApiErr::from)?;

    GoogleClient::new(GoogleClientConfig {
        access_token: account.access_token,
        timeout_secs: state.config.request_timeout_secs,
    })
    .map_err(ApiErr::from)
}

async fn fetch_reviews(state: &AppState, location_id: i64) -> Result<Vec<Review>, ApiErr> {
    let reviews: Vec<Review> = sqlx::query_as(
        r#"
        SELECT id, location_id, review_id, author_name, rating, comment,
               reply, reply_time, created_at, synced_at
        FROM reviews WHERE location_id = ? ORDER BY created_at DESC
        "#,
    )
    .bind(location_id)
    .fetch_all(&state.db)
    .await?;

    Ok(reviews)
}

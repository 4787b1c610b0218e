//! OAuth and account routes.

use crate::error::AppError;
use crate::http::{ApiErr, AppState};
use crate::models::Account;
use crate::services::google_auth::GoogleAuthService;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Account response (safe — omits tokens).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    id: i64,
    google_email: String,
    has_refresh_token: bool,
    token_expiry: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            google_email: account.google_email,
            has_refresh_token: account.refresh_token.is_some(),
            token_expiry: account.token_expiry,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallbackResponse {
    message: String,
    account: AccountResponse,
}

/// Build the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/accounts", get(list_accounts))
        .route(
            "/auth/accounts/{id}",
            axum::routing::delete(disconnect_account),
        )
}

/// GET /auth/login — redirect to the Google consent screen.
async fn login(State(state): State<AppState>) -> Result<Redirect, ApiErr> {
    let auth = GoogleAuthService::new(&state.config).map_err(ApiErr::from)?;
    Ok(Redirect::temporary(&auth.authorization_url()))
}

/// GET /auth/callback?code=X — exchange the code and upsert the account.
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, ApiErr> {
    let auth = GoogleAuthService::new(&state.config).map_err(ApiErr::from)?;
    let tokens = auth.exchange_code(&params.code).await.map_err(ApiErr::from)?;

    // Keep the previously stored refresh token when Google does not return
    // a new one (it only does on the first consent or after revocation).
    let account: Account = sqlx::query_as(
        r#"
        INSERT INTO accounts (google_email, access_token, refresh_token, token_expiry)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (google_email) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = COALESCE(excluded.refresh_token, accounts.refresh_token),
            token_expiry = excluded.token_expiry,
            updated_at = strftime('%s', 'now')
        RETURNING id, google_email, access_token, refresh_token, token_expiry,
                  created_at, updated_at
        "#,
    )
    .bind(&tokens.email)
    .bind(&tokens.access_token)
    .bind(&tokens.refresh_token)
    .bind(tokens.token_expiry)
    .fetch_one(&state.db)
    .await?;

    log::info!("Connected Google account {}", account.google_email);

    Ok(Json(CallbackResponse {
        message: "Account connected successfully".to_string(),
        account: account.into(),
    }))
}

/// GET /auth/accounts — list connected accounts (tokens omitted).
async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, ApiErr> {
    let accounts: Vec<Account> = sqlx::query_as(
        "SELECT id, google_email, access_token, refresh_token, token_expiry, created_at, updated_at FROM accounts ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

/// DELETE /auth/accounts/:id — disconnect an account.
///
/// Cascades to its locations and reviews.
async fn disconnect_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiErr> {
    let deleted = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(account_id)
        .execute(&state.db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ApiErr::from(AppError::not_found_with_id(
            "Account",
            account_id.to_string(),
        )));
    }

    Ok(Json(serde_json::json!({
        "message": "Account disconnected successfully"
    })))
}

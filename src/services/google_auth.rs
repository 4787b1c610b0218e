//! Google OAuth 2.0 authentication service.
//!
//! Handles the consent-screen redirect, authorization-code exchange, and
//! access-token refresh against Google's token endpoint. Tokens are stored
//! on the `accounts` row and refreshed transparently before API calls.

use crate::config::{Config, GOOGLE_SCOPE};
use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::Account;
use serde::Deserialize;

/// Google OAuth consent screen URL.
const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Userinfo endpoint used to resolve the account email after consent.
const USERINFO_URI: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Refresh tokens this many seconds before they actually expire.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 300;

/// OAuth client for the Google token endpoint.
#[derive(Debug, Clone)]
pub struct GoogleAuthService {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    expires_in: i64,
}

/// Userinfo response; only the email is needed.
#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
}

/// Result of an authorization-code exchange.
#[derive(Debug)]
pub struct ExchangedTokens {
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Absolute expiry as Unix seconds.
    pub token_expiry: i64,
}

/// Result of a refresh-token grant.
#[derive(Debug)]
pub struct RefreshedToken {
    pub access_token: String,
    pub token_expiry: i64,
}

impl GoogleAuthService {
    /// Create the auth service from config.
    ///
    /// Fails with an authentication error when the OAuth client credentials
    /// are not configured.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client_id = config.google_client_id.clone().ok_or_else(|| {
            AppError::authentication("GOOGLE_CLIENT_ID is not configured")
        })?;
        let client_secret = config.google_client_secret.clone().ok_or_else(|| {
            AppError::authentication("GOOGLE_CLIENT_SECRET is not configured")
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_id,
            client_secret,
            redirect_uri: config.google_redirect_uri.clone(),
        })
    }

    /// Build the Google consent-screen URL the operator is redirected to.
    ///
    /// Requests offline access so Google issues a refresh token, and forces
    /// the consent prompt so re-connecting an account re-issues one.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&access_type=offline&include_granted_scopes=true&prompt=consent",
            AUTH_URI,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(GOOGLE_SCOPE),
        )
    }

    /// Exchange an authorization code for tokens and resolve the account email.
    pub async fn exchange_code(&self, code: &str) -> Result<ExchangedTokens, AppError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.client.post(TOKEN_URI).form(&params).send().await?;
        let tokens = Self::handle_token_response(response).await?;

        // Resolve the account email for the accounts row
        let userinfo: UserInfo = self
            .client
            .get(USERINFO_URI)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::authentication(format!("Failed to fetch user info: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::internal(format!("Failed to parse user info: {}", e)))?;

        Ok(ExchangedTokens {
            email: userinfo.email,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_expiry: now() + tokens.expires_in,
        })
    }

    /// Refresh an expired access token using the refresh token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedToken, AppError> {
        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.client.post(TOKEN_URI).form(&params).send().await?;
        let tokens = Self::handle_token_response(response).await?;

        Ok(RefreshedToken {
            access_token: tokens.access_token,
            token_expiry: now() + tokens.expires_in,
        })
    }

    async fn handle_token_response(response: reqwest::Response) -> Result<TokenResponse, AppError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<TokenResponse>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse token response: {}", e)))
        } else {
            let body = response.text().await.unwrap_or_default();
            // invalid_grant means the refresh token was revoked or expired
            if body.contains("invalid_grant") {
                Err(AppError::authentication_expired(
                    "Google refresh token expired or revoked. Please re-connect the account.",
                ))
            } else {
                Err(AppError::authentication(format!(
                    "Token request failed ({}): {}",
                    status.as_u16(),
                    body
                )))
            }
        }
    }
}

/// Load an account and make sure its access token is usable, refreshing
/// and persisting it when it expires within [`TOKEN_EXPIRY_SKEW_SECS`].
pub async fn fresh_account(
    pool: &DbPool,
    auth: &GoogleAuthService,
    account_id: i64,
) -> Result<Account, AppError> {
    let account: Option<Account> = sqlx::query_as(
        "SELECT id, google_email, access_token, refresh_token, token_expiry, created_at, updated_at FROM accounts WHERE id = ?",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    let mut account = account
        .ok_or_else(|| AppError::not_found_with_id("Account", account_id.to_string()))?;

    if !account.token_expires_within(now(), TOKEN_EXPIRY_SKEW_SECS) {
        return Ok(account);
    }

    let refresh_token = account.refresh_token.clone().ok_or_else(|| {
        AppError::authentication_expired_for_account(
            "Access token expired and no refresh token is stored. Please re-connect the account.",
            account.id,
        )
    })?;

    let refreshed = auth.refresh_access_token(&refresh_token).await?;

    sqlx::query(
        "UPDATE accounts SET access_token = ?, token_expiry = ?, updated_at = strftime('%s', 'now') WHERE id = ?",
    )
    .bind(&refreshed.access_token)
    .bind(refreshed.token_expiry)
    .bind(account.id)
    .execute(pool)
    .await?;

    log::info!("Refreshed access token for account {}", account.id);

    account.access_token = refreshed.access_token;
    account.token_expiry = Some(refreshed.token_expiry);
    Ok(account)
}

/// Current Unix timestamp.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 8000,
            data_dir: "./data".into(),
            google_client_id: Some("client-id".into()),
            google_client_secret: Some("client-secret".into()),
            google_redirect_uri: "http://localhost:8000/auth/callback".into(),
            request_timeout_secs: 30,
            cors_origins: vec![],
        }
    }

    #[test]
    fn test_authorization_url_contains_required_params() {
        let auth = GoogleAuthService::new(&test_config()).unwrap();
        let url = auth.authorization_url();

        assert!(url.starts_with(AUTH_URI));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains(&*urlencoding::encode(GOOGLE_SCOPE)));
    }

    #[test]
    fn test_new_requires_credentials() {
        let mut config = test_config();
        config.google_client_id = None;
        assert!(GoogleAuthService::new(&config).is_err());
    }
}

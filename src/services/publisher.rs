//! Publishing approved replies to the review platform.
//!
//! The [`ReplyPublisher`] trait is the seam between the approval state
//! machine and the external platform: production uses [`GooglePublisher`],
//! tests substitute a stub to exercise failure paths without network.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::Location;
use crate::services::google_auth::{fresh_account, GoogleAuthService};
use crate::services::google_client::{GoogleClient, GoogleClientConfig};
use async_trait::async_trait;

/// Sends reply text to the external review platform.
#[async_trait]
pub trait ReplyPublisher: Send + Sync {
    /// Attach `text` as the owner reply to `google_review_id`.
    ///
    /// Returns `Ok(())` only when the platform acknowledged the reply.
    /// Failures are distinguished as retryable (network, 5xx) or terminal
    /// (review no longer eligible) via [`AppError::Publish`].
    async fn publish(
        &self,
        location: &Location,
        google_review_id: &str,
        text: &str,
    ) -> Result<(), AppError>;
}

/// Production publisher backed by the Google Business Profile API.
///
/// Resolves the owning account's credentials per call (refreshing the
/// access token when needed) so a long-pending approval still publishes
/// with a valid token.
pub struct GooglePublisher {
    pool: DbPool,
    auth: GoogleAuthService,
    timeout_secs: u64,
}

impl GooglePublisher {
    pub fn new(pool: DbPool, auth: GoogleAuthService, timeout_secs: u64) -> Self {
        Self {
            pool,
            auth,
            timeout_secs,
        }
    }
}

#[async_trait]
impl ReplyPublisher for GooglePublisher {
    async fn publish(
        &self,
        location: &Location,
        google_review_id: &str,
        text: &str,
    ) -> Result<(), AppError> {
        let account = fresh_account(&self.pool, &self.auth, location.account_id).await?;

        let client = GoogleClient::new(GoogleClientConfig {
            access_token: account.access_token,
            timeout_secs: self.timeout_secs,
        })?;

        let account_name = client.primary_account_name().await?;

        client
            .update_reply(&account_name, &location.location_id, google_review_id, text)
            .await
            .map_err(classify_publish_error)?;

        log::info!(
            "Published reply to review {} at location {}",
            google_review_id,
            location.location_id
        );

        Ok(())
    }
}

/// Classify a Google API failure from the reply endpoint.
///
/// 5xx responses are worth retrying; other API rejections mean the review
/// is no longer eligible for a reply. Network and auth errors pass through
/// unchanged (both already carry their retry semantics).
fn classify_publish_error(err: AppError) -> AppError {
    match err {
        AppError::GoogleApi {
            message,
            status_code: Some(status),
            ..
        } if status >= 500 => AppError::publish_retryable(format!(
            "Google returned {} while publishing reply: {}",
            status, message
        )),
        AppError::GoogleApi {
            message,
            status_code,
            ..
        } => AppError::Publish {
            message: match status_code {
                Some(status) => format!("Google rejected the reply ({}): {}", status, message),
                None => format!("Google rejected the reply: {}", message),
            },
            retryable: false,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_5xx_as_retryable() {
        let err = classify_publish_error(AppError::google_api_full("backend error", 503, "/x"));
        assert!(err.is_retryable_publish());
    }

    #[test]
    fn test_classify_4xx_as_terminal() {
        let err = classify_publish_error(AppError::google_api_full("review deleted", 404, "/x"));
        assert!(matches!(
            err,
            AppError::Publish {
                retryable: false,
                ..
            }
        ));
    }

    #[test]
    fn test_network_errors_pass_through() {
        let err = classify_publish_error(AppError::network("timed out"));
        assert!(matches!(err, AppError::Network { .. }));
        assert!(err.is_retryable_publish());
    }

    #[test]
    fn test_auth_errors_pass_through() {
        let err = classify_publish_error(AppError::authentication_expired("expired"));
        assert!(matches!(err, AppError::AuthenticationExpired { .. }));
    }
}

//! Application error types.
//!
//! These errors are serializable and cross the HTTP boundary as structured
//! JSON; the axum layer maps each variant to a status code.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors surfaced by services and HTTP handlers.
///
/// All variants serialize to a structured JSON object for API consumers.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Google Business Profile API request failed.
    #[error("Google API error: {message}")]
    GoogleApi {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Authentication failed or credentials invalid.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Access token expired or revoked - requires re-authentication.
    #[error("Token expired: {message}")]
    AuthenticationExpired {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        account_id: Option<i64>,
    },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// A state transition was attempted from the wrong state.
    #[error("Invalid state: {message}")]
    InvalidState {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current: Option<String>,
    },

    /// No active template covers the review's rating.
    #[error("No matching template for rating {rating}")]
    NoTemplate { rating: i64 },

    /// Publishing a reply to the review platform failed.
    ///
    /// `retryable` distinguishes transient failures (network, 5xx) from
    /// terminal ones (review no longer eligible for a reply).
    #[error("Publish error: {message}")]
    Publish { message: String, retryable: bool },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a Google API error.
    pub fn google_api(message: impl Into<String>) -> Self {
        Self::GoogleApi {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create a Google API error with status code and endpoint.
    pub fn google_api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::GoogleApi {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an authentication expired error.
    pub fn authentication_expired(message: impl Into<String>) -> Self {
        Self::AuthenticationExpired {
            message: message.into(),
            account_id: None,
        }
    }

    /// Create an authentication expired error tied to an account.
    pub fn authentication_expired_for_account(
        message: impl Into<String>,
        account_id: i64,
    ) -> Self {
        Self::AuthenticationExpired {
            message: message.into(),
            account_id: Some(account_id),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
            current: None,
        }
    }

    /// Create an invalid state error recording the current state.
    pub fn invalid_state_with_current(
        message: impl Into<String>,
        current: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            message: message.into(),
            current: Some(current.into()),
        }
    }

    /// Create a no-template error for a rating.
    pub fn no_template(rating: i64) -> Self {
        Self::NoTemplate { rating }
    }

    /// Create a retryable publish error.
    pub fn publish_retryable(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
            retryable: true,
        }
    }

    /// Create a terminal publish error.
    pub fn publish_terminal(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
            retryable: false,
        }
    }

    /// Check if this error indicates a retryable publish failure.
    pub fn is_retryable_publish(&self) -> bool {
        matches!(
            self,
            Self::Publish {
                retryable: true,
                ..
            } | Self::Network { .. }
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_status() {
            Self::google_api(format!("HTTP error: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::database("connection failed");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Database\""));
        assert!(json.contains("connection failed"));
    }

    #[test]
    fn test_google_api_error_full() {
        let err = AppError::google_api_full("Not Found", 404, "/v4/accounts/1/locations/2");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status_code\":404"));
        assert!(json.contains("/v4/accounts/1/locations/2"));
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("Review", "123");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"Review\""));
        assert!(json.contains("\"id\":\"123\""));
    }

    #[test]
    fn test_publish_retryable_flag() {
        assert!(AppError::publish_retryable("timeout").is_retryable_publish());
        assert!(AppError::network("connection reset").is_retryable_publish());
        assert!(!AppError::publish_terminal("review deleted").is_retryable_publish());
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::database("error");
        let json = serde_json::to_string(&err).unwrap();
        // operation is None, so should not appear
        assert!(!json.contains("operation"));
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::invalid_state_with_current("cannot edit", "approved");
        assert_eq!(format!("{}", err), "Invalid state: cannot edit");
    }
}

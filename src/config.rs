//! Server configuration loaded from environment variables.

use crate::error::AppError;
use std::env;
use std::path::PathBuf;

/// Default OAuth scope required to manage Business Profile reviews.
pub const GOOGLE_SCOPE: &str = "https://www.googleapis.com/auth/business.manage";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub host: String,

    /// Port to bind the HTTP server to.
    pub port: u16,

    /// Directory for persistent state (SQLite database).
    /// Defaults to `./data`.
    pub data_dir: PathBuf,

    /// Google OAuth client ID. Auth endpoints fail until this is set.
    pub google_client_id: Option<String>,

    /// Google OAuth client secret.
    pub google_client_secret: Option<String>,

    /// OAuth redirect URI registered with Google.
    pub google_redirect_uri: String,

    /// Timeout for outbound Google API requests, in seconds.
    pub request_timeout_secs: u64,

    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::invalid_input_field("PORT must be a valid number", "PORT"))?;

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let google_client_id = env::var("GOOGLE_CLIENT_ID")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let google_redirect_uri = env::var("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8000/auth/callback".to_string());

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| {
                AppError::invalid_input_field(
                    "REQUEST_TIMEOUT_SECS must be a valid number",
                    "REQUEST_TIMEOUT_SECS",
                )
            })?;

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:8080".to_string(),
                ]
            });

        Ok(Config {
            host,
            port,
            data_dir,
            google_client_id,
            google_client_secret,
            google_redirect_uri,
            request_timeout_secs,
            cors_origins,
        })
    }
}

//! Business location model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Google Business Profile location synced from the platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    /// Local database ID.
    pub id: i64,

    /// Owning account's local ID.
    pub account_id: i64,

    /// Google location resource ID (the trailing segment of `locations/{id}`).
    pub location_id: String,

    /// Display name of the location.
    pub name: String,

    /// Flattened postal address (optional).
    pub address: Option<String>,

    /// Unix timestamp of creation.
    pub created_at: i64,
}

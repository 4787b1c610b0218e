//! Reply template model.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An operator-defined reply template scoped to an inclusive rating range.
///
/// `content` may contain the placeholders `{author}`, `{rating}`,
/// `{comment}` and `{location}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReplyTemplate {
    /// Local database ID.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Template body with placeholder tokens.
    pub content: String,

    /// Lowest rating this template applies to (1-5).
    pub rating_min: i64,

    /// Highest rating this template applies to (1-5).
    pub rating_max: i64,

    /// Whether the template participates in matching.
    pub is_active: bool,

    /// Unix timestamp of creation.
    pub created_at: i64,

    /// Unix timestamp of last edit.
    pub updated_at: i64,
}

impl ReplyTemplate {
    /// Check whether the template's range covers a rating.
    pub fn covers(&self, rating: i64) -> bool {
        self.rating_min <= rating && rating <= self.rating_max
    }

    /// Width of the rating range; narrower templates win tie-breaks.
    pub fn range_width(&self) -> i64 {
        self.rating_max - self.rating_min
    }
}

/// Data required to create a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub content: String,
    pub rating_min: i64,
    pub rating_max: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update for a template; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
    pub rating_min: Option<i64>,
    pub rating_max: Option<i64>,
    pub is_active: Option<bool>,
}

/// Validate a rating range: both bounds in 1..=5 and min <= max.
pub fn validate_rating_range(rating_min: i64, rating_max: i64) -> Result<(), AppError> {
    if !(1..=5).contains(&rating_min) {
        return Err(AppError::invalid_input_field(
            "ratingMin must be between 1 and 5",
            "ratingMin",
        ));
    }
    if !(1..=5).contains(&rating_max) {
        return Err(AppError::invalid_input_field(
            "ratingMax must be between 1 and 5",
            "ratingMax",
        ));
    }
    if rating_min > rating_max {
        return Err(AppError::invalid_input(
            "ratingMin must be less than or equal to ratingMax",
        ));
    }
    Ok(())
}

//! Review model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A customer review synced from Google Business Profile.
///
/// `reply` and `reply_time` mirror the reply as published on the platform;
/// local drafts live in `pending_replies` until approved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    /// Local database ID.
    pub id: i64,

    /// Owning location's local ID.
    pub location_id: i64,

    /// Google review ID.
    pub review_id: String,

    /// Reviewer's display name.
    pub author_name: String,

    /// Star rating, 1-5.
    pub rating: i64,

    /// Review text (optional; star-only reviews have none).
    pub comment: Option<String>,

    /// Published reply text (optional).
    pub reply: Option<String>,

    /// Unix timestamp the reply was published (optional).
    pub reply_time: Option<i64>,

    /// Unix timestamp the review was written.
    pub created_at: i64,

    /// Unix timestamp of the last sync that touched this row.
    pub synced_at: i64,
}

impl Review {
    /// Check if the review already has a published reply.
    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(reply: Option<&str>) -> Review {
        Review {
            id: 1,
            location_id: 1,
            review_id: "rev-1".into(),
            author_name: "Alice".into(),
            rating: 5,
            comment: Some("Great service".into()),
            reply: reply.map(String::from),
            reply_time: None,
            created_at: 0,
            synced_at: 0,
        }
    }

    #[test]
    fn test_has_reply() {
        assert!(!review(None).has_reply());
        assert!(!review(Some("")).has_reply());
        assert!(review(Some("Thanks!")).has_reply());
    }
}

//! Pending reply model and its status state machine.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of a pending reply.
///
/// Transitions: `pending -> approved` and `pending -> rejected` are
/// terminal; `pending -> pending` (edit) is the only self-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingReplyStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<&str> for PendingReplyStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for PendingReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl PendingReplyStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// A suggested reply held for operator approval.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingReply {
    /// Local database ID.
    pub id: i64,

    /// The review this suggestion belongs to (local ID).
    pub review_id: i64,

    /// Suggested reply text; overwritten by edits and approved edits.
    pub suggested_text: String,

    /// Current status: `pending`, `approved`, `rejected`.
    pub status: String,

    /// Template that produced the suggestion (if any).
    pub template_id: Option<i64>,

    /// Unix timestamp of creation.
    pub created_at: i64,

    /// Unix timestamp of the last edit or re-render.
    pub updated_at: i64,

    /// Unix timestamp of the approve/reject decision (optional).
    pub processed_at: Option<i64>,
}

impl PendingReply {
    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> PendingReplyStatus {
        PendingReplyStatus::from(self.status.as_str())
    }

    /// Check if the reply is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status_enum() == PendingReplyStatus::Pending
    }
}

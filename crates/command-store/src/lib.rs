//! Persistent storage for user-defined custom commands.
//!
//! A custom command maps a case-folded trigger to a response template. Every
//! mutation is mirrored into an append-only audit trail that outlives the
//! command itself.

mod json;

pub use json::JsonStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

pub const MIN_TRIGGER_LEN: usize = 2;
pub const MAX_TRIGGER_LEN: usize = 100;
pub const MAX_RESPONSE_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trigger must be {min}-{max} characters, got {0}", min = MIN_TRIGGER_LEN, max = MAX_TRIGGER_LEN)]
    InvalidTrigger(usize),
    #[error("response must be 1-{max} characters and not blank, got {0}", max = MAX_RESPONSE_LEN)]
    InvalidResponse(usize),
    #[error("no custom command for {0:?}")]
    NotFound(String),
    #[error("command store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("command store data is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("command store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub trigger: String,
    pub response: String,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One immutable entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: u64,
    pub action: AuditAction,
    pub trigger: String,
    /// Response as written (create/update) or as it was just before deletion.
    pub response: String,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Narrow contract the response engine and the command manager depend on.
///
/// Triggers are always case-folded by the store, so callers may pass them in
/// any case. Implementations must keep at most one live command per trigger.
pub trait CommandStore: Send + Sync {
    fn lookup(&self, trigger: &str) -> Result<Option<String>, StoreError>;

    /// All live commands ordered by trigger.
    fn list_all(&self) -> Result<Vec<CustomCommand>, StoreError>;

    /// Creates or replaces the command for `trigger` and appends one audit
    /// record. Returns which of the two happened.
    fn upsert(&self, trigger: &str, response: &str, creator: &str)
    -> Result<AuditAction, StoreError>;

    /// Removes the command and returns the response it held. A missing
    /// trigger is [`StoreError::NotFound`] and leaves the audit trail alone.
    fn delete(&self, trigger: &str, actor: &str) -> Result<String, StoreError>;

    fn creator(&self, trigger: &str) -> Result<Option<String>, StoreError>;

    /// Most recent audit entries first.
    fn audit_log(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError>;
}

#[must_use]
pub fn normalize_trigger(trigger: &str) -> String {
    trigger.trim().to_lowercase()
}

/// Validates and normalizes an upsert request, returning the folded trigger.
pub fn validate(trigger: &str, response: &str) -> Result<String, StoreError> {
    let trigger = normalize_trigger(trigger);
    let trigger_len = trigger.chars().count();
    if !(MIN_TRIGGER_LEN..=MAX_TRIGGER_LEN).contains(&trigger_len) {
        return Err(StoreError::InvalidTrigger(trigger_len));
    }
    let response_len = response.chars().count();
    if response.trim().is_empty() || response_len > MAX_RESPONSE_LEN {
        return Err(StoreError::InvalidResponse(response_len));
    }
    Ok(trigger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_folds_trigger() {
        assert_eq!(validate("  PaNiC ", "breathe").unwrap(), "panic");
    }

    #[test]
    fn validate_rejects_bad_lengths() {
        assert!(matches!(validate("x", "ok"), Err(StoreError::InvalidTrigger(1))));
        let long = "t".repeat(MAX_TRIGGER_LEN + 1);
        assert!(matches!(validate(&long, "ok"), Err(StoreError::InvalidTrigger(101))));
        assert!(matches!(validate("panic", "   "), Err(StoreError::InvalidResponse(3))));
        let long = "r".repeat(MAX_RESPONSE_LEN + 1);
        assert!(matches!(validate("panic", &long), Err(StoreError::InvalidResponse(501))));
        assert!(validate("ok", &"r".repeat(MAX_RESPONSE_LEN)).is_ok());
    }

    #[test]
    fn audit_action_serializes_lowercase() {
        let json = serde_json::to_string(&AuditAction::Update).unwrap();
        assert_eq!(json, "\"update\"");
        assert_eq!(AuditAction::Delete.as_str(), "delete");
    }
}

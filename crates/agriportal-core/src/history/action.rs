use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of mutation an action records. Only used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Restore,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action as described by the caller, before the history stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAction<P = serde_json::Value> {
    pub kind: ActionKind,
    pub resource: String,
    pub payload: P,
    pub label: String,
}

impl<P> NewAction<P> {
    pub fn new(
        kind: ActionKind,
        resource: impl Into<String>,
        payload: P,
        label: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            resource: resource.into(),
            payload,
            label: label.into(),
        }
    }
}

/// One recorded, reversible mutation.
///
/// `payload` is whatever the caller needs to reverse or replay the mutation;
/// the history never looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action<P = serde_json::Value> {
    pub id: Uuid,
    pub kind: ActionKind,
    pub resource: String,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub label: String,
}

impl<P> Action<P> {
    pub(crate) fn stamp(new: NewAction<P>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: new.kind,
            resource: new.resource,
            payload: new.payload,
            created_at: Utc::now(),
            label: new.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_assigns_unique_ids() {
        let a = Action::stamp(NewAction::new(ActionKind::Create, "articles", (), "a"));
        let b = Action::stamp(NewAction::new(ActionKind::Create, "articles", (), "b"));
        assert_ne!(a.id, b.id);
        assert!(b.created_at >= a.created_at);
        assert_eq!(a.resource, "articles");
        assert_eq!(a.label, "a");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ActionKind::Restore).unwrap();
        assert_eq!(json, "\"restore\"");
        assert_eq!(ActionKind::Update.to_string(), "update");
    }
}

//! Timeline event rows and event kinds.
//!
//! GitHub's timeline reports an open-ended set of event names. Only a few of
//! them carry extra data worth storing; [`EventKind`] says which, and
//! [`EventPayload`] holds that data so storage never has to probe fields by
//! event name.

use chrono::{DateTime, Utc};

/// The kind of a timeline event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Labeled,
    Unlabeled,
    Assigned,
    Unassigned,
    Commented,
    /// Any other event name (`opened`, `closed`, `reopened`, `renamed`, ...).
    Other(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "labeled" => Self::Labeled,
            "unlabeled" => Self::Unlabeled,
            "assigned" => Self::Assigned,
            "unassigned" => Self::Unassigned,
            "commented" => Self::Commented,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Labeled => "labeled",
            Self::Unlabeled => "unlabeled",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::Commented => "commented",
            Self::Other(name) => name,
        }
    }

    pub fn carries_label(&self) -> bool {
        matches!(self, Self::Labeled | Self::Unlabeled)
    }

    pub fn carries_assignee(&self) -> bool {
        matches!(self, Self::Assigned | Self::Unassigned)
    }

    pub fn carries_comment(&self) -> bool {
        matches!(self, Self::Commented)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific data stored alongside an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EventPayload {
    #[default]
    Empty,
    Label {
        name: Option<String>,
    },
    Assignee {
        login: Option<String>,
    },
    Comment {
        author: Option<String>,
        body: Option<String>,
    },
}

impl EventPayload {
    pub fn label_name(&self) -> Option<&str> {
        match self {
            Self::Label { name } => name.as_deref(),
            _ => None,
        }
    }

    pub fn assignee_name(&self) -> Option<&str> {
        match self {
            Self::Assignee { login } => login.as_deref(),
            _ => None,
        }
    }

    pub fn comment_author(&self) -> Option<&str> {
        match self {
            Self::Comment { author, .. } => author.as_deref(),
            _ => None,
        }
    }

    pub fn comment_body(&self) -> Option<&str> {
        match self {
            Self::Comment { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

/// One timeline event as persisted by the sink. Stored once, never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub id: i64,
    pub issue_id: i64,
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
    pub actor: Option<String>,
    pub payload: EventPayload,
}

impl EventRow {
    pub fn event_type(&self) -> &str {
        self.kind.as_str()
    }
}

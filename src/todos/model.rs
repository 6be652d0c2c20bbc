//! Todo data model — the entity and its status enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a todo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    /// Default status for newly created todos.
    #[default]
    Progress,
    Done,
}

impl TodoStatus {
    /// The DB / wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Progress => "progress",
            Self::Done => "done",
        }
    }
}

impl std::str::FromStr for TodoStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "progress" => Ok(Self::Progress),
            "done" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

/// A single todo row.
///
/// `updated_at` stays null until the first update; `deleted_at` non-null
/// marks the row soft-deleted. Both fields are always serialized,
/// as `null` when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned, immutable.
    pub id: i64,
    /// Never empty once set.
    pub title: String,
    pub status: TodoStatus,
    /// Assigned by the storage clock at insert.
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

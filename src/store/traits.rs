//! Repository trait — async query/mutation interface over the todo store.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::todos::model::{Todo, TodoStatus};

/// Rows returned by list/search when the caller gives no limit.
pub const DEFAULT_LIMIT: i64 = 10;

/// Filters for the search operation. Every field is optional and applied
/// only when present; present filters are AND-combined.
// TODO: add a created_at range filter for search
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-sensitive substring match on the title.
    pub title: Option<String>,
    /// Exact status match.
    pub status: Option<TodoStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Backend-agnostic todo repository.
///
/// Every operation targets live rows only (`deleted_at` unset); soft-
/// deleted rows are invisible here. Timestamps are assigned by the
/// storage clock, never by the caller.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Insert a new todo with the given title and default status.
    /// Returns the full created row.
    async fn create_one(&self, title: &str) -> Result<Todo, DatabaseError>;

    /// Fetch the live row with this id, or `None` if no live row matches.
    async fn find_one_by_id(&self, id: i64) -> Result<Option<Todo>, DatabaseError>;

    /// Live rows, optionally filtered by exact status, newest first,
    /// paginated (limit defaults to [`DEFAULT_LIMIT`], offset to 0).
    async fn find_list(
        &self,
        status: Option<TodoStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Todo>, DatabaseError>;

    /// As [`find_list`](Self::find_list), plus a substring match on title.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Todo>, DatabaseError>;

    /// Update the provided fields of the live row with this id and set
    /// `updated_at`, regardless of which fields changed. Returns the
    /// updated row, or `None` if no live row matched.
    async fn update_one(
        &self,
        id: i64,
        title: Option<&str>,
        status: Option<TodoStatus>,
    ) -> Result<Option<Todo>, DatabaseError>;

    /// Soft-delete the live row with this id by setting `deleted_at`.
    /// Returns the affected row, or `None` if no live row matched.
    async fn delete_one(&self, id: i64) -> Result<Option<Todo>, DatabaseError>;
}

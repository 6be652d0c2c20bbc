//! Error types for the todo service.

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Closed taxonomy of failures surfaced to API clients.
///
/// Each variant fixes its machine code and human message; the HTTP
/// responder maps variants to statuses exhaustively. The message is the
/// `Display` output; sources are for logs, never for response bodies.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("target Todo does not exist")]
    NotFound,

    #[error("error during single Todo retrieval")]
    Retrieval(#[source] DatabaseError),

    #[error("error during Todo list retrieval")]
    List(#[source] DatabaseError),

    #[error("error during Todo search")]
    Search(#[source] DatabaseError),

    #[error("error during Todo creation")]
    Create(#[source] DatabaseError),

    #[error("error during Todo deletion")]
    Delete(#[source] DatabaseError),

    #[error("error during Todo update")]
    Update(#[source] DatabaseError),

    #[error("unexpected error occurred")]
    Unexpected(String),
}

impl TodoError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "TODO_NOT_FOUND",
            Self::Retrieval(_) => "TODO_ID_ERROR",
            Self::List(_) => "TODO_LIST_ERROR",
            Self::Search(_) => "TODO_SEARCH_ERROR",
            Self::Create(_) => "TODO_CREATE_ERROR",
            Self::Delete(_) => "TODO_DELETE_ERROR",
            Self::Update(_) => "TODO_UPDATE_ERROR",
            Self::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }
}

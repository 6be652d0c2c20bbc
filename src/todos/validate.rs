//! Pure request validation — per-route shape contracts.
//!
//! Each route declares a typed input struct and a parse function turning
//! raw request material (path param string, query-string map, body bytes)
//! into it. Parsing either succeeds completely or fails with every
//! violated field constraint; nothing is partially applied and no I/O
//! happens here.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::todos::model::TodoStatus;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl FieldIssue {
    fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

/// Validation failure: the ordered list of violated constraints.
#[derive(Debug, Clone, thiserror::Error)]
#[error("request validation failed")]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    fn single(issue: FieldIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

// ── Typed per-route inputs ──────────────────────────────────────────

/// POST /todos body.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTodoInput {
    pub title: String,
}

/// PATCH /todos/{id} body. Both fields optional; `{}` is a valid no-op
/// patch (it still touches `updated_at`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateTodoInput {
    pub title: Option<String>,
    pub status: Option<TodoStatus>,
}

/// GET /todos query string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub status: Option<TodoStatus>,
}

/// GET /todos/search query string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub status: Option<TodoStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ── Parse functions ─────────────────────────────────────────────────

/// Parse and validate a POST /todos body: `{ title: non-empty string }`.
pub fn create_body(raw: &[u8]) -> Result<CreateTodoInput, ValidationError> {
    let body = parse_body(raw)?;
    match title_field(&body) {
        Ok(Some(title)) => Ok(CreateTodoInput { title }),
        Ok(None) => Err(ValidationError::single(FieldIssue::new(
            "title",
            "required",
            "title is required",
        ))),
        Err(issue) => Err(ValidationError::single(issue)),
    }
}

/// Coerce an `{id}` path parameter into an integer.
pub fn id_param(raw: &str) -> Result<i64, ValidationError> {
    raw.parse().map_err(|_| {
        ValidationError::single(FieldIssue::new(
            "id",
            "invalid_integer",
            "id must be an integer",
        ))
    })
}

/// Parse and validate a PATCH /todos/{id} body:
/// `{ title?: non-empty string, status?: pending|progress|done }`.
pub fn update_body(raw: &[u8]) -> Result<UpdateTodoInput, ValidationError> {
    let body = parse_body(raw)?;
    let mut issues = Vec::new();

    let title = title_field(&body).unwrap_or_else(|issue| {
        issues.push(issue);
        None
    });
    let status = status_field(&body).unwrap_or_else(|issue| {
        issues.push(issue);
        None
    });

    if issues.is_empty() {
        Ok(UpdateTodoInput { title, status })
    } else {
        Err(ValidationError { issues })
    }
}

/// Parse a GET /todos query string: `{ status?: enum }`.
pub fn list_query(query: &HashMap<String, String>) -> Result<ListQuery, ValidationError> {
    match status_param(query) {
        Ok(status) => Ok(ListQuery { status }),
        Err(issue) => Err(ValidationError::single(issue)),
    }
}

/// Parse a GET /todos/search query string:
/// `{ title?: non-empty, status?: enum, limit?: >= 1, offset?: >= 0 }`.
pub fn search_query(query: &HashMap<String, String>) -> Result<SearchQuery, ValidationError> {
    let mut issues = Vec::new();

    let title = match query.get("title") {
        None => None,
        Some(s) if s.is_empty() => {
            issues.push(FieldIssue::new("title", "empty", "title must not be empty"));
            None
        }
        Some(s) => Some(s.clone()),
    };
    let status = status_param(query).unwrap_or_else(|issue| {
        issues.push(issue);
        None
    });
    let limit = int_param(query, "limit", 1).unwrap_or_else(|issue| {
        issues.push(issue);
        None
    });
    let offset = int_param(query, "offset", 0).unwrap_or_else(|issue| {
        issues.push(issue);
        None
    });

    if issues.is_empty() {
        Ok(SearchQuery {
            title,
            status,
            limit,
            offset,
        })
    } else {
        Err(ValidationError { issues })
    }
}

// ── Field helpers ───────────────────────────────────────────────────

/// Parse body bytes into a JSON object. Anything else is one `body` issue.
fn parse_body(raw: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    let invalid = || {
        ValidationError::single(FieldIssue::new(
            "body",
            "invalid_type",
            "body must be a JSON object",
        ))
    };
    match serde_json::from_slice(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid()),
        Err(_) => Err(invalid()),
    }
}

/// `title` in a body object: `Ok(None)` when absent, issue when invalid.
fn title_field(body: &Map<String, Value>) -> Result<Option<String>, FieldIssue> {
    match body.get("title") {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => {
            Err(FieldIssue::new("title", "empty", "title must not be empty"))
        }
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(FieldIssue::new(
            "title",
            "invalid_type",
            "title must be a string",
        )),
    }
}

/// `status` in a body object: `Ok(None)` when absent, issue when invalid.
fn status_field(body: &Map<String, Value>) -> Result<Option<TodoStatus>, FieldIssue> {
    match body.get("status") {
        None => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some).map_err(|_| invalid_enum()),
        Some(_) => Err(FieldIssue::new(
            "status",
            "invalid_type",
            "status must be a string",
        )),
    }
}

/// `status` in a query-string map.
fn status_param(query: &HashMap<String, String>) -> Result<Option<TodoStatus>, FieldIssue> {
    match query.get("status") {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| invalid_enum()),
    }
}

/// Integer query param bounded below by `min`.
fn int_param(
    query: &HashMap<String, String>,
    field: &'static str,
    min: i64,
) -> Result<Option<i64>, FieldIssue> {
    match query.get(field) {
        None => Ok(None),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= min => Ok(Some(n)),
            Ok(_) => Err(FieldIssue::new(
                field,
                "out_of_range",
                format!("{field} must be at least {min}"),
            )),
            Err(_) => Err(FieldIssue::new(
                field,
                "invalid_integer",
                format!("{field} must be an integer"),
            )),
        },
    }
}

fn invalid_enum() -> FieldIssue {
    FieldIssue::new(
        "status",
        "invalid_enum",
        "status must be one of pending, progress, done",
    )
}

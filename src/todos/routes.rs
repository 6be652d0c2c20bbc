//! HTTP surface — one handler per todo operation.
//!
//! Every handler runs the same pipeline: validate the raw input, perform
//! exactly one repository operation (id-addressed mutations do an
//! existence pre-check first), classify any failure once, respond.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::error::{DatabaseError, TodoError};
use crate::store::TodoStore;
use crate::store::traits::SearchFilter;
use crate::todos::model::Todo;
use crate::todos::validate::{self, ValidationError};

/// Shared state for todo routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
}

/// Build the Axum router for the todo API.
pub fn todo_routes(store: Arc<dyn TodoStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/search", get(search_todos))
        .route(
            "/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .layer(CatchPanicLayer::custom(unexpected_error_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Error responder ─────────────────────────────────────────────────

/// Failure surfaced by a handler: a rejected request or a classified
/// domain error.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Domain(TodoError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        Self::Domain(err)
    }
}

/// Fixed error body for classified failures.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(err) => {
                warn!(issues = ?err.issues, "Request validation failed");
                (StatusCode::BAD_REQUEST, Json(err.issues)).into_response()
            }
            Self::Domain(err) => {
                let status = match &err {
                    TodoError::NotFound => StatusCode::NOT_FOUND,
                    TodoError::Retrieval(_)
                    | TodoError::List(_)
                    | TodoError::Search(_)
                    | TodoError::Create(_)
                    | TodoError::Delete(_)
                    | TodoError::Update(_)
                    | TodoError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                // Internal detail goes to the log; the body carries only
                // the fixed code and message.
                error!(code = err.code(), detail = ?err, "Todo operation failed");
                (
                    status,
                    Json(ErrorBody {
                        code: err.code(),
                        message: err.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Catch-all for panics escaping a handler.
fn unexpected_error_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };

    let err = TodoError::Unexpected(detail);
    error!(code = err.code(), detail = ?err, "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            code: err.code(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "todo-api"
    }))
}

/// POST /todos
async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Todo>, ApiError> {
    let input = validate::create_body(&body)?;
    let todo = state
        .store
        .create_one(&input.title)
        .await
        .map_err(TodoError::Create)?;
    Ok(Json(todo))
}

/// GET /todos/{id}
async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = validate::id_param(&id)?;
    match state
        .store
        .find_one_by_id(id)
        .await
        .map_err(TodoError::Retrieval)?
    {
        Some(todo) => Ok(Json(todo)),
        None => Err(TodoError::NotFound.into()),
    }
}

/// GET /todos
async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let query = validate::list_query(&params)?;
    let todos = state
        .store
        .find_list(query.status, None, None)
        .await
        .map_err(TodoError::List)?;
    Ok(Json(todos))
}

/// GET /todos/search
async fn search_todos(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let query = validate::search_query(&params)?;
    let filter = SearchFilter {
        title: query.title,
        status: query.status,
        limit: query.limit,
        offset: query.offset,
    };
    let todos = state.store.search(&filter).await.map_err(TodoError::Search)?;
    Ok(Json(todos))
}

/// PATCH /todos/{id}
async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Todo>, ApiError> {
    let id = validate::id_param(&id)?;
    let input = validate::update_body(&body)?;

    // 404 before mutating, so "not found" is never conflated with a
    // failed update.
    if state
        .store
        .find_one_by_id(id)
        .await
        .map_err(TodoError::Update)?
        .is_none()
    {
        return Err(TodoError::NotFound.into());
    }

    match state
        .store
        .update_one(id, input.title.as_deref(), input.status)
        .await
        .map_err(TodoError::Update)?
    {
        Some(todo) => Ok(Json(todo)),
        // Row vanished between the check and the mutation.
        None => Err(TodoError::Update(DatabaseError::Query(
            "update_one: no live row affected".into(),
        ))
        .into()),
    }
}

/// DELETE /todos/{id}
async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = validate::id_param(&id)?;

    if state
        .store
        .find_one_by_id(id)
        .await
        .map_err(TodoError::Delete)?
        .is_none()
    {
        return Err(TodoError::NotFound.into());
    }

    match state
        .store
        .delete_one(id)
        .await
        .map_err(TodoError::Delete)?
    {
        Some(_) => Ok(StatusCode::OK),
        None => Err(TodoError::Delete(DatabaseError::Query(
            "delete_one: no live row affected".into(),
        ))
        .into()),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

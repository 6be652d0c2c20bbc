//! libSQL backend — async `TodoStore` implementation.
//!
//! Supports local file and in-memory databases. Soft-delete and
//! timestamp maintenance live here: every live-row path is guarded by
//! `deleted_at IS NULL`, and every timestamp comes from the storage
//! clock (`DATETIME('now')`), never from the caller.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, Value, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{DEFAULT_LIMIT, SearchFilter, TodoStore};
use crate::todos::model::{Todo, TodoStatus};

/// libSQL todo store.
///
/// Holds a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async
/// use; the engine serializes writes itself.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;

        let backend = Self::from_db(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::from_db(db).await
    }

    async fn from_db(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Shared SELECT for list and search: live rows, optional AND-combined
    /// filters, newest first. `instr` gives the case-sensitive substring
    /// match (`LIKE` is case-insensitive in SQLite); `id` breaks ties
    /// within one clock second of `created_at`.
    async fn select_live(
        &self,
        title: Option<&str>,
        status: Option<TodoStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Todo>, DatabaseError> {
        let mut sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE deleted_at IS NULL");
        let mut args: Vec<Value> = Vec::new();

        if let Some(title) = title {
            args.push(Value::Text(title.to_string()));
            sql.push_str(&format!(" AND instr(title, ?{}) > 0", args.len()));
        }
        if let Some(status) = status {
            args.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", args.len()));
        }

        args.push(Value::Integer(limit));
        sql.push_str(&format!(
            " ORDER BY created_at DESC, id DESC LIMIT ?{}",
            args.len()
        ));
        args.push(Value::Integer(offset));
        sql.push_str(&format!(" OFFSET ?{}", args.len()));

        let mut rows = self
            .conn()
            .query(&sql, args)
            .await
            .map_err(|e| DatabaseError::Query(format!("select_live: {e}")))?;

        let mut todos = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_todo(&row) {
                Ok(todo) => todos.push(todo),
                Err(e) => {
                    tracing::warn!("Skipping todo row: {e}");
                }
            }
        }
        Ok(todos)
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // SQLite DATETIME('now') output, with or without fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

/// Map a libsql Row to a Todo.
///
/// Column order matches TODO_COLUMNS:
/// 0:id, 1:title, 2:status, 3:created_at, 4:updated_at, 5:deleted_at
fn row_to_todo(row: &libsql::Row) -> Result<Todo, libsql::Error> {
    let status_str: String = row.get(2)?;
    let created_str: String = row.get(3)?;
    let updated_str: Option<String> = row.get(4).ok();
    let deleted_str: Option<String> = row.get(5).ok();

    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        status: status_str.parse().unwrap_or_default(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_optional_datetime(&updated_str),
        deleted_at: parse_optional_datetime(&deleted_str),
    })
}

/// Classify a libsql error for a mutation: constraint violations are
/// reported distinctly from other query failures.
fn mutation_error(op: &str, e: libsql::Error) -> DatabaseError {
    let msg = e.to_string();
    if msg.to_ascii_lowercase().contains("constraint") {
        DatabaseError::Constraint(format!("{op}: {msg}"))
    } else {
        DatabaseError::Query(format!("{op}: {msg}"))
    }
}

// ── Trait implementation ────────────────────────────────────────────

const TODO_COLUMNS: &str = "id, title, status, created_at, updated_at, deleted_at";

#[async_trait]
impl TodoStore for LibSqlBackend {
    async fn create_one(&self, title: &str) -> Result<Todo, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("INSERT INTO todos (title) VALUES (?1) RETURNING {TODO_COLUMNS}"),
                params![title],
            )
            .await
            .map_err(|e| mutation_error("create_one", e))?;

        let row = rows
            .next()
            .await
            .map_err(|e| mutation_error("create_one", e))?
            .ok_or_else(|| DatabaseError::Query("create_one: insert returned no row".into()))?;

        let todo = row_to_todo(&row).map_err(|e| DatabaseError::Query(format!("create_one: {e}")))?;
        debug!(id = todo.id, "Todo created");
        Ok(todo)
    }

    async fn find_one_by_id(&self, id: i64) -> Result<Option<Todo>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1 AND deleted_at IS NULL LIMIT 1"
                ),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_one_by_id: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("find_one_by_id: {e}")))?
        {
            Some(row) => {
                let todo = row_to_todo(&row)
                    .map_err(|e| DatabaseError::Query(format!("find_one_by_id: {e}")))?;
                Ok(Some(todo))
            }
            None => Ok(None),
        }
    }

    async fn find_list(
        &self,
        status: Option<TodoStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Todo>, DatabaseError> {
        self.select_live(
            None,
            status,
            limit.unwrap_or(DEFAULT_LIMIT),
            offset.unwrap_or(0),
        )
        .await
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Todo>, DatabaseError> {
        self.select_live(
            filter.title.as_deref(),
            filter.status,
            filter.limit.unwrap_or(DEFAULT_LIMIT),
            filter.offset.unwrap_or(0),
        )
        .await
    }

    async fn update_one(
        &self,
        id: i64,
        title: Option<&str>,
        status: Option<TodoStatus>,
    ) -> Result<Option<Todo>, DatabaseError> {
        // updated_at is set by the application on every update, whatever
        // the field set, rather than by a trigger.
        let mut sets = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(title) = title {
            args.push(Value::Text(title.to_string()));
            sets.push(format!("title = ?{}", args.len()));
        }
        if let Some(status) = status {
            args.push(Value::Text(status.as_str().to_string()));
            sets.push(format!("status = ?{}", args.len()));
        }
        sets.push("updated_at = DATETIME('now')".to_string());

        args.push(Value::Integer(id));
        let sql = format!(
            "UPDATE todos SET {} WHERE id = ?{} AND deleted_at IS NULL RETURNING {TODO_COLUMNS}",
            sets.join(", "),
            args.len()
        );

        let mut rows = self
            .conn()
            .query(&sql, args)
            .await
            .map_err(|e| mutation_error("update_one", e))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("update_one: {e}")))?
        {
            Some(row) => {
                let todo =
                    row_to_todo(&row).map_err(|e| DatabaseError::Query(format!("update_one: {e}")))?;
                debug!(id, "Todo updated");
                Ok(Some(todo))
            }
            None => Ok(None),
        }
    }

    async fn delete_one(&self, id: i64) -> Result<Option<Todo>, DatabaseError> {
        // Soft delete: only ever sets deleted_at. The live-row guard makes
        // a repeated delete affect nothing instead of moving the timestamp.
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "UPDATE todos SET deleted_at = DATETIME('now') \
                     WHERE id = ?1 AND deleted_at IS NULL RETURNING {TODO_COLUMNS}"
                ),
                params![id],
            )
            .await
            .map_err(|e| mutation_error("delete_one", e))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_one: {e}")))?
        {
            Some(row) => {
                let todo =
                    row_to_todo(&row).map_err(|e| DatabaseError::Query(format!("delete_one: {e}")))?;
                debug!(id, "Todo soft-deleted");
                Ok(Some(todo))
            }
            None => Ok(None),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

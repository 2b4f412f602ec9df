use std::{fs, path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::{Listing, StoreError, StoreResult, TodoStore},
    todo::{Priority, Todo, TodoId, UpdateTodo},
    update::{assignments, FieldValue},
};

use super::parse_timestamp;

const COLUMNS: &str = "id, text, completed, priority, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteTodoStore {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        ensure_database_file(database_url)?;
        // Every connection to `:memory:` is its own database, so pin a single one.
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(database_url).await?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                completed INTEGER NOT NULL,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Listing> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM todos ORDER BY created_at"))
            .fetch_all(&*self.pool)
            .await
            .map_err(unavailable)?;
        let items = rows.iter().map(row_to_todo).collect::<StoreResult<Vec<_>>>()?;
        Ok(Listing::new(items))
    }

    async fn create_if_absent(&self, todo: &Todo) -> StoreResult<()> {
        let result = sqlx::query(&format!("INSERT INTO todos ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"))
            .bind(todo.id.as_str())
            .bind(&todo.text)
            .bind(todo.completed)
            .bind(todo.priority.as_str())
            .bind(todo.created_at.to_rfc3339())
            .bind(todo.updated_at.to_rfc3339())
            .execute(&*self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::AlreadyExists(todo.id.clone())),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn update_if_present(&self, id: &TodoId, patch: &UpdateTodo) -> StoreResult<Todo> {
        let list = assignments(patch, Utc::now());
        let set = list.iter().map(|a| format!("{} = ?", a.field.column())).collect::<Vec<_>>().join(", ");
        let sql = format!("UPDATE todos SET {set} WHERE id = ? RETURNING {COLUMNS}");

        let mut query = sqlx::query(&sql);
        for a in &list {
            query = match &a.value {
                FieldValue::Str(s) => query.bind(s.as_str()),
                FieldValue::Bool(b) => query.bind(*b),
            };
        }
        let row = query
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(unavailable)?;
        match row {
            Some(row) => row_to_todo(&row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    async fn delete_if_present(&self, id: &TodoId) -> StoreResult<Todo> {
        let row = sqlx::query(&format!("DELETE FROM todos WHERE id = ?1 RETURNING {COLUMNS}"))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(unavailable)?;
        match row {
            Some(row) => row_to_todo(&row),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }
}

fn unavailable(e: sqlx::Error) -> StoreError { StoreError::Unavailable(e.to_string()) }

fn row_to_todo(row: &SqliteRow) -> StoreResult<Todo> {
    let get = |e: sqlx::Error| StoreError::Malformed(e.to_string());
    let id: String = row.try_get("id").map_err(get)?;
    let priority_str: String = row.try_get("priority").map_err(get)?;
    let created_at_str: String = row.try_get("created_at").map_err(get)?;
    let updated_at_str: String = row.try_get("updated_at").map_err(get)?;

    let priority = Priority::parse(&priority_str)
        .ok_or_else(|| StoreError::Malformed(format!("todo {id}: unknown priority {priority_str:?}")))?;

    Ok(Todo {
        text: row.try_get("text").map_err(get)?,
        completed: row.try_get("completed").map_err(get)?,
        priority,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
        id: TodoId(id),
    })
}

/// File path behind a `sqlite:` URL, or `None` for in-memory databases.
fn database_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://").or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty() && !path.starts_with(":memory:")).then(|| Path::new(path))
}

/// SQLite refuses to open a file whose directory is missing, so create both up front.
fn ensure_database_file(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_path(database_url) else { return Ok(()) };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    if !path.exists() {
        fs::File::create(path)?;
    }
    Ok(())
}

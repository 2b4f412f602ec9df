use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::repository::{Listing, StoreError, TodoStore};
use crate::domain::todo::{CreateTodo, Todo, TodoId, UpdateTodo};

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("todo {0} not found")]
    NotFound(TodoId),
    /// Duplicate id on creation. Ids are generated fresh, so this signals a store fault.
    #[error("todo {0} already exists")]
    Conflict(TodoId),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TodoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TodoError::NotFound(id),
            StoreError::AlreadyExists(id) => TodoError::Conflict(id),
            other => TodoError::Store(other),
        }
    }
}

pub type TodoResult<T> = Result<T, TodoError>;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo>;
    async fn list(&self) -> TodoResult<Listing>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo>;
    async fn delete(&self, id: TodoId) -> TodoResult<Todo>;
}

pub struct TodoServiceImpl<S: TodoStore + ?Sized> {
    store: Arc<S>,
}

impl<S: TodoStore + ?Sized> Clone for TodoServiceImpl<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: TodoStore> TodoServiceImpl<S> {
    pub fn new(store: S) -> Self { Self { store: Arc::new(store) } }
}

impl<S: TodoStore + ?Sized> TodoServiceImpl<S> {
    pub fn from_arc(store: Arc<S>) -> Self { Self { store } }
}

#[async_trait]
impl<S: TodoStore + ?Sized> TodoService for TodoServiceImpl<S> {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo> {
        let todo = Todo::new(input, Utc::now());
        self.store.create_if_absent(&todo).await?;
        tracing::info!(id = %todo.id, priority = todo.priority.as_str(), "created todo");
        Ok(todo)
    }

    async fn list(&self) -> TodoResult<Listing> {
        let listing = self.store.list_all().await?;
        tracing::debug!(count = listing.count, "listed todos");
        Ok(listing)
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        let todo = self.store.update_if_present(&id, &input).await?;
        tracing::info!(id = %todo.id, touch_only = input.is_empty(), "updated todo");
        Ok(todo)
    }

    async fn delete(&self, id: TodoId) -> TodoResult<Todo> {
        let todo = self.store.delete_if_present(&id).await?;
        tracing::info!(id = %todo.id, "deleted todo");
        Ok(todo)
    }
}

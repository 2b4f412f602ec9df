use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    repository::{Listing, StoreError, StoreResult, TodoStore},
    todo::{Todo, TodoId, UpdateTodo},
};

/// Process-local store with the same conditional semantics as the remote backends.
#[derive(Clone, Default)]
pub struct MemoryTodoStore {
    items: Arc<RwLock<HashMap<TodoId, Todo>>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list_all(&self) -> StoreResult<Listing> {
        let mut items: Vec<Todo> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(Listing::new(items))
    }

    async fn create_if_absent(&self, todo: &Todo) -> StoreResult<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&todo.id) {
            return Err(StoreError::AlreadyExists(todo.id.clone()));
        }
        items.insert(todo.id.clone(), todo.clone());
        Ok(())
    }

    async fn update_if_present(&self, id: &TodoId, patch: &UpdateTodo) -> StoreResult<Todo> {
        let mut items = self.items.write().await;
        let todo = items.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if let Some(t) = &patch.text { todo.text = t.clone(); }
        if let Some(c) = patch.completed { todo.completed = c; }
        if let Some(p) = patch.priority { todo.priority = p; }
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    async fn delete_if_present(&self, id: &TodoId) -> StoreResult<Todo> {
        self.items.write().await.remove(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

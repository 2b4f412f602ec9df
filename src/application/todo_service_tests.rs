#[cfg(test)]
mod tests {
    use super::super::todo_service::{TodoError, TodoService, TodoServiceImpl};
    use crate::domain::{
        repository::{Listing, StoreError, StoreResult, TodoStore},
        todo::{CreateTodo, Priority, Todo, TodoId, UpdateTodo},
    };
    use crate::infrastructure::memory_store::MemoryTodoStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Rejects every insert as a duplicate and every read as unreachable.
    struct BrokenStore;

    #[async_trait]
    impl TodoStore for BrokenStore {
        async fn list_all(&self) -> StoreResult<Listing> { Err(StoreError::Unavailable("connection refused".into())) }
        async fn create_if_absent(&self, todo: &Todo) -> StoreResult<()> { Err(StoreError::AlreadyExists(todo.id.clone())) }
        async fn update_if_present(&self, id: &TodoId, _: &UpdateTodo) -> StoreResult<Todo> { Err(StoreError::NotFound(id.clone())) }
        async fn delete_if_present(&self, _: &TodoId) -> StoreResult<Todo> { Err(StoreError::Malformed("bad item".into())) }
    }

    fn input(text: &str) -> CreateTodo { CreateTodo::new(Some(text), None).unwrap() }

    #[tokio::test]
    async fn unit_create_applies_defaults() {
        let service = TodoServiceImpl::new(MemoryTodoStore::new());
        let created = service.create(input("X")).await.unwrap();
        assert_eq!(created.text, "X");
        assert!(!created.completed);
        assert_eq!(created.priority, Priority::Medium);
        assert_eq!(created.created_at, created.updated_at);

        let listing = service.list().await.unwrap();
        assert_eq!(listing.count, 1);
        assert_eq!(listing.items[0].id, created.id);
    }

    #[tokio::test]
    async fn unit_update_then_delete() {
        let service = TodoServiceImpl::new(MemoryTodoStore::new());
        let created = service.create(input("first")).await.unwrap();
        let patch = UpdateTodo { priority: Some(Priority::High), ..Default::default() };
        let updated = service.update(created.id.clone(), patch).await.unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.text, "first");

        let deleted = service.delete(created.id.clone()).await.unwrap();
        assert_eq!(deleted.priority, Priority::High);
        assert!(matches!(service.delete(created.id).await, Err(TodoError::NotFound(_))));
    }

    #[tokio::test]
    async fn unit_store_errors_are_classified() {
        let service = TodoServiceImpl::from_arc(Arc::new(BrokenStore) as Arc<dyn TodoStore>);
        assert!(matches!(service.create(input("dup")).await, Err(TodoError::Conflict(_))));
        assert!(matches!(service.list().await, Err(TodoError::Store(StoreError::Unavailable(_)))));
        assert!(matches!(service.update("x".into(), UpdateTodo::default()).await, Err(TodoError::NotFound(_))));
        assert!(matches!(service.delete("x".into()).await, Err(TodoError::Store(StoreError::Malformed(_)))));
    }
}

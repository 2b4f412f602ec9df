use async_trait::async_trait;

use super::todo::{Todo, TodoId, UpdateTodo};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("todo {0} already exists")]
    AlreadyExists(TodoId),
    #[error("todo {0} not found")]
    NotFound(TodoId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub items: Vec<Todo>,
    pub count: usize,
}

impl Listing {
    pub fn new(items: Vec<Todo>) -> Self {
        let count = items.len();
        Self { items, count }
    }
}

/// Key-value persistence with existence-conditioned writes.
#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    async fn init(&self) -> StoreResult<()> { Ok(()) }
    async fn list_all(&self) -> StoreResult<Listing>;
    /// Fails with `AlreadyExists` if a record with the same id is present.
    async fn create_if_absent(&self, todo: &Todo) -> StoreResult<()>;
    /// Applies only the supplied fields and stamps `updatedAt`. Returns the new state.
    async fn update_if_present(&self, id: &TodoId, patch: &UpdateTodo) -> StoreResult<Todo>;
    /// Returns the state the record had before removal.
    async fn delete_if_present(&self, id: &TodoId) -> StoreResult<Todo>;
}

use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoFilter, TodoId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    /// スロットリングや通信断など、再試行で回復しうるエラー
    #[error("Transient store error: {0}")]
    Transient(String),

    /// 同じキーに別の内容が保存済み
    #[error("Conflicting item: {0}")]
    Conflict(String),

    #[error("Invalid stored item: {0}")]
    InvalidItem(String),

    #[error("Seed error: {0}")]
    Seed(String),
}

impl RepositoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::Transient(_))
    }
}

/// ToDo ストアの抽象
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// 条件に合う ToDo を作成順（order_by 指定時はその順）で返す
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepositoryError>;

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError>;

    /// ID を採番して保存する。内容の重複チェックは行わない
    async fn insert(&self, new_todo: NewTodo) -> Result<Todo, RepositoryError>;

    async fn all(&self) -> Result<Vec<Todo>, RepositoryError> {
        self.list(&TodoFilter::default()).await
    }
}

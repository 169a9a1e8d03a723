use crate::repository::{RepositoryError, TodoRepository};
use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoFilter, TodoId};
use tokio::sync::RwLock;
use tracing::debug;

/// プロセス内に保持する ToDo ストア（開発/テスト用）
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存の ToDo をそのまま保持した状態で作成する
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: RwLock::new(todos),
        }
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepositoryError> {
        let todos = self.todos.read().await;
        Ok(filter.apply(todos.iter().cloned()))
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().find(|t| &t.id == id).cloned())
    }

    async fn insert(&self, new_todo: NewTodo) -> Result<Todo, RepositoryError> {
        let todo = new_todo.into_todo(TodoId::new());
        self.todos.write().await.push(todo.clone());
        debug!(todo_id = %todo.id, owner = %todo.owner, "todo stored in memory");
        Ok(todo)
    }
}

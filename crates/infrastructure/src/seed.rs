use crate::repository::{RepositoryError, TodoRepository};
use domain::NewTodo;
use std::path::Path;
use tracing::info;

/// JSON 配列形式のシードファイルを読み込む
pub async fn load_seed_file(path: &Path) -> Result<Vec<NewTodo>, RepositoryError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RepositoryError::Seed(format!("{}: {e}", path.display())))?;

    serde_json::from_str(&raw)
        .map_err(|e| RepositoryError::Seed(format!("{}: {e}", path.display())))
}

/// シードをストアに投入し、投入件数を返す
pub async fn seed_repository(
    repo: &dyn TodoRepository,
    todos: Vec<NewTodo>,
) -> Result<usize, RepositoryError> {
    let count = todos.len();
    for todo in todos {
        repo.insert(todo).await?;
    }
    info!(count, "seeded todo store");
    Ok(count)
}

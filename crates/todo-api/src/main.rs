//! todo-api バイナリのエントリポイント

use anyhow::Context;
use infrastructure::{
    load_seed_file, seed_repository, DynamoDbClient, DynamoTodoRepository, InMemoryTodoRepository,
    TodoRepository,
};
use shared::{init_tracing, Config, StoreBackend};
use std::sync::Arc;
use todo_api::{app_with_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format).map_err(|e| anyhow::anyhow!(e))?;

    let repo: Arc<dyn TodoRepository> = match config.store {
        StoreBackend::Memory => Arc::new(InMemoryTodoRepository::new()),
        StoreBackend::DynamoDb => {
            let db = DynamoDbClient::new(&config).await;
            Arc::new(DynamoTodoRepository::new(db))
        }
    };

    if let Some(path) = &config.seed_file {
        let todos = load_seed_file(path).await?;
        seed_repository(repo.as_ref(), todos).await?;
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        environment = %config.environment,
        store = ?config.store,
        "server starting"
    );

    axum::serve(listener, app_with_state(AppState::new(repo)))
        .await
        .context("server error")?;

    Ok(())
}

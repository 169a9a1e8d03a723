//! ToDo ストアの HTTP API（axum）
//!
//! - `/api/todos` 系: JSON API
//! - `/todos`: HTML 一覧画面（E2E テスト対象）

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use infrastructure::{InMemoryTodoRepository, TodoRepository};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes;

pub use error::ApiError;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn TodoRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &Arc<dyn TodoRepository> {
        &self.repo
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()))
    }
}

/// インメモリストアでルータを構築
pub fn app() -> Router {
    app_with_state(AppState::default())
}

/// 外部から状態を注入できる版
pub fn app_with_state(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::api::health))
        .route("/api/todos", get(routes::api::list_todos))
        .route("/api/todos/new", post(routes::api::add_new_todo))
        .route("/api/todos/:id", get(routes::api::get_todo))
        .route("/api/todoSummary", get(routes::api::todo_summary))
        .route(
            "/todos",
            get(routes::view::todo_list_page).post(routes::view::add_todo_form),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

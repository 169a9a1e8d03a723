//! JSON API ハンドラ（`/api` 配下）

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{NewTodo, Todo, TodoFilter, TodoId, TodoQuery, TodoSummary};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

/// GET /api/todos
pub async fn list_todos(
    State(state): State<AppState>,
    Query(query): Query<TodoQuery>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let filter = TodoFilter::try_from(query)?;
    let todos = state.repo.list(&filter).await?;
    Ok(Json(todos))
}

/// GET /api/todos/:id
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let todo_id = TodoId::parse(&id).map_err(|_| {
        ApiError::BadRequest(format!("The requested todo id {id} wasn't a legal todo id."))
    })?;

    state
        .repo
        .get(&todo_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("The requested todo with id {id} was not found")))
}

/// POST /api/todos/new
///
/// 成否を JSON の真偽値で返す。形式不正は `false`（ログのみ）、
/// ストア障害はエラーレスポンスになる。
pub async fn add_new_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<bool>, ApiError> {
    let new_todo = match parse_new_todo(&body) {
        Ok(todo) => todo,
        Err(reason) => {
            warn!(%reason, "new todo request was malformed");
            return Ok(Json(false));
        }
    };

    info!(
        owner = %new_todo.owner,
        status = new_todo.status.as_deref().unwrap_or_default(),
        category = %new_todo.category,
        "adding new todo"
    );
    state.repo.insert(new_todo).await?;
    Ok(Json(true))
}

/// GET /api/todoSummary
pub async fn todo_summary(State(state): State<AppState>) -> Result<Json<TodoSummary>, ApiError> {
    let todos = state.repo.all().await?;
    Ok(Json(TodoSummary::from_todos(&todos)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

fn parse_new_todo(body: &[u8]) -> Result<NewTodo, String> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, received {value}"));
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

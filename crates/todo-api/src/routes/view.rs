//! `/todos` の HTML 一覧画面
//!
//! E2E テストが要素 ID（`list-title`, `todoOwner`, `todos` など）で操作するため、
//! テンプレートの ID は変更しないこと。

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use domain::{NewTodo, Todo, TodoFilter, TodoQuery, STATUS_COMPLETE, STATUS_INCOMPLETE};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

#[derive(Template)]
#[template(path = "todos.html")]
struct TodoListTemplate {
    title: String,
    owner: String,
    category: String,
    status: String,
    content: String,
    statuses: [&'static str; 2],
    todos: Vec<Todo>,
}

/// 追加フォームの入力
#[derive(Debug, Deserialize)]
pub struct AddTodoForm {
    pub owner: String,
    #[serde(default)]
    pub status: Option<String>,
    pub body: String,
    pub category: String,
}

/// 一覧見出し。絞り込みがあれば条件を併記する
pub fn list_title(filter: &TodoFilter) -> String {
    let predicates = filter.predicates();
    if predicates.is_empty() {
        return "Todos".to_string();
    }

    let conditions: Vec<String> = predicates
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!("Todos matching {}", conditions.join(", "))
}

/// GET /todos
pub async fn todo_list_page(
    State(state): State<AppState>,
    Query(query): Query<TodoQuery>,
) -> Result<Response, ApiError> {
    let filter = TodoFilter::try_from(query)?;
    let todos = state.repo.list(&filter).await?;

    let template = TodoListTemplate {
        title: list_title(&filter),
        owner: filter.owner.clone().unwrap_or_default(),
        category: filter.category.clone().unwrap_or_default(),
        status: filter.status.clone().unwrap_or_default(),
        content: filter.content.clone().unwrap_or_default(),
        statuses: [STATUS_COMPLETE, STATUS_INCOMPLETE],
        todos,
    };

    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("Template error: {e}")),
        )
            .into_response()),
    }
}

/// POST /todos（追加フォーム）
pub async fn add_todo_form(
    State(state): State<AppState>,
    Form(form): Form<AddTodoForm>,
) -> Result<Redirect, ApiError> {
    let mut new_todo = NewTodo::new(form.owner, form.body, form.category);
    if let Some(status) = form.status.filter(|s| !s.is_empty()) {
        new_todo = new_todo.with_status(status);
    }

    let todo = state.repo.insert(new_todo).await?;
    info!(todo_id = %todo.id, "todo added from list view");
    Ok(Redirect::to("/todos"))
}

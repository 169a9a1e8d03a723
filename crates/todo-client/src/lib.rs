//! ToDo ストア API のクライアント
//!
//! 取得系 2 種と作成 1 種の薄いラッパー。通信・パースのエラーは
//! そのまま呼び出し元へ返し、リトライや冪等性の制御は行わない。

use domain::{Todo, TodoFilter, TodoQuery, TodoSummary};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 接続失敗・タイムアウト・レスポンスのデコード失敗
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::InvalidUrl(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewTodoBody<'a> {
    owner: &'a str,
    body: &'a str,
    category: &'a str,
}

/// ToDo 一覧/詳細の取得と新規作成
#[derive(Debug, Clone)]
pub struct TodoListService {
    client: reqwest::Client,
    todo_url: String,
    summary_url: String,
}

impl TodoListService {
    /// `api_url` は `/api/` までを含むベース URL（末尾スラッシュは省略可）
    pub fn new(api_url: &str) -> Self {
        Self::with_client(api_url, reqwest::Client::new())
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        let base = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };

        Self {
            client,
            todo_url: format!("{base}todos"),
            summary_url: format!("{base}todoSummary"),
        }
    }

    /// 環境変数 API_URL（未設定なら既定値）から作成
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("API_URL").unwrap_or_else(|_| shared::DEFAULT_API_URL.to_string());
        Self::new(&api_url)
    }

    pub async fn get_todos(&self) -> Result<Vec<Todo>, ClientError> {
        let response = self.client.get(&self.todo_url).send().await?;
        read_json(response).await
    }

    pub async fn get_todos_filtered(&self, filter: &TodoFilter) -> Result<Vec<Todo>, ClientError> {
        let response = self
            .client
            .get(&self.todo_url)
            .query(&TodoQuery::from(filter))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn get_todo_by_id(&self, id: &str) -> Result<Todo, ClientError> {
        let response = self.client.get(self.todo_item_url(id)?).send().await?;
        read_json(response).await
    }

    /// ID は 1 つのパスセグメントとしてエンコードする
    fn todo_item_url(&self, id: &str) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.todo_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.todo_url)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.todo_url.clone()))?
            .push(id);
        Ok(url)
    }

    /// 作成を依頼し、レスポンスの真偽値を返す。同じ内容で 2 回呼べば 2 件作られる
    pub async fn add_new_todo(
        &self,
        owner: &str,
        body: &str,
        category: &str,
    ) -> Result<bool, ClientError> {
        let payload = NewTodoBody {
            owner,
            body,
            category,
        };
        debug!(owner, category, "posting new todo");

        let response = self
            .client
            .post(format!("{}/new", self.todo_url))
            .json(&payload)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn get_todo_summary(&self) -> Result<TodoSummary, ClientError> {
        let response = self.client.get(&self.summary_url).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_joined_like_api_url_prefix() {
        let service = TodoListService::new("http://localhost:4567/api/");
        assert_eq!(service.todo_url, "http://localhost:4567/api/todos");
        assert_eq!(service.summary_url, "http://localhost:4567/api/todoSummary");

        let service = TodoListService::new("http://localhost:4567/api");
        assert_eq!(service.todo_url, "http://localhost:4567/api/todos");
    }

    #[test]
    fn test_todo_id_is_a_single_path_segment() {
        let service = TodoListService::new("http://localhost:4567/api/");

        let url = service.todo_item_url("01HZX3K8M6Q4C2V9T7R5N1B0AA").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4567/api/todos/01HZX3K8M6Q4C2V9T7R5N1B0AA");

        let url = service.todo_item_url("a/b?c#d").unwrap();
        assert_eq!(url.path(), "/api/todos/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_unparseable_api_url_is_reported() {
        let service = TodoListService::new("not a url");
        assert!(matches!(
            service.todo_item_url("x"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}

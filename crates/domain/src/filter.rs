use crate::errors::DomainError;
use crate::todo::{Todo, TodoField};
use serde::{Deserialize, Serialize};

/// ToDo 一覧の絞り込み条件
///
/// owner / status / body / category は完全一致、content は body の部分一致
/// （大文字小文字を区別しない）。指定された条件はすべて AND で評価する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub owner: Option<String>,
    pub status: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
    pub limit: Option<usize>,
    pub order_by: Option<TodoField>,
}

impl TodoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn order_by(mut self, field: TodoField) -> Self {
        self.order_by = Some(field);
        self
    }

    /// 有効な絞り込み条件を (フィールド名, 値) の組で返す
    pub fn predicates(&self) -> Vec<(&'static str, &str)> {
        [
            ("owner", &self.owner),
            ("status", &self.status),
            ("body", &self.body),
            ("category", &self.category),
            ("content", &self.content),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        let exact = |expected: &Option<String>, actual: &str| {
            expected.as_deref().map_or(true, |e| e == actual)
        };

        exact(&self.owner, &todo.owner)
            && exact(&self.status, &todo.status)
            && exact(&self.body, &todo.body)
            && exact(&self.category, &todo.category)
            && self.content.as_deref().map_or(true, |needle| {
                todo.body.to_lowercase().contains(&needle.to_lowercase())
            })
    }

    /// 絞り込み → 並び替え（安定ソート）→ 件数制限の順に適用する
    pub fn apply(&self, todos: impl IntoIterator<Item = Todo>) -> Vec<Todo> {
        let mut matched: Vec<Todo> = todos.into_iter().filter(|t| self.matches(t)).collect();

        if let Some(field) = self.order_by {
            matched.sort_by(|a, b| a.field(field).cmp(b.field(field)));
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }

        matched
    }
}

/// クエリ文字列表現。`GET /api/todos` と `GET /todos` が受け取る形
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, rename = "orderBy", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl TryFrom<TodoQuery> for TodoFilter {
    type Error = DomainError;

    fn try_from(query: TodoQuery) -> Result<Self, Self::Error> {
        // HTML フォームは未入力欄を空文字で送ってくる
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());

        let limit = match present(query.limit) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| DomainError::InvalidLimit(raw.clone()))?,
            None => 0,
        };

        let order_by = present(query.order_by)
            .map(|raw| raw.parse::<TodoField>())
            .transpose()?;

        Ok(TodoFilter {
            owner: present(query.owner),
            status: present(query.status),
            body: present(query.body),
            category: present(query.category),
            content: present(query.content),
            limit: (limit > 0).then_some(limit),
            order_by,
        })
    }
}

impl From<&TodoFilter> for TodoQuery {
    fn from(filter: &TodoFilter) -> Self {
        TodoQuery {
            owner: filter.owner.clone(),
            status: filter.status.clone(),
            body: filter.body.clone(),
            category: filter.category.clone(),
            content: filter.content.clone(),
            limit: filter.limit.map(|l| l.to_string()),
            order_by: filter.order_by.map(|f| f.as_str().to_string()),
        }
    }
}

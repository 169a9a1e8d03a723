use crate::errors::DomainError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const STATUS_COMPLETE: &str = "complete";
pub const STATUS_INCOMPLETE: &str = "incomplete";

/// ストアが採番する ToDo の識別子（ULID 文字列）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// 外部から受け取った文字列を検証して TodoId にする
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        ulid::Ulid::from_string(id)
            .map(|ulid| Self(ulid.to_string()))
            .map_err(|_| DomainError::InvalidTodoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        ulid::Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TodoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 保存済みの ToDo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(alias = "_id")]
    pub id: TodoId,
    pub owner: String,
    #[serde(default = "default_status", deserialize_with = "status_from_json")]
    pub status: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
}

impl Todo {
    /// ステータスが完了扱いかどうか（"complete" または旧形式の "true"）
    pub fn is_complete(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_COMPLETE) || self.status.eq_ignore_ascii_case("true")
    }

    /// 並び替え・絞り込みで参照するフィールド値
    pub fn field(&self, field: TodoField) -> &str {
        match field {
            TodoField::Owner => &self.owner,
            TodoField::Status => &self.status,
            TodoField::Body => &self.body,
            TodoField::Category => &self.category,
        }
    }
}

/// 新規作成リクエストの内容。status 省略時は未完了
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub owner: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_status_from_json"
    )]
    pub status: Option<String>,
    pub body: String,
    pub category: String,
}

impl NewTodo {
    pub fn new(owner: impl Into<String>, body: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            status: None,
            body: body.into(),
            category: category.into(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn into_todo(self, id: TodoId) -> Todo {
        Todo {
            id,
            owner: self.owner,
            status: self.status.unwrap_or_else(default_status),
            body: self.body,
            category: self.category,
        }
    }
}

/// 絞り込み・並び替えの対象になるフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoField {
    Owner,
    Status,
    Body,
    Category,
}

impl TodoField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoField::Owner => "owner",
            TodoField::Status => "status",
            TodoField::Body => "body",
            TodoField::Category => "category",
        }
    }
}

impl FromStr for TodoField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(TodoField::Owner),
            "status" => Ok(TodoField::Status),
            "body" => Ok(TodoField::Body),
            "category" => Ok(TodoField::Category),
            other => Err(DomainError::InvalidOrderField(other.to_string())),
        }
    }
}

fn default_status() -> String {
    STATUS_INCOMPLETE.to_string()
}

// 旧データは status を真偽値で持っている
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Flag(bool),
    Text(String),
}

impl From<StatusRepr> for String {
    fn from(repr: StatusRepr) -> Self {
        match repr {
            StatusRepr::Flag(true) => STATUS_COMPLETE.to_string(),
            StatusRepr::Flag(false) => STATUS_INCOMPLETE.to_string(),
            StatusRepr::Text(text) => text,
        }
    }
}

fn status_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StatusRepr::deserialize(deserializer).map(String::from)
}

fn optional_status_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StatusRepr>::deserialize(deserializer).map(|repr| repr.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_id_new_is_valid_ulid() {
        let id = TodoId::new();
        assert_eq!(id.as_str().len(), 26);
        assert!(TodoId::parse(id.as_str()).is_ok());
        assert!(id.timestamp_ms().is_some());
    }

    #[test]
    fn test_todo_id_parse_rejects_garbage() {
        let err = TodoId::parse("not-an-id").unwrap_err();
        assert_eq!(err, DomainError::InvalidTodoId("not-an-id".to_string()));
    }

    #[test]
    fn test_todo_accepts_boolean_status_and_mongo_id() {
        let id = TodoId::new();
        let json = serde_json::json!({
            "_id": id.as_str(),
            "owner": "Vipul",
            "status": true,
            "body": "Vipul says Hi!!",
            "category": "homework"
        });

        let todo: Todo = serde_json::from_value(json).unwrap();
        assert_eq!(todo.id, id);
        assert_eq!(todo.status, STATUS_COMPLETE);
        assert!(todo.is_complete());
    }

    #[test]
    fn test_todo_missing_fields_use_defaults() {
        let json = serde_json::json!({ "id": TodoId::new().as_str(), "owner": "DesiBoyz" });
        let todo: Todo = serde_json::from_value(json).unwrap();
        assert_eq!(todo.status, STATUS_INCOMPLETE);
        assert_eq!(todo.category, "");
        assert!(!todo.is_complete());
    }

    #[test]
    fn test_legacy_true_string_counts_as_complete() {
        let todo = NewTodo::new("a", "b", "c").with_status("TRUE").into_todo(TodoId::new());
        assert!(todo.is_complete());
    }

    #[test]
    fn test_new_todo_defaults_to_incomplete() {
        let new_todo: NewTodo = serde_json::from_str(
            r#"{"owner":"Nic","body":"Nic says Hi!!","category":"teacher"}"#,
        )
        .unwrap();
        assert_eq!(new_todo.status, None);

        let todo = new_todo.into_todo(TodoId::new());
        assert_eq!(todo.status, STATUS_INCOMPLETE);
        assert_eq!(todo.owner, "Nic");
    }

    #[test]
    fn test_todo_field_from_str() {
        assert_eq!("owner".parse::<TodoField>().unwrap(), TodoField::Owner);
        assert_eq!("category".parse::<TodoField>().unwrap(), TodoField::Category);
        assert!("email".parse::<TodoField>().is_err());
    }
}

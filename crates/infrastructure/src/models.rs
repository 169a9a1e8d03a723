use crate::repository::RepositoryError;
use aws_sdk_dynamodb::types::AttributeValue;
use domain::{Todo, TodoId};
use std::collections::HashMap;

/// パーティションキーの属性名
pub const PARTITION_KEY: &str = "PK";

/// ToDo アイテムのキー値
pub fn todo_key(id: &TodoId) -> String {
    format!("TODO#{}", id.as_str())
}

/// ToDo を DynamoDB アイテムに変換
pub fn todo_to_item(todo: &Todo) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(todo_key(&todo.id))),
        ("id".to_string(), AttributeValue::S(todo.id.as_str().to_string())),
        ("owner".to_string(), AttributeValue::S(todo.owner.clone())),
        ("status".to_string(), AttributeValue::S(todo.status.clone())),
        ("body".to_string(), AttributeValue::S(todo.body.clone())),
        ("category".to_string(), AttributeValue::S(todo.category.clone())),
    ])
}

/// DynamoDB アイテムから ToDo を復元
/// status は旧データの真偽値も受け付ける
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<Todo, RepositoryError> {
    let id = string_attr(item, "id")?;
    let status = match item.get("status") {
        Some(AttributeValue::Bool(true)) => domain::STATUS_COMPLETE.to_string(),
        Some(AttributeValue::Bool(false)) | None => domain::STATUS_INCOMPLETE.to_string(),
        Some(AttributeValue::S(s)) => s.clone(),
        Some(other) => {
            return Err(RepositoryError::InvalidItem(format!(
                "unexpected status attribute: {other:?}"
            )))
        }
    };

    Ok(Todo {
        id: TodoId::parse(&id).map_err(|e| RepositoryError::InvalidItem(e.to_string()))?,
        owner: string_attr(item, "owner")?,
        status,
        body: optional_string_attr(item, "body"),
        category: optional_string_attr(item, "category"),
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String, RepositoryError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidItem(format!("missing string attribute '{name}'")))
}

fn optional_string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> String {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

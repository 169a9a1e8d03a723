use crate::todo::{Todo, TodoField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 完了率の集計結果（割合は 0.0〜1.0）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoSummary {
    pub percentage_todos_complete: f64,
    pub categories_percent_complete: BTreeMap<String, f64>,
    pub owners_percent_complete: BTreeMap<String, f64>,
}

impl TodoSummary {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let complete = todos.iter().filter(|t| t.is_complete()).count();

        Self {
            percentage_todos_complete: ratio(complete, todos.len()),
            categories_percent_complete: ratio_by(todos, TodoField::Category),
            owners_percent_complete: ratio_by(todos, TodoField::Owner),
        }
    }
}

fn ratio_by(todos: &[Todo], field: TodoField) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for todo in todos {
        let entry = counts.entry(todo.field(field)).or_default();
        entry.1 += 1;
        if todo.is_complete() {
            entry.0 += 1;
        }
    }

    counts
        .into_iter()
        .map(|(key, (complete, total))| (key.to_string(), ratio(complete, total)))
        .collect()
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

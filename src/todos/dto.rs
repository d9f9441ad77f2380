use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::todos::repo::Todo;

/// Todo as it appears on the wire. `completedAt` is omitted while pending
/// and a unix-millisecond number once completed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: Uuid,
    pub text: String,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    pub owner_id: Uuid,
}

impl From<Todo> for TodoResponse {
    fn from(t: Todo) -> Self {
        Self {
            id: t.id,
            text: t.text,
            is_completed: t.is_completed,
            completed_at: t.completed_at,
            owner_id: t.owner_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoList {
    pub todos: Vec<TodoResponse>,
}

#[derive(Debug, Serialize)]
pub struct TodoDetails {
    pub todo: TodoResponse,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub text: String,
}

/// Patch body for PATCH /todos/:id. Omitted fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub text: Option<String>,
    pub is_completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample(completed_at: Option<i64>) -> TodoResponse {
        TodoResponse::from(Todo {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            text: "buy milk".into(),
            is_completed: completed_at.is_some(),
            completed_at,
            created_at: OffsetDateTime::UNIX_EPOCH,
        })
    }

    #[test]
    fn pending_todo_omits_completed_at() {
        let json = serde_json::to_value(sample(None)).unwrap();
        assert_eq!(json["text"], "buy milk");
        assert_eq!(json["isCompleted"], false);
        assert!(json.get("completedAt").is_none());
        assert!(json.get("ownerId").is_some());
    }

    #[test]
    fn completed_todo_carries_numeric_timestamp() {
        let json = serde_json::to_value(sample(Some(1700000000000))).unwrap();
        assert_eq!(json["isCompleted"], true);
        assert!(json["completedAt"].is_number());
        assert_eq!(json["completedAt"], 1700000000000_i64);
    }

    #[test]
    fn list_wraps_todos_field() {
        let list = TodoList {
            todos: vec![sample(None)],
        };
        let json = serde_json::to_value(list).unwrap();
        assert!(json["todos"].is_array());
        assert_eq!(json["todos"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn update_request_fields_are_optional() {
        let patch: UpdateTodoRequest = serde_json::from_str(r#"{"isCompleted": true}"#).unwrap();
        assert_eq!(patch.is_completed, Some(true));
        assert!(patch.text.is_none());

        let empty: UpdateTodoRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.text.is_none());
        assert!(empty.is_completed.is_none());
    }
}

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthSession,
    error::AppError,
    state::AppState,
    todos::{
        dto::{CreateTodoRequest, TodoDetails, TodoList, TodoResponse, UpdateTodoRequest},
        repo::{Todo, TodoPatch},
    },
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", post(create_todo).get(list_todos))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
}

fn validate_text(raw: &str) -> Result<String, AppError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text must not be empty".into()));
    }
    Ok(text.to_string())
}

/// A malformed id gets the same 404 as a missing or foreign-owned todo, so
/// the response shape never leaks whether the id exists for someone else.
fn parse_todo_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

#[instrument(skip(state, session, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CreateTodoRequest>,
) -> Result<Json<TodoResponse>, AppError> {
    let text = validate_text(&payload.text)?;
    let todo = Todo::create(&state.db, session.user.id, &text).await?;
    info!(todo_id = %todo.id, owner_id = %todo.owner_id, "todo created");
    Ok(Json(todo.into()))
}

#[instrument(skip(state, session))]
pub async fn list_todos(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<TodoList>, AppError> {
    let todos = Todo::list(&state.db, session.user.id).await?;
    Ok(Json(TodoList {
        todos: todos.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state, session))]
pub async fn get_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<TodoDetails>, AppError> {
    let id = parse_todo_id(&id)?;
    let todo = Todo::get(&state.db, session.user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(TodoDetails { todo: todo.into() }))
}

#[instrument(skip(state, session, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTodoRequest>,
) -> Result<Json<TodoDetails>, AppError> {
    let id = parse_todo_id(&id)?;

    let patch = TodoPatch {
        text: match payload.text {
            Some(raw) => Some(validate_text(&raw)?),
            None => None,
        },
        is_completed: payload.is_completed,
    };

    let todo = Todo::update(&state.db, session.user.id, id, patch)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(todo_id = %todo.id, is_completed = todo.is_completed, "todo updated");
    Ok(Json(TodoDetails { todo: todo.into() }))
}

#[instrument(skip(state, session))]
pub async fn delete_todo(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<TodoDetails>, AppError> {
    let id = parse_todo_id(&id)?;
    let todo = Todo::delete(&state.db, session.user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(todo_id = %todo.id, "todo deleted");
    Ok(Json(TodoDetails { todo: todo.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_text_trims_surrounding_whitespace() {
        assert_eq!(validate_text("  buy milk  ").unwrap(), "buy milk");
    }

    #[test]
    fn validate_text_rejects_empty_and_blank() {
        assert!(validate_text("").is_err());
        assert!(validate_text("   ").is_err());
        assert!(validate_text("\t\n").is_err());
    }

    #[test]
    fn parse_todo_id_accepts_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_todo_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_todo_id_maps_malformed_ids_to_not_found() {
        assert!(matches!(parse_todo_id("123"), Err(AppError::NotFound)));
        assert!(matches!(parse_todo_id(""), Err(AppError::NotFound)));
    }
}

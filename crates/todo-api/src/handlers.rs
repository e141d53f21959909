use axum::{
    extract::{FromRequest, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use domain::{DomainError, NewTodo, Todo, TodoId, TodoPatch};
use infrastructure::RepositoryError;
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub const NO_TODOS_MESSAGE: &str = "No todos found";
pub const TODO_NOT_FOUND_MESSAGE: &str = "Todo not found";
pub const TODO_DELETED_MESSAGE: &str = "Todo deleted successfully";

/// JSON ボディ抽出。失敗時は `ApiError` として想定外エラー扱いにする
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    /// サービスの簡易ステータス
    status: &'static str,
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(message) => ApiError::Validation(message),
        }
    }
}

fn not_found_or_store(e: RepositoryError) -> ApiError {
    match e {
        RepositoryError::NotFound(_) => ApiError::NotFound(TODO_NOT_FOUND_MESSAGE.to_string()),
        other => ApiError::Store(other),
    }
}

/// ヘルスチェック用ハンドラ
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

/// GET /api/todos
/// 0 件の場合は空配列ではなく 404 を返す
pub async fn list_todos(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let todos = state.repository.list().await?;

    if todos.is_empty() {
        return Err(ApiError::NotFound(NO_TODOS_MESSAGE.to_string()));
    }

    Ok((StatusCode::OK, Json(DataBody { data: todos })))
}

/// POST /api/todos
pub async fn create_todo(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewTodo>,
) -> Result<impl IntoResponse, ApiError> {
    let todo = Todo::create(input, Utc::now())?;
    state.repository.insert(&todo).await?;

    info!(todo_id = %todo.id, "Todo created");
    Ok((StatusCode::CREATED, Json(DataBody { data: todo })))
}

/// PUT /api/todos/:id
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<TodoPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let id = TodoId::from_string(id);
    let mut todo = state
        .repository
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(TODO_NOT_FOUND_MESSAGE.to_string()))?;

    todo.apply_patch(patch, Utc::now());
    state
        .repository
        .update(&todo)
        .await
        .map_err(not_found_or_store)?;

    info!(todo_id = %todo.id, completed = todo.completed, "Todo updated");
    Ok((StatusCode::OK, Json(DataBody { data: todo })))
}

/// DELETE /api/todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = TodoId::from_string(id);
    state
        .repository
        .delete(&id)
        .await
        .map_err(not_found_or_store)?;

    info!(todo_id = %id, "Todo deleted");
    Ok((
        StatusCode::OK,
        Json(MessageBody {
            message: TODO_DELETED_MESSAGE,
        }),
    ))
}

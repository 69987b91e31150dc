//! Todo CRUD handlers.
//!
//! Every mutation commits the todo write first, then runs the column
//! synchronizer. Sync failures are logged and swallowed: the todo row is
//! authoritative and must not be rolled back by a settings problem.

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use shared_types::{CreateTodoRequest, Todo, TodoListQuery, UpdateTodoRequest};
use uuid::Uuid;

use crate::auth::require_user;
use crate::db::{self, todos::TodoChanges};
use crate::error::{ApiError, ApiResult};
use crate::{sync, AppState};

const DEFAULT_STATUS: &str = "todo";
const DEFAULT_PAGE_SIZE: i64 = 100;

pub async fn list_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TodoListQuery>,
) -> ApiResult<Json<Vec<Todo>>> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    let todos = db::todos::list_for_user(
        &mut conn,
        user.id,
        query.skip.unwrap_or(0).max(0),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(0, 1000),
        query.status.as_deref(),
    )
    .await?;

    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTodoRequest>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    let status = payload.status.as_deref().unwrap_or(DEFAULT_STATUS);
    let todo = db::todos::create(
        &mut conn,
        user.id,
        &payload.title,
        payload.description.as_deref(),
        status,
    )
    .await?;

    state.metrics.todos_created.incr();
    sync::log_sync_error(
        "create",
        sync::todo_saved(&mut conn, &state.metrics, user.id, todo.id, &todo.status).await,
    );

    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(todo_id): Path<Uuid>,
) -> ApiResult<Json<Todo>> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    let todo = db::todos::get_for_user(&mut conn, user.id, todo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Todo"))?;

    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(todo_id): Path<Uuid>,
    Json(payload): Json<UpdateTodoRequest>,
) -> ApiResult<Json<Todo>> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    db::todos::get_for_user(&mut conn, user.id, todo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Todo"))?;

    let todo = db::todos::update(
        &mut conn,
        user.id,
        todo_id,
        TodoChanges {
            title: payload.title.as_deref(),
            description: payload.description.as_deref(),
            is_completed: payload.is_completed,
            status: payload.status.as_deref(),
            updated_at: chrono::Utc::now(),
        },
    )
    .await?;

    state.metrics.todos_updated.incr();
    // Re-place against the final status even when only the title changed:
    // the scrub-then-insert is idempotent and repairs stale entries.
    sync::log_sync_error(
        "update",
        sync::todo_saved(&mut conn, &state.metrics, user.id, todo.id, &todo.status).await,
    );

    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(todo_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    db::todos::get_for_user(&mut conn, user.id, todo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Todo"))?;

    let photos = db::todo_photos::list_for_todo(&mut conn, todo_id).await?;
    db::todo_photos::delete_for_todos(&mut conn, &[todo_id]).await?;
    db::todos::delete(&mut conn, user.id, todo_id).await?;

    // Blob removal is best-effort and never blocks the deletion.
    for photo in &photos {
        state
            .photo_store
            .remove(&photo.url, photo.storage_key.as_deref())
            .await;
    }

    state.metrics.todos_deleted.incr();
    sync::log_sync_error(
        "delete",
        sync::todo_removed(&mut conn, &state.metrics, user.id, todo_id).await,
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Bulk delete every todo of the current user in the given column.
pub async fn bulk_delete_todos_by_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(column_status): Path<String>,
) -> ApiResult<StatusCode> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    let todo_ids = db::todos::ids_by_status(&mut conn, user.id, &column_status).await?;
    if todo_ids.is_empty() {
        return Ok(StatusCode::NO_CONTENT);
    }

    let photos = db::todo_photos::list_for_todos(&mut conn, &todo_ids).await?;
    db::todo_photos::delete_for_todos(&mut conn, &todo_ids).await?;
    let deleted = db::todos::delete_by_ids(&mut conn, user.id, &todo_ids).await?;

    for photo in &photos {
        state
            .photo_store
            .remove(&photo.url, photo.storage_key.as_deref())
            .await;
    }

    for _ in 0..deleted {
        state.metrics.todos_deleted.incr();
    }
    sync::log_sync_error(
        "bulk delete",
        sync::todos_removed(&mut conn, &state.metrics, user.id, &todo_ids).await,
    );

    tracing::info!(
        user_id = %user.id,
        column = %column_status,
        deleted,
        "Bulk-deleted todos by column"
    );

    Ok(StatusCode::NO_CONTENT)
}

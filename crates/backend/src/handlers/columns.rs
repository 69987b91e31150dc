//! Column settings handlers.
//!
//! Settings are materialized lazily: the first read (or patch) for a user
//! without a row seeds the default four-column layout. Caller-submitted
//! payloads are validated strictly; stored blobs are parsed leniently
//! elsewhere (see `shared_types::board`).

use std::collections::BTreeMap;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use shared_types::{
    board, ColumnBoard, ColumnConfig, ColumnSettingsPayload, ColumnSettingsResponse,
};
use uuid::Uuid;

use crate::auth::require_user;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::ColumnSettingsRow;
use crate::AppState;

/// Bound on reload-and-reapply attempts when a guarded write loses a race.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Fetch the user's settings row, seeding defaults when absent.
pub async fn get_or_create_default(
    conn: &mut diesel_async::AsyncPgConnection,
    user_id: Uuid,
) -> ApiResult<ColumnSettingsRow> {
    if let Some(row) = db::column_settings::get_by_user(conn, user_id).await? {
        return Ok(row);
    }

    let (order_text, config_text) = ColumnBoard::default_board().to_stored();
    let row = db::column_settings::insert(conn, user_id, &order_text, &config_text).await?;
    tracing::info!(user_id = %user_id, "Seeded default column settings");
    Ok(row)
}

/// Get column settings for the current user, creating defaults if needed.
pub async fn get_column_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ColumnSettingsResponse>> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    let row = get_or_create_default(&mut conn, user.id).await?;
    Ok(Json(row.to_response()))
}

/// Create column settings from a submitted payload.
///
/// Rejected with 400 when settings already exist or when either field
/// fails validation; nothing is written on failure.
pub async fn create_column_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ColumnSettingsPayload>,
) -> ApiResult<(StatusCode, Json<ColumnSettingsResponse>)> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    if db::column_settings::get_by_user(&mut conn, user.id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(
            "Column settings already exist for this user. Use PUT to update.",
        ));
    }

    let columns = match &payload.columns_config {
        Some(value) => board::validate_columns_config(value)?,
        None => return Err(ApiError::bad_request("columns_config is required")),
    };
    let column_order = match &payload.column_order {
        Some(value) => board::validate_column_order(value)?,
        None => ColumnBoard::default_board().column_order,
    };

    let board = ColumnBoard {
        column_order,
        columns,
    };
    let (order_text, config_text) = board.to_stored();
    let row = db::column_settings::insert(&mut conn, user.id, &order_text, &config_text).await?;

    Ok((StatusCode::CREATED, Json(row.to_response())))
}

/// Patch column settings: each submitted field replaces the stored one,
/// omitted fields are untouched. Creates defaults first for users without
/// a row. The write is version-guarded and reapplied on conflict.
pub async fn update_column_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ColumnSettingsPayload>,
) -> ApiResult<Json<ColumnSettingsResponse>> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    // Validate before touching storage: no partial writes on bad payloads.
    let new_order: Option<Vec<String>> = match &payload.column_order {
        Some(value) => Some(board::validate_column_order(value)?),
        None => None,
    };
    let new_columns: Option<BTreeMap<String, ColumnConfig>> = match &payload.columns_config {
        Some(value) => Some(board::validate_columns_config(value)?),
        None => None,
    };

    for _attempt in 1..=MAX_WRITE_ATTEMPTS {
        let row = get_or_create_default(&mut conn, user.id).await?;

        let mut board = ColumnBoard::from_stored(&row.column_order, &row.columns_config);
        if let Some(order) = &new_order {
            board.column_order = order.clone();
        }
        if let Some(columns) = &new_columns {
            board.columns = columns.clone();
        }

        let (order_text, config_text) = board.to_stored();
        if db::column_settings::update_guarded(
            &mut conn,
            row.id,
            row.version,
            &order_text,
            &config_text,
        )
        .await?
        {
            let fresh = db::column_settings::get_by_user(&mut conn, user.id)
                .await?
                .ok_or_else(|| ApiError::not_found("Column settings"))?;
            return Ok(Json(fresh.to_response()));
        }
    }

    Err(ApiError::Internal(anyhow::anyhow!(
        "Column settings kept changing under us; giving up after {} attempts",
        MAX_WRITE_ATTEMPTS
    )))
}

/// Delete column settings; the next read re-seeds defaults.
pub async fn delete_column_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    if !db::column_settings::delete_by_user(&mut conn, user.id).await? {
        return Err(ApiError::not_found("Column settings"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Reset to the default layout, discarding whatever was stored.
pub async fn reset_column_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ColumnSettingsResponse>> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    db::column_settings::delete_by_user(&mut conn, user.id).await?;

    let (order_text, config_text) = ColumnBoard::default_board().to_stored();
    let row = db::column_settings::insert(&mut conn, user.id, &order_text, &config_text).await?;

    tracing::info!(user_id = %user.id, "Reset column settings to defaults");
    Ok(Json(row.to_response()))
}

/// The default column layout. Not persisted and not user-specific.
pub async fn get_default_column_settings() -> Json<serde_json::Value> {
    let board = ColumnBoard::default_board();
    Json(json!({
        "column_order": board.column_order,
        "columns_config": board.columns,
    }))
}

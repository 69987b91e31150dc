use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod board;

pub use board::{BoardValidationError, ColumnBoard, ColumnConfig};

/// User struct matching database column order exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub google_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Todo struct matching database column order exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub status: String, // column id, defaults to "todo"
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Photo attached to a todo. `storage_key` is None when the file lives on
/// local disk and Some when it lives in an object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct TodoPhoto {
    pub id: Uuid,
    pub todo_id: Uuid,
    pub filename: String,
    pub url: String,
    pub storage_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
    pub status: Option<String>,
}

/// Query parameters for listing todos
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TodoListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// Column settings as returned by the API: the stored TEXT blobs parsed
/// into structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSettingsResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub column_order: Vec<String>,
    pub columns_config: std::collections::BTreeMap<String, ColumnConfig>,
}

/// Payload for creating or patching column settings.
///
/// Both fields accept either structured JSON or a JSON-encoded string
/// (legacy clients submitted the blobs as text). Validation happens in
/// `board::validate_*`, not here, so malformed shapes produce errors that
/// name the offending field instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSettingsPayload {
    pub column_order: Option<serde_json::Value>,
    pub columns_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInitResponse {
    pub auth_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Database representation of user_column_settings
/// Uses TEXT fields for the board JSON (stored as JSON strings, not JSONB)
/// so malformed blobs can be read and recovered rather than failing the row
/// load. The `version` column guards concurrent read-modify-write cycles.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::user_column_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ColumnSettingsRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub column_order: String,  // JSON stored as TEXT
    pub columns_config: String, // JSON stored as TEXT
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ColumnSettingsRow {
    pub fn to_response(&self) -> shared_types::ColumnSettingsResponse {
        let board = shared_types::ColumnBoard::from_stored(&self.column_order, &self.columns_config);
        shared_types::ColumnSettingsResponse {
            id: self.id,
            user_id: self.user_id,
            column_order: board.column_order,
            columns_config: board.columns,
        }
    }
}

/// Insertable struct for new users
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub google_id: Option<&'a str>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new todos
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::todos)]
pub struct NewTodo<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub is_completed: bool,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new todo photos
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::todo_photos)]
pub struct NewTodoPhoto<'a> {
    pub id: Uuid,
    pub todo_id: Uuid,
    pub filename: &'a str,
    pub url: &'a str,
    pub storage_key: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new column settings rows
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::user_column_settings)]
pub struct NewColumnSettings<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub column_order: &'a str,
    pub columns_config: &'a str,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

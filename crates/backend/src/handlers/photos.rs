//! Photo upload and deletion handlers.

use axum::{
    extract::{Json, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
};
use shared_types::TodoPhoto;
use uuid::Uuid;

use crate::auth::require_user;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

fn extension_of(filename: &str) -> Option<String> {
    filename
        .rfind('.')
        .map(|idx| filename[idx..].to_lowercase())
}

/// Upload a photo for a todo item (multipart field `file`).
pub async fn upload_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(todo_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<TodoPhoto>)> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    // Verify todo exists and belongs to user
    db::todos::get_for_user(&mut conn, user.id, todo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Todo"))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let filename = field
                .file_name()
                .ok_or_else(|| ApiError::bad_request("file field is missing a filename"))?
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::bad_request("multipart field 'file' is required"))?;

    let extension = extension_of(&filename)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "File type not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

    let object_name = format!("{}{}", Uuid::new_v4(), extension);
    let stored = state
        .photo_store
        .store(user.id, todo_id, &object_name, &data)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to store photo: {}", e)))?;

    let photo = db::todo_photos::create(
        &mut conn,
        todo_id,
        &filename,
        &stored.url,
        stored.storage_key.as_deref(),
    )
    .await?;

    state.metrics.photos_uploaded.incr();

    Ok((StatusCode::CREATED, Json(photo)))
}

/// Delete a photo. Ownership is checked through the photo's todo; blob
/// removal is best-effort and the row is deleted regardless.
pub async fn delete_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(photo_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, &state.auth_config).await?;

    let photo = db::todo_photos::get_owned(&mut conn, user.id, photo_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo"))?;

    db::todo_photos::delete(&mut conn, photo.id).await?;
    state
        .photo_store
        .remove(&photo.url, photo.storage_key.as_deref())
        .await;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_parsing() {
        assert_eq!(extension_of("cat.JPG").as_deref(), Some(".jpg"));
        assert_eq!(extension_of("a.b.png").as_deref(), Some(".png"));
        assert_eq!(extension_of("noext"), None);
    }

    #[test]
    fn allowed_extensions_cover_the_usual_suspects() {
        for name in ["a.jpg", "b.jpeg", "c.png", "d.gif"] {
            let ext = extension_of(name).unwrap();
            assert!(ALLOWED_EXTENSIONS.contains(&ext.as_str()), "{name}");
        }
        let ext = extension_of("e.svg").unwrap();
        assert!(!ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    }
}

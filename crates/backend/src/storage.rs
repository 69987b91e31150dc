//! Photo blob storage.
//!
//! The backend only depends on the `PhotoStore` seam; the bundled
//! implementation writes to local disk and serves files back through the
//! `/uploads` static route. An object-storage backend would implement the
//! same trait and populate `storage_key` on stored photos; local uploads
//! leave it `None`.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

/// Location of a stored photo blob.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    /// Public URL the photo is served from.
    pub url: String,
    /// Backend-specific key, set only by remote object stores.
    pub storage_key: Option<String>,
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persist the blob under a caller-chosen unique object name.
    async fn store(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        object_name: &str,
        data: &[u8],
    ) -> anyhow::Result<StoredPhoto>;

    /// Best-effort removal: failures are logged, never propagated, so the
    /// owning row deletion always completes.
    async fn remove(&self, url: &str, storage_key: Option<&str>);
}

/// Local-disk store: `<root>/<user>/<todo>/<object_name>`, served under
/// `/uploads/...`.
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDiskStore { root: root.into() }
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix("/uploads/")?;
        // Reject anything that could climb out of the uploads root.
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl PhotoStore for LocalDiskStore {
    async fn store(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        object_name: &str,
        data: &[u8],
    ) -> anyhow::Result<StoredPhoto> {
        let dir = self.root.join(user_id.to_string()).join(todo_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(object_name), data).await?;

        Ok(StoredPhoto {
            url: format!("/uploads/{}/{}/{}", user_id, todo_id, object_name),
            storage_key: None,
        })
    }

    async fn remove(&self, url: &str, _storage_key: Option<&str>) {
        let Some(path) = self.path_for_url(url) else {
            tracing::warn!("Refusing to remove photo with unexpected url: {}", url);
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove photo file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_writes_file_and_builds_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalDiskStore::new(dir.path());
        let (user, todo) = (Uuid::new_v4(), Uuid::new_v4());

        let stored = store
            .store(user, todo, "photo.jpg", b"jpeg bytes")
            .await
            .expect("store should succeed");

        assert_eq!(stored.url, format!("/uploads/{}/{}/photo.jpg", user, todo));
        assert!(stored.storage_key.is_none());

        let on_disk = dir
            .path()
            .join(user.to_string())
            .join(todo.to_string())
            .join("photo.jpg");
        assert_eq!(std::fs::read(on_disk).expect("file exists"), b"jpeg bytes");
    }

    #[tokio::test]
    async fn remove_deletes_file_and_swallows_misses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalDiskStore::new(dir.path());
        let (user, todo) = (Uuid::new_v4(), Uuid::new_v4());

        let stored = store
            .store(user, todo, "photo.png", b"png")
            .await
            .expect("store should succeed");

        store.remove(&stored.url, None).await;
        store.remove(&stored.url, None).await; // already gone, still fine
        store.remove("/somewhere/else.png", None).await; // unexpected url, still fine
    }

    #[test]
    fn path_for_url_rejects_traversal() {
        let store = LocalDiskStore::new("/tmp/uploads");
        assert!(store.path_for_url("/uploads/../etc/passwd").is_none());
        assert!(store.path_for_url("/elsewhere/a.png").is_none());
        assert!(store.path_for_url("/uploads/a//b.png").is_none());
        assert!(store.path_for_url("/uploads/a/b/c.png").is_some());
    }
}

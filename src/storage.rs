use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::folder_ref::FolderReference;

/// File metadata as reported by the drive `files` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub trashed: bool,
}

/// Raw bytes returned by the thumbnail endpoint, with the declared content type
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Storage and rendering operations the workflow needs from the drive.
/// `DriveClient` talks to the real API; tests use an in-memory fake.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Looks up a folder; fails if it does not exist or is not accessible
    async fn get_folder(&self, folder: &FolderReference) -> Result<StoredFile>;

    /// Lists the live (non-trashed) entries of a folder in backend order
    async fn list_children(&self, folder: &FolderReference) -> Result<Vec<StoredFile>>;

    /// Requests a rendition of the file at least `size` px on the long edge
    async fn fetch_thumbnail(&self, file_id: &str, size: u32) -> Result<Thumbnail>;

    async fn create_file(
        &self,
        folder: &FolderReference,
        name: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<StoredFile>;

    /// Makes the file readable by anyone holding its link
    async fn share_with_link(&self, file_id: &str) -> Result<()>;

    async fn trash_file(&self, file_id: &str) -> Result<()>;
}

use anyhow::Result;
use tracing::{info, warn};

use crate::constants::JPEG_MIME_TYPE;
use crate::folder_ref::FolderReference;
use crate::image_processing::coerce_to_jpeg;
use crate::storage::{StorageBackend, StoredFile};

/// Outcome of converting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Converted {
        original_id: String,
        original_name: String,
        new_name: String,
        new_file_id: String,
    },
    Failed {
        original_name: String,
        error: String,
    },
}

/// A successfully converted file, ready for placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub id: String,
    pub name: String,
}

/// Drops the last dot-delimited segment and appends `.jpg`.
/// A name without a dot keeps all of it as the base.
pub fn derive_jpeg_name(name: &str) -> String {
    let base = match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    };
    format!("{}.jpg", base)
}

async fn render_and_store(
    storage: &dyn StorageBackend,
    file: &StoredFile,
    destination: &FolderReference,
    size: u32,
) -> Result<StoredFile> {
    let thumbnail = storage.fetch_thumbnail(&file.id, size).await?;
    let jpeg = coerce_to_jpeg(thumbnail.bytes, thumbnail.content_type.as_deref())?;
    let new_name = derive_jpeg_name(&file.name);
    storage
        .create_file(destination, &new_name, JPEG_MIME_TYPE, jpeg)
        .await
}

/// Renders one file as JPEG through the thumbnail endpoint and saves it in `destination`.
/// Every fault is folded into `ConversionResult::Failed`; nothing is retried.
pub async fn convert_file(
    storage: &dyn StorageBackend,
    file: &StoredFile,
    destination: &FolderReference,
    size: u32,
) -> ConversionResult {
    match render_and_store(storage, file, destination, size).await {
        Ok(created) => {
            info!("✅ {} → {}", file.name, created.name);
            ConversionResult::Converted {
                original_id: file.id.clone(),
                original_name: file.name.clone(),
                new_name: created.name,
                new_file_id: created.id,
            }
        }
        Err(e) => {
            warn!("❌ Failed to convert {}: {:#}", file.name, e);
            ConversionResult::Failed {
                original_name: file.name.clone(),
                error: format!("{:#}", e),
            }
        }
    }
}

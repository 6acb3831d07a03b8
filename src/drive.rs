//! Google Drive implementation of the storage backend.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

use crate::auth::AccessToken;
use crate::constants::{FOLDER_MIME_TYPE, LIST_PAGE_SIZE};
use crate::folder_ref::FolderReference;
use crate::settings::Settings;
use crate::storage::{StorageBackend, StoredFile, Thumbnail};

const FILE_FIELDS: &str = "id,name,mimeType,trashed";
const MULTIPART_BOUNDARY: &str = "heicsheet-7f3a9c2e";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<StoredFile>,
    next_page_token: Option<String>,
}

pub struct DriveClient {
    client: Client,
    api_base: Url,
    upload_base: Url,
    thumbnail_base: Url,
    token: AccessToken,
}

/// Makes sure a url has a trailing slash so `join` appends instead of replacing
/// the last path segment.
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}

fn parse_base(raw: &str, what: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid {} URL: {}", what, raw))?;
    Ok(ensure_slash(&url))
}

/// Returns the response if it succeeded, otherwise an error with status and body
async fn check(response: Response, action: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("Drive request failed: {} ({})", action, status);
    Err(anyhow!("Drive API error while trying to {}: {} - {}", action, status, body))
}

fn multipart_related(metadata: &serde_json::Value, mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

impl DriveClient {
    pub fn new(
        api_base: &str,
        upload_base: &str,
        thumbnail_base: &str,
        token: AccessToken,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: parse_base(api_base, "Drive API")?,
            upload_base: parse_base(upload_base, "upload")?,
            thumbnail_base: parse_base(thumbnail_base, "thumbnail")?,
            token,
        })
    }

    pub fn from_settings(settings: &Settings, token: AccessToken) -> Result<Self> {
        Self::new(
            &settings.drive_api_base,
            &settings.upload_api_base,
            &settings.thumbnail_base,
            token,
            settings.request_timeout(),
        )
    }

    fn files_url(&self, suffix: &str) -> Result<Url> {
        let mut url = self
            .api_base
            .join(&format!("drive/v3/files{}", suffix))
            .context("Failed to construct Drive URL")?;
        url.query_pairs_mut().append_pair("supportsAllDrives", "true");
        Ok(url)
    }

    /// Thumbnail URL for a file, sized on the long edge
    pub fn thumbnail_url(&self, file_id: &str, size: u32) -> Result<Url> {
        let mut url = self
            .thumbnail_base
            .join("thumbnail")
            .context("Failed to construct thumbnail URL")?;
        url.query_pairs_mut()
            .append_pair("id", file_id)
            .append_pair("sz", &format!("s{}", size));
        Ok(url)
    }
}

#[async_trait]
impl StorageBackend for DriveClient {
    #[instrument(skip(self, folder), fields(folder = %folder))]
    async fn get_folder(&self, folder: &FolderReference) -> Result<StoredFile> {
        let mut url = self.files_url(&format!("/{}", folder))?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let meta: StoredFile = check(response, "open the folder").await?.json().await?;

        if meta.mime_type != FOLDER_MIME_TYPE {
            bail!("{} is not a folder", meta.name);
        }
        if meta.trashed {
            bail!("Folder {} is in the trash", meta.name);
        }
        Ok(meta)
    }

    #[instrument(skip(self, folder), fields(folder = %folder))]
    async fn list_children(&self, folder: &FolderReference) -> Result<Vec<StoredFile>> {
        let query = format!("'{}' in parents and trashed = false", folder);
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.files_url("")?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("q", &query)
                    .append_pair("fields", &fields)
                    .append_pair("pageSize", &page_size)
                    .append_pair("includeItemsFromAllDrives", "true");
                if let Some(ref token) = page_token {
                    pairs.append_pair("pageToken", token);
                }
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(self.token.secret())
                .send()
                .await?;
            let page: FileList = check(response, "list the folder").await?.json().await?;
            debug!("Fetched page with {} entries", page.files.len());
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(files)
    }

    #[instrument(skip(self))]
    async fn fetch_thumbnail(&self, file_id: &str, size: u32) -> Result<Thumbnail> {
        let url = self.thumbnail_url(file_id, size)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;
        let response = check(response, "render the thumbnail").await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?.to_vec();
        debug!("Thumbnail for {}: {} bytes ({:?})", file_id, bytes.len(), content_type);

        Ok(Thumbnail {
            bytes,
            content_type,
        })
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn create_file(
        &self,
        folder: &FolderReference,
        name: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<StoredFile> {
        let mut url = self
            .upload_base
            .join("upload/drive/v3/files")
            .context("Failed to construct upload URL")?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", FILE_FIELDS)
            .append_pair("supportsAllDrives", "true");

        let metadata = json!({
            "name": name,
            "mimeType": mime_type,
            "parents": [folder.as_str()],
        });
        let body = multipart_related(&metadata, mime_type, &content);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(body)
            .send()
            .await?;
        let created: StoredFile = check(response, "create the file").await?.json().await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn share_with_link(&self, file_id: &str) -> Result<()> {
        let url = self.files_url(&format!("/{}/permissions", file_id))?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;
        check(response, "share the file").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn trash_file(&self, file_id: &str) -> Result<()> {
        let url = self.files_url(&format!("/{}", file_id))?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(self.token.secret())
            .json(&json!({ "trashed": true }))
            .send()
            .await?;
        check(response, "trash the file").await?;
        Ok(())
    }
}

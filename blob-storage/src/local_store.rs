use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use crate::errors::{StoreError, StoreResult};
use crate::store::{new_blob_id, Blob, BlobKind, BlobStore, NewBlob};

const CONTENT_FILE: &str = "content";
const THUMBNAIL_FILE: &str = "thumbnail";
const META_FILE: &str = "meta.json";

#[derive(Serialize, Deserialize, Debug)]
struct BlobMeta {
    filename: String,
    size: u64,
    content_type: Option<String>,
    created_at: DateTime<Utc>,
}

/// Writes blobs to `<base>/<kind>/<id>/`, one directory per blob.
#[derive(Clone, Debug)]
pub struct LocalFileBlobStore {
    base_path: PathBuf,
}

impl LocalFileBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn blob_dir(&self, kind: BlobKind, id: &str) -> PathBuf {
        self.base_path.join(kind.as_str()).join(id)
    }
}

// Ids come straight from request paths, so anything that isn't a generated id
// must never reach the filesystem.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

async fn read_optional(path: PathBuf) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fills a freshly created blob directory. On failure the directory is removed,
/// since without meta.json it could never be read back.
async fn write_blob(dir: &Path, blob: &NewBlob) -> StoreResult<()> {
    let written = populate(dir, blob).await;
    if written.is_err() {
        if let Err(cleanup) = fs::remove_dir_all(dir).await {
            tracing::warn!("Could not remove partial blob {}: {}", dir.display(), cleanup);
        }
    }
    written
}

async fn populate(dir: &Path, blob: &NewBlob) -> StoreResult<()> {
    fs::write(dir.join(CONTENT_FILE), &blob.content).await?;
    if !blob.thumbnail.is_empty() {
        fs::write(dir.join(THUMBNAIL_FILE), &blob.thumbnail).await?;
    }
    let meta = BlobMeta {
        filename: blob.filename.clone(),
        size: blob.size,
        content_type: blob.content_type.clone(),
        created_at: blob.created_at,
    };
    fs::write(dir.join(META_FILE), serde_json::to_vec(&meta)?).await?;
    Ok(())
}

#[async_trait]
impl BlobStore for LocalFileBlobStore {
    async fn get(&self, kind: BlobKind, id: &str) -> StoreResult<Option<Blob>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let dir = self.blob_dir(kind, id);

        // meta.json is written last, so its absence means the blob doesn't exist (yet).
        let Some(meta_bytes) = read_optional(dir.join(META_FILE)).await? else {
            return Ok(None);
        };
        let meta: BlobMeta = serde_json::from_slice(&meta_bytes)?;
        let content = Bytes::from(fs::read(dir.join(CONTENT_FILE)).await?);
        let thumbnail = read_optional(dir.join(THUMBNAIL_FILE)).await?.map(Bytes::from).unwrap_or_default();

        Ok(Some(Blob {
            id: id.to_string(),
            kind,
            content,
            thumbnail,
            filename: meta.filename,
            size: meta.size,
            content_type: meta.content_type,
            created_at: meta.created_at,
        }))
    }

    async fn create(&self, kind: BlobKind, blob: NewBlob) -> StoreResult<Blob> {
        let id = new_blob_id();
        let dir = self.blob_dir(kind, &id);

        fs::create_dir_all(self.base_path.join(kind.as_str())).await?;
        if let Err(e) = fs::create_dir(&dir).await {
            return Err(match e.kind() {
                ErrorKind::AlreadyExists => StoreError::Conflict(id),
                _ => e.into(),
            });
        }

        write_blob(&dir, &blob).await?;

        tracing::debug!("Stored {} blob {} under {}", kind, id, dir.display());
        Ok(Blob::from_new(id, kind, blob))
    }
}

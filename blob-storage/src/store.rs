use std::fmt;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::errors::StoreResult;

/// Namespace a blob lives in. Ids are only unique within a namespace.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    Attachment,
    Avatar,
}

impl BlobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKind::Attachment => "attachment",
            BlobKind::Avatar => "avatar",
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blob that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewBlob {
    pub content: Vec<u8>,
    /// Empty when no thumbnail exists for this blob.
    pub thumbnail: Vec<u8>,
    pub filename: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewBlob {
    pub fn new(content: Vec<u8>, filename: impl Into<String>, size: u64) -> Self {
        Self {
            content,
            thumbnail: Vec::new(),
            filename: filename.into(),
            size,
            content_type: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Vec<u8>) -> Self {
        self.thumbnail = thumbnail;
        self
    }
}

/// A stored blob. Never mutated once created; `id` doubles as its cache validator.
/// Payloads are shared, so cloning a blob doesn't copy its bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub id: String,
    pub kind: BlobKind,
    pub content: Bytes,
    pub thumbnail: Bytes,
    pub filename: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Blob {
    pub fn from_new(id: String, kind: BlobKind, new: NewBlob) -> Self {
        Self {
            id,
            kind,
            content: Bytes::from(new.content),
            thumbnail: Bytes::from(new.thumbnail),
            filename: new.filename,
            size: new.size,
            content_type: new.content_type,
            created_at: new.created_at,
        }
    }

    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail.is_empty()
    }
}

/// Generates a fresh blob id.
pub fn new_blob_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trait for storing and fetching immutable blobs by their ids.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetches a blob. `Ok(None)` means the id is unknown in that namespace.
    async fn get(&self, kind: BlobKind, id: &str) -> StoreResult<Option<Blob>>;

    /// Stores a blob under a newly generated id and returns it.
    async fn create(&self, kind: BlobKind, blob: NewBlob) -> StoreResult<Blob>;
}

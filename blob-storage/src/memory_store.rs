use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use crate::errors::{StoreError, StoreResult};
use crate::store::{new_blob_id, Blob, BlobKind, BlobStore, NewBlob};

/// Keeps every blob in process memory. Contents are lost on restart.
/// Reads hand out clones that share the stored payload bytes.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<(BlobKind, String), Blob>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, kind: BlobKind, id: &str) -> StoreResult<Option<Blob>> {
        Ok(self.blobs.get(&(kind, id.to_string())).map(|entry| entry.value().clone()))
    }

    async fn create(&self, kind: BlobKind, blob: NewBlob) -> StoreResult<Blob> {
        let id = new_blob_id();
        match self.blobs.entry((kind, id.clone())) {
            Entry::Occupied(_) => Err(StoreError::Conflict(id)),
            Entry::Vacant(slot) => {
                let stored = Blob::from_new(id, kind, blob);
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}

pub mod errors;
pub mod local_store;
pub mod memory_store;
pub mod store;

pub use errors::{StoreError, StoreResult};
pub use local_store::LocalFileBlobStore;
pub use memory_store::MemoryBlobStore;
pub use store::{Blob, BlobKind, BlobStore, NewBlob};

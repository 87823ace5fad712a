use std::sync::Arc;
use actix_web::web;
use blob_store::BlobStore;
use crate::config::TatamiConfig;
use crate::fetcher::AvatarFetcher;
use crate::users::UserStore;

pub mod file_service;
pub mod upload_service;

/// Room for multipart framing around the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

pub struct AppState {
    pub config: TatamiConfig,
    pub blobs: Arc<dyn BlobStore>,
    pub users: Arc<dyn UserStore>,
    pub fetcher: Arc<dyn AvatarFetcher>,
}

impl AppState {
    pub fn new(
        config: TatamiConfig,
        blobs: Arc<dyn BlobStore>,
        users: Arc<dyn UserStore>,
        fetcher: Arc<dyn AvatarFetcher>,
    ) -> Self {
        Self { config, blobs, users, fetcher }
    }

    /// Body limit for buffered requests. Slightly above the upload limit so that
    /// oversized files reach the size check and get a descriptive 413.
    pub fn payload_config(&self) -> web::PayloadConfig {
        let limit = self.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);
        web::PayloadConfig::new(usize::try_from(limit).unwrap_or(usize::MAX))
    }
}

/// Registers every route under `/tatami`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tatami")
            .service(file_service::download)
            .service(file_service::thumbnail)
            .service(file_service::avatar)
            .service(upload_service::upload)
            .service(upload_service::upload_ie)
            .service(upload_service::upload_avatar_multipart)
            .service(upload_service::upload_avatar_ie)
            .service(upload_service::upload_url_avatar),
    );
}

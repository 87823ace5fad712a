use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::StoreError;
use serde_json::error::Error as SerdeError;
use thiserror::Error;
use validator::ValidationErrors;
use crate::fetcher::FetchError;
use crate::users::UserStoreError;


#[derive(Debug, Error)]
pub enum TatamiErr {
    #[error("Blob storage failed")]
    Store(#[from] StoreError),

    #[error("User store failed")]
    UserStore(#[from] UserStoreError),

    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    StorageSizeExceeded { size: u64, limit: u64 },

    #[error("Upload size {0} is too large to describe")]
    SizeOverflow(u64),

    #[error("Failed to parse multipart body")]
    Multipart(#[from] multer::Error),

    #[error("Request has no uploadFile part")]
    MissingUpload,

    #[error("Failed to parse JSON")]
    Json(#[from] SerdeError),

    #[error("Invalid avatar reference")]
    Validation(#[from] ValidationErrors),

    #[error("Avatar reference is not an http(s) URL: {0}")]
    UnsupportedReference(String),

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Failed to fetch referenced avatar")]
    RemoteFetch(#[from] FetchError),
}

impl ResponseError for TatamiErr {
    fn status_code(&self) -> StatusCode {
        match self {
            TatamiErr::Store(_) | TatamiErr::UserStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TatamiErr::StorageSizeExceeded { .. }
            | TatamiErr::SizeOverflow(_)
            | TatamiErr::RemoteFetch(FetchError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            TatamiErr::Multipart(_)
            | TatamiErr::MissingUpload
            | TatamiErr::Json(_)
            | TatamiErr::Validation(_)
            | TatamiErr::UnsupportedReference(_) => StatusCode::BAD_REQUEST,
            TatamiErr::Unauthenticated => StatusCode::UNAUTHORIZED,
            TatamiErr::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        }
        match self {
            TatamiErr::Validation(errors) => HttpResponse::BadRequest().json(errors),
            _ => HttpResponse::build(status).body(self.to_string()),
        }
    }
}

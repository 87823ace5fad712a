//! Fakes and request builders shared by the handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::{web, App, HttpRequest};
use async_trait::async_trait;
use blob_store::{Blob, BlobKind, BlobStore, MemoryBlobStore, NewBlob, StoreResult};
use url::Url;
use crate::config::TatamiConfig;
use crate::fetcher::{AvatarFetcher, FetchError};
use crate::services::{configure, AppState};
use crate::users::{InMemoryUserStore, User, UserResult, UserStore, UserStoreError};

pub const BOUNDARY: &str = "tatami-test-boundary";
pub const BASE_URL: &str = "http://tatami.test";
pub const IDENTITY_HEADER: &str = "X-Forwarded-User";
pub const LOGIN: &str = "jdoe@ippon.fr";

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
        b = BOUNDARY,
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn multipart_request(field: &str, filename: &str, content_type: &str, data: &[u8]) -> (HttpRequest, web::Bytes) {
    let req = TestRequest::post()
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .to_http_request();
    (req, web::Bytes::from(multipart_body(field, filename, content_type, data)))
}

/// A POST of `data` as the `uploadFile` part.
pub fn upload_post(uri: &str, filename: &str, data: &[u8]) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body("uploadFile", filename, "image/png", data))
}

pub struct FakeFetcher {
    response: Result<Vec<u8>, u16>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvatarFetcher for FakeFetcher {
    async fn fetch(&self, _url: &Url, limit: u64) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = self.response.clone().map_err(FetchError::Status)?;
        if content.len() as u64 > limit {
            return Err(FetchError::TooLarge { size: content.len() as u64, limit });
        }
        Ok(content)
    }
}

struct BrokenBlobStore;

#[async_trait]
impl BlobStore for BrokenBlobStore {
    async fn get(&self, _kind: BlobKind, _id: &str) -> StoreResult<Option<Blob>> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into())
    }

    async fn create(&self, _kind: BlobKind, _blob: NewBlob) -> StoreResult<Blob> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into())
    }
}

/// Resolves users but refuses every save.
struct ReadOnlyUserStore;

#[async_trait]
impl UserStore for ReadOnlyUserStore {
    async fn get_current(&self, login: &str) -> UserResult<Option<User>> {
        Ok(Some(User::new(login)))
    }

    async fn save(&self, _user: User) -> UserResult<()> {
        Err(UserStoreError::Unavailable("read only".to_string()))
    }
}

pub struct TestApp {
    pub blobs: Arc<MemoryBlobStore>,
    pub users: Arc<InMemoryUserStore>,
    pub fetcher: Arc<FakeFetcher>,
    blob_store: Arc<dyn BlobStore>,
    user_store: Arc<dyn UserStore>,
    max_upload_bytes: u64,
}

pub fn test_app() -> TestApp {
    let blobs = Arc::new(MemoryBlobStore::new());
    let users = Arc::new(InMemoryUserStore::new());
    TestApp {
        blob_store: blobs.clone(),
        user_store: users.clone(),
        blobs,
        users,
        fetcher: Arc::new(FakeFetcher { response: Ok(b"remote avatar".to_vec()), calls: AtomicUsize::new(0) }),
        max_upload_bytes: 1024,
    }
}

impl TestApp {
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_broken_blobs(mut self) -> Self {
        self.blob_store = Arc::new(BrokenBlobStore);
        self
    }

    pub fn with_read_only_users(mut self) -> Self {
        self.user_store = Arc::new(ReadOnlyUserStore);
        self
    }

    pub fn with_fetch_status(mut self, status: u16) -> Self {
        self.fetcher = Arc::new(FakeFetcher { response: Err(status), calls: AtomicUsize::new(0) });
        self
    }

    pub fn state(&self) -> web::Data<AppState> {
        let config = TatamiConfig::new(BASE_URL, self.max_upload_bytes, IDENTITY_HEADER)
            .expect("test config is valid");
        web::Data::new(AppState::new(
            config,
            self.blob_store.clone(),
            self.user_store.clone(),
            self.fetcher.clone(),
        ))
    }

    pub fn build(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let state = self.state();
        App::new()
            .app_data(state.payload_config())
            .app_data(state)
            .configure(configure)
    }
}

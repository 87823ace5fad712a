use std::convert::Infallible;
use actix_web::http::header;
use actix_web::{web, HttpRequest};
use crate::errors::TatamiErr;

/// Form field every upload route reads the file from.
pub const UPLOAD_FIELD: &str = "uploadFile";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Pulls the `uploadFile` part out of an already buffered multipart body.
pub async fn read_upload(req: &HttpRequest, body: web::Bytes) -> Result<UploadedFile, TatamiErr> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or(TatamiErr::Multipart(multer::Error::NoBoundary))?;
    let boundary = multer::parse_boundary(content_type)?;

    let stream = futures::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = field.bytes().await?.to_vec();
        return Ok(UploadedFile { filename, content_type, data });
    }
    Err(TatamiErr::MissingUpload)
}

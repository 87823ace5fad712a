//! Conditional GET for stored blobs.
//!
//! The blob id is the ETag: ids are never reused, so a client holding the id
//! already holds the exact bytes. Every outcome, 404 included, is cacheable
//! for [`CACHE_SECONDS`].

use std::future::{ready, Ready};
use std::time::{Duration, SystemTime};
use actix_web::dev::Payload;
use actix_web::http::header::{self, HeaderValue, HttpDate};
use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use blob_store::Blob;

pub const CACHE_SECONDS: u64 = 60 * 60 * 24 * 30;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub fn cache_control_value() -> String {
    format!("max-age={}, must-revalidate", CACHE_SECONDS)
}

/// Which bytes of a blob a route serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Content,
    Thumbnail,
}

/// The request headers the decision depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalRequest {
    pub if_none_match: Option<String>,
}

impl ConditionalRequest {
    pub fn new(if_none_match: Option<String>) -> Self {
        Self { if_none_match }
    }

    /// Accepts the bare id as well as its quoted entity-tag form.
    pub fn matches(&self, id: &str) -> bool {
        match self.if_none_match.as_deref().map(str::trim) {
            Some(validator) => {
                validator == id
                    || validator
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                        .is_some_and(|v| v == id)
            }
            None => false,
        }
    }
}

impl FromRequest for ConditionalRequest {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let if_none_match = req
            .headers()
            .get(header::IF_NONE_MATCH)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        ready(Ok(ConditionalRequest::new(if_none_match)))
    }
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Body { etag: String, content_type: String, payload: Bytes },
    NotModified { etag: String },
    NotFound,
}

impl Outcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Outcome::Body { .. } => StatusCode::OK,
            Outcome::NotModified { .. } => StatusCode::NOT_MODIFIED,
            Outcome::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct CachedResponse {
    pub outcome: Outcome,
    pub expires: SystemTime,
}

/// Picks 200, 304 or 404 for `blob`. No I/O happens here.
pub fn decide(
    blob: Option<Blob>,
    variant: Variant,
    request: &ConditionalRequest,
    now: SystemTime,
) -> CachedResponse {
    let expires = now + Duration::from_secs(CACHE_SECONDS);
    let outcome = match blob {
        None => Outcome::NotFound,
        Some(blob) if variant == Variant::Thumbnail && !blob.has_thumbnail() => Outcome::NotFound,
        Some(blob) if request.matches(&blob.id) => Outcome::NotModified { etag: blob.id },
        Some(blob) => {
            let content_type = blob
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            let payload = match variant {
                Variant::Content => blob.content,
                Variant::Thumbnail => blob.thumbnail,
            };
            Outcome::Body { etag: blob.id, content_type, payload }
        }
    };
    CachedResponse { outcome, expires }
}

impl CachedResponse {
    pub fn into_response(self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.outcome.status_code());
        builder
            .insert_header((header::CACHE_CONTROL, cache_control_value()))
            .insert_header(header::Expires(HttpDate::from(self.expires)));

        match self.outcome {
            Outcome::Body { etag, content_type, payload } => {
                // Stored metadata came from the uploader; don't let a bad value break the response.
                let content_type = HeaderValue::from_str(&content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
                builder
                    .insert_header((header::ETAG, etag))
                    .insert_header((header::CONTENT_TYPE, content_type))
                    .body(payload)
            }
            Outcome::NotModified { etag } => builder.insert_header((header::ETAG, etag)).finish(),
            Outcome::NotFound => builder.finish(),
        }
    }
}

use std::time::SystemTime;
use actix_web::{get, web, HttpResponse};
use blob_store::BlobKind;
use serde::Deserialize;
use crate::conditional::{self, ConditionalRequest, Variant};
use crate::errors::TatamiErr;
use crate::services::AppState;

#[derive(Deserialize, Debug)]
struct BlobPath {
    id: String,
}

async fn serve(
    state: &AppState,
    kind: BlobKind,
    variant: Variant,
    id: &str,
    request: &ConditionalRequest,
) -> Result<HttpResponse, TatamiErr> {
    let blob = state.blobs.get(kind, id).await?;
    let cached = conditional::decide(blob, variant, request, SystemTime::now());
    tracing::debug!("{} {} {:?} -> {}", kind, id, variant, cached.outcome.status_code());
    Ok(cached.into_response())
}

#[get("/file/{id}/{name:.*}")]
#[tracing::instrument(skip(request, state))]
pub async fn download(
    path: web::Path<BlobPath>,
    request: ConditionalRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    serve(&state, BlobKind::Attachment, Variant::Content, &path.id, &request).await
}

#[get("/thumbnail/{id}/{name:.*}")]
#[tracing::instrument(skip(request, state))]
pub async fn thumbnail(
    path: web::Path<BlobPath>,
    request: ConditionalRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    serve(&state, BlobKind::Attachment, Variant::Thumbnail, &path.id, &request).await
}

#[get("/avatar/{id}/{name:.*}")]
#[tracing::instrument(skip(request, state))]
pub async fn avatar(
    path: web::Path<BlobPath>,
    request: ConditionalRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    serve(&state, BlobKind::Avatar, Variant::Content, &path.id, &request).await
}

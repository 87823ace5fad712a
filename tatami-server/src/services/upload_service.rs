use actix_web::{post, web, HttpRequest, HttpResponse};
use blob_store::{BlobKind, NewBlob};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;
use crate::errors::TatamiErr;
use crate::multipart::{read_upload, UploadedFile};
use crate::services::AppState;
use crate::users::User;

pub const APP_TYPE_JSON: &str = "application/json";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

const FILE_SECTION: &str = "file";
const AVATAR_SECTION: &str = "avatar";

/// What a client gets back for a stored upload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadDescriptor {
    pub id: String,
    pub filename: String,
    pub size: i32,
    pub url: String,
}

/// Body of the by-reference avatar upload. `filename` holds the URL of the image.
#[derive(Serialize, Deserialize, Validate, Debug, Default)]
pub struct AvatarMeta {
    #[validate(url)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Checks `size` against the configured limit and narrows it for the descriptor.
pub fn descriptor_size(size: u64, limit: u64) -> Result<i32, TatamiErr> {
    if size > limit {
        return Err(TatamiErr::StorageSizeExceeded { size, limit });
    }
    i32::try_from(size).map_err(|_| TatamiErr::SizeOverflow(size))
}

/// The single string old browsers get instead of JSON: `id:::filename:::size`, form-urlencoded.
pub fn legacy_upload_body(id: &str, filename: &str, size: u64) -> String {
    let raw = format!("{}:::{}:::{}", id, filename, size);
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn new_blob(file: UploadedFile) -> NewBlob {
    let size = file.size();
    let blob = NewBlob::new(file.data, file.filename, size);
    match file.content_type {
        Some(content_type) => blob.with_content_type(content_type),
        None => blob,
    }
}

pub async fn upload_attachment(state: &AppState, file: UploadedFile) -> Result<UploadDescriptor, TatamiErr> {
    let size = descriptor_size(file.size(), state.config.max_upload_bytes)?;
    let attachment = state.blobs.create(BlobKind::Attachment, new_blob(file)).await?;
    tracing::debug!("Created attachment : {}", attachment.id);

    Ok(UploadDescriptor {
        url: state.config.public_url(FILE_SECTION, &attachment.id, &attachment.filename),
        id: attachment.id,
        filename: attachment.filename,
        size,
    })
}

/// Stores the avatar, then points `user` at it. A failed user save leaves the
/// stored avatar orphaned; it is logged and the error is returned.
pub async fn upload_avatar(
    state: &AppState,
    file: UploadedFile,
    user: User,
) -> Result<UploadDescriptor, TatamiErr> {
    let size = descriptor_size(file.size(), state.config.max_upload_bytes)?;
    let avatar = state.blobs.create(BlobKind::Avatar, new_blob(file)).await?;
    let url = state.config.public_url(AVATAR_SECTION, &avatar.id, &avatar.filename);
    tracing::info!("Avatar url : {}", url);

    link_avatar(state, user, &avatar.id).await?;
    Ok(UploadDescriptor { id: avatar.id, filename: avatar.filename, size, url })
}

/// Copies the avatar found at `meta.filename` into the store. `Ok(None)` when
/// there is nothing to copy.
pub async fn upload_avatar_by_reference(
    state: &AppState,
    meta: AvatarMeta,
    user: User,
) -> Result<Option<UploadDescriptor>, TatamiErr> {
    meta.validate()?;
    let Some(reference) = meta.filename else {
        return Ok(None);
    };
    let url = Url::parse(&reference).map_err(|_| TatamiErr::UnsupportedReference(reference.clone()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TatamiErr::UnsupportedReference(reference));
    }
    // The declared size lets oversized references fail before any download.
    descriptor_size(meta.size, state.config.max_upload_bytes)?;

    let content = state.fetcher.fetch(&url, state.config.max_upload_bytes).await?;
    let fetched = content.len() as u64;
    let size = descriptor_size(fetched, state.config.max_upload_bytes)?;
    let new = NewBlob::new(content, reference, fetched);
    let avatar = state.blobs.create(BlobKind::Avatar, new).await?;
    let public = state.config.public_url(AVATAR_SECTION, &avatar.id, "url");
    tracing::info!("Avatar url : {} (copied from {})", public, avatar.filename);

    link_avatar(state, user, &avatar.id).await?;
    Ok(Some(UploadDescriptor { id: avatar.id, filename: avatar.filename, size, url: public }))
}

async fn link_avatar(state: &AppState, mut user: User, avatar_id: &str) -> Result<(), TatamiErr> {
    user.avatar = Some(avatar_id.to_string());
    let login = user.login.clone();
    if let Err(e) = state.users.save(user).await {
        tracing::warn!("Avatar {} is orphaned, could not update user {}: {}", avatar_id, login, e);
        return Err(e.into());
    }
    Ok(())
}

async fn acting_user(req: &HttpRequest, state: &AppState) -> Result<User, TatamiErr> {
    let login = req
        .headers()
        .get(state.config.identity_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|login| !login.is_empty())
        .ok_or(TatamiErr::Unauthenticated)?;
    state.users.get_current(login).await?.ok_or(TatamiErr::Unauthenticated)
}


#[post("/rest/fileupload")]
#[tracing::instrument(skip_all)]
pub async fn upload(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    let file = read_upload(&req, body).await?;
    let descriptor = upload_attachment(&state, file).await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(vec![descriptor]))
}

#[post("/rest/fileuploadIE")]
#[tracing::instrument(skip_all)]
pub async fn upload_ie(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    let file = read_upload(&req, body).await?;
    let size = file.size();
    let descriptor = upload_attachment(&state, file).await?;
    Ok(HttpResponse::Ok()
        .content_type(TEXT_HTML)
        .body(legacy_upload_body(&descriptor.id, &descriptor.filename, size)))
}

#[post("/rest/fileupload/avatar")]
#[tracing::instrument(skip_all)]
pub async fn upload_avatar_multipart(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    let user = acting_user(&req, &state).await?;
    let file = read_upload(&req, body).await?;
    let descriptor = upload_avatar(&state, file, user).await?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(vec![descriptor]))
}

#[post("/rest/fileupload/avatarIE")]
#[tracing::instrument(skip_all)]
pub async fn upload_avatar_ie(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    let user = acting_user(&req, &state).await?;
    let file = read_upload(&req, body).await?;
    upload_avatar(&state, file, user).await?;
    Ok(HttpResponse::Ok().finish())
}

#[post("/rest/urlupload/avatar")]
#[tracing::instrument(skip_all)]
pub async fn upload_url_avatar(
    req: HttpRequest,
    request_json_bytes: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, TatamiErr> {
    let meta: Option<AvatarMeta> = serde_json::from_slice(&request_json_bytes)?;
    let Some(meta) = meta.filter(|meta| meta.filename.is_some()) else {
        return Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).body("null"));
    };
    let user = acting_user(&req, &state).await?;
    let descriptors = upload_avatar_by_reference(&state, meta, user).await?.map(|d| vec![d]);
    Ok(HttpResponse::Ok().content_type(APP_TYPE_JSON).json(descriptors))
}

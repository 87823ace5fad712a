use thiserror::Error;
use url::Url;
use crate::params::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Base URL must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("Invalid identity header name {0}")]
    InvalidIdentityHeader(String),
}

/// Settings fixed at startup and shared read-only by every handler.
#[derive(Debug, Clone)]
pub struct TatamiConfig {
    base_url: Url,
    pub max_upload_bytes: u64,
    pub identity_header: String,
}

impl TatamiConfig {
    pub fn new(base_url: &str, max_upload_bytes: u64, identity_header: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }
        if actix_web::http::header::HeaderName::from_bytes(identity_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidIdentityHeader(identity_header.to_string()));
        }
        Ok(Self {
            base_url,
            max_upload_bytes,
            identity_header: identity_header.to_string(),
        })
    }

    /// `<base>/tatami/<section>/<id>/<name>`, with `name` percent-encoded as a path segment.
    pub fn public_url(&self, section: &str, id: &str, name: &str) -> String {
        let mut url = self.base_url.clone();
        // http(s) URLs always have a path, checked in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["tatami", section, id, name]);
        }
        url.to_string()
    }
}

impl TryFrom<&Args> for TatamiConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        TatamiConfig::new(&args.tatami_url, args.max_upload_bytes, &args.identity_header)
    }
}

use std::path::PathBuf;
use clap::Parser;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[clap(long, env = "TATAMI_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub http_addr: String,
    /// Public base URL used when building links to uploaded files.
    #[clap(long, env = "TATAMI_URL", default_value = "http://localhost:8080")]
    pub tatami_url: String,
    /// Blobs are kept in memory when no data directory is given.
    #[clap(long, env = "TATAMI_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    #[clap(long, env = "TATAMI_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: u64,
    /// Header carrying the login of the user authenticated upstream.
    #[clap(long, env = "TATAMI_IDENTITY_HEADER", default_value = "X-Forwarded-User")]
    pub identity_header: String,
}

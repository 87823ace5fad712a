use std::io;
use std::sync::Arc;
use actix_web::{middleware, web, App, HttpServer};
use blob_store::{BlobStore, LocalFileBlobStore, MemoryBlobStore};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tatami_server::config::TatamiConfig;
use tatami_server::fetcher::HttpAvatarFetcher;
use tatami_server::params::Args;
use tatami_server::services::{self, AppState};
use tatami_server::users::InMemoryUserStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = TatamiConfig::try_from(&args).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let blobs: Arc<dyn BlobStore> = match &args.data_dir {
        Some(dir) => {
            tracing::info!("Storing blobs under {}", dir.display());
            Arc::new(LocalFileBlobStore::new(dir.clone()))
        }
        None => {
            tracing::warn!("No data directory given, blobs are kept in memory");
            Arc::new(MemoryBlobStore::new())
        }
    };

    let state = web::Data::new(AppState::new(
        config,
        blobs,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(HttpAvatarFetcher::new()),
    ));

    tracing::info!("Listening on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.payload_config())
            .app_data(state.clone())
            .configure(services::configure)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await
}

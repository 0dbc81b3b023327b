use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tracing::info;

use crate::{
    api,
    audio::{AudioDownloader, AudioResolver, MetadataTagger},
    config::FetchSettings,
    error::{Error, Result},
    management::{ClientState, SpotifyFetcher},
    spotify::CatalogApi,
};

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Collaborators shared by every request. Credentials are per request, so each
/// request gets its own [`SpotifyFetcher`].
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub resolver: Arc<dyn AudioResolver>,
    pub downloader: Arc<dyn AudioDownloader>,
    pub tagger: MetadataTagger,
    pub settings: FetchSettings,
}

impl AppState {
    pub fn fetcher(&self, session: ClientState) -> SpotifyFetcher {
        SpotifyFetcher::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.resolver),
            Arc::clone(&self.downloader),
            session,
            self.settings.clone(),
        )
        .with_tagger(self.tagger.clone())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/playlists/process", post(api::process_playlists))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Binds `addr` and serves the API until the process is stopped.
pub async fn start_api_server(state: Arc<AppState>, addr: &str) -> Result<()> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("invalid server address {}: {}", addr, e)))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

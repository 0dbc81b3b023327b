use std::{
    convert::Infallible,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::try_join_all;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::{
    audio::{AudioDownloader, AudioResolver, MetadataTagger},
    concurrency::map_with_concurrency,
    config::FetchSettings,
    error::{Error, Result},
    management::{auth::TokenManager, state::ClientState},
    spotify::{self, CatalogApi, CatalogRequest},
    types::{
        ArtistAlbums, ArtistDetails, BatchResult, CollectionDetails, CollectionTracks,
        DownloadOutput, TrackDetails, UserProfile,
    },
    utils,
};

const SCRATCH_FILE: &str = "track.mp3";

/// Batch metadata and audio operations for one credential session.
///
/// Every public operation first checks the credentials (refreshing them when
/// due), then talks to the catalog through the rate-limited executor. Fan-out
/// over tracks is bounded by the limits in [`FetchSettings`].
pub struct SpotifyFetcher {
    catalog: Arc<dyn CatalogApi>,
    resolver: Arc<dyn AudioResolver>,
    downloader: Arc<dyn AudioDownloader>,
    tagger: MetadataTagger,
    tokens: TokenManager,
    settings: FetchSettings,
}

impl SpotifyFetcher {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        resolver: Arc<dyn AudioResolver>,
        downloader: Arc<dyn AudioDownloader>,
        state: ClientState,
        settings: FetchSettings,
    ) -> Self {
        Self {
            catalog,
            resolver,
            downloader,
            tagger: MetadataTagger::default(),
            tokens: TokenManager::new(state),
            settings,
        }
    }

    pub fn with_tagger(mut self, tagger: MetadataTagger) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Snapshot of the session's credentials and refresh deadline.
    pub async fn client_state(&self) -> ClientState {
        self.tokens.current_state().await
    }

    /// Refreshes the credentials if due and returns the access token.
    pub async fn verify_credentials(&self) -> Result<String> {
        self.tokens
            .get_valid_token(self.catalog.as_ref(), &self.settings.retry)
            .await
    }

    fn request<'a>(&'a self, token: &'a str) -> CatalogRequest<'a> {
        CatalogRequest {
            api: self.catalog.as_ref(),
            policy: &self.settings.retry,
            token,
            page_size: self.settings.page_size,
        }
    }

    pub async fn get_track(&self, url: &str) -> Result<TrackDetails> {
        let id = catalog_id(url)?;
        let token = self.verify_credentials().await?;
        spotify::extract_track(self.request(&token), &id).await
    }

    pub async fn get_playlist(&self, url: &str) -> Result<CollectionDetails> {
        let id = catalog_id(url)?;
        let token = self.verify_credentials().await?;
        spotify::extract_playlist(self.request(&token), &id).await
    }

    pub async fn get_album(&self, url: &str) -> Result<CollectionDetails> {
        let id = catalog_id(url)?;
        let token = self.verify_credentials().await?;
        spotify::extract_album(self.request(&token), &id).await
    }

    pub async fn get_artist(&self, url: &str) -> Result<ArtistDetails> {
        let id = catalog_id(url)?;
        let token = self.verify_credentials().await?;
        spotify::extract_artist(self.request(&token), &id).await
    }

    /// The artist plus every album of their discography as a collection.
    pub async fn get_artist_albums(&self, url: &str) -> Result<ArtistAlbums> {
        let id = catalog_id(url)?;
        let token = self.verify_credentials().await?;
        let artist = spotify::extract_artist(self.request(&token), &id).await?;
        let album_ids = spotify::extract_artist_album_ids(self.request(&token), &id).await?;

        let albums = map_with_concurrency(
            &album_ids,
            self.settings.metadata_concurrency,
            |album_id| self.get_album(album_id),
        )
        .await?;

        Ok(ArtistAlbums { albums, artist })
    }

    pub async fn get_user(&self, id: &str) -> Result<UserProfile> {
        let id = catalog_id(id)?;
        let token = self.verify_credentials().await?;
        spotify::extract_user(self.request(&token), &id).await
    }

    /// Every track of a playlist with full metadata. Any failing track fails
    /// the whole call.
    pub async fn get_tracks_from_playlist(&self, url: &str) -> Result<CollectionTracks> {
        let playlist = self.get_playlist(url).await?;
        self.expand_tracks(playlist).await
    }

    pub async fn get_tracks_from_album(&self, url: &str) -> Result<CollectionTracks> {
        let album = self.get_album(url).await?;
        self.expand_tracks(album).await
    }

    /// [`get_tracks_from_playlist`](Self::get_tracks_from_playlist) for several
    /// URLs at once, in input order.
    pub async fn get_tracks_from_playlists(&self, urls: &[String]) -> Result<Vec<CollectionTracks>> {
        try_join_all(urls.iter().map(|url| self.get_tracks_from_playlist(url))).await
    }

    pub async fn get_tracks_from_albums(&self, urls: &[String]) -> Result<Vec<CollectionTracks>> {
        try_join_all(urls.iter().map(|url| self.get_tracks_from_album(url))).await
    }

    async fn expand_tracks(&self, collection: CollectionDetails) -> Result<CollectionTracks> {
        info!(
            name = %collection.name,
            tracks = collection.tracks.len(),
            "fetching track metadata"
        );

        let tracks = map_with_concurrency(
            &collection.tracks,
            self.settings.metadata_concurrency,
            |id| self.get_track(id),
        )
        .await?;

        Ok(CollectionTracks {
            name: collection.name,
            total_tracks: collection.total_tracks,
            tracks,
        })
    }

    /// Finds a playable audio URL for `track`.
    pub(crate) async fn resolve_audio(&self, track: &TrackDetails) -> Result<String> {
        let query = utils::search_query(track);
        match self.resolver.resolve(&query).await? {
            Some(link) => Ok(link),
            None => Err(Error::Resolution {
                track: track.name.clone(),
            }),
        }
    }

    /// Downloads one track.
    ///
    /// Runs credential check, metadata fetch, audio resolution, audio fetch
    /// and tagging in order. With a `destination` the tagged file is copied
    /// there and its path returned; without one the file contents are
    /// returned. Scratch files are removed on every exit path.
    pub async fn download_track(
        &self,
        url: &str,
        destination: Option<&Path>,
    ) -> Result<DownloadOutput> {
        let track = self.get_track(url).await?;
        self.download_tagged(&track, destination).await
    }

    /// [`download_track`](Self::download_track) for metadata the caller
    /// already holds; no catalog request is made.
    pub async fn download_tagged(
        &self,
        track: &TrackDetails,
        destination: Option<&Path>,
    ) -> Result<DownloadOutput> {
        let link = self.resolve_audio(track).await?;

        let scratch = TempDir::new()?;
        let audio_path = scratch.path().join(SCRATCH_FILE);
        self.downloader.fetch(&link, &audio_path).await?;

        if let Err(e) = self.tagger.apply(&audio_path, track).await {
            warn!(track = %track.name, error = %e, "could not tag audio file");
        }

        let output = match destination {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    async_fs::create_dir_all(parent).await?;
                }
                async_fs::copy(&audio_path, path).await?;
                DownloadOutput::Saved(path.to_path_buf())
            }
            None => DownloadOutput::Buffer(async_fs::read(&audio_path).await?),
        };

        release_scratch(scratch);
        Ok(output)
    }

    /// Resolves and fetches the audio for already known metadata, untagged.
    pub async fn download_track_from_info(&self, track: &TrackDetails) -> Result<Vec<u8>> {
        let link = self.resolve_audio(track).await?;

        let scratch = TempDir::new()?;
        let audio_path = scratch.path().join(SCRATCH_FILE);
        self.downloader.fetch(&link, &audio_path).await?;
        let bytes = async_fs::read(&audio_path).await?;

        release_scratch(scratch);
        Ok(bytes)
    }

    /// Downloads every track of a playlist as in-memory buffers.
    pub async fn download_playlist(&self, url: &str) -> Result<BatchResult<Vec<u8>>> {
        let playlist = self.get_playlist(url).await?;
        Ok(self.download_batch(&playlist.tracks).await)
    }

    pub async fn download_album(&self, url: &str) -> Result<BatchResult<Vec<u8>>> {
        let album = self.get_album(url).await?;
        Ok(self.download_batch(&album.tracks).await)
    }

    pub async fn download_playlists(&self, urls: &[String]) -> Result<Vec<BatchResult<Vec<u8>>>> {
        try_join_all(urls.iter().map(|url| self.download_playlist(url))).await
    }

    /// Saves every track of a playlist or album into `directory` as
    /// `title - artist.mp3`.
    pub async fn download_collection_to(
        &self,
        collection: &CollectionDetails,
        directory: &Path,
    ) -> BatchResult<PathBuf> {
        let Ok(saved) = map_with_concurrency(
            &collection.tracks,
            self.settings.download_concurrency,
            |id| async move {
                let outcome = async {
                    let track = self.get_track(id).await?;
                    let file = utils::sanitize_filename(&format!(
                        "{} - {}.mp3",
                        track.name,
                        track.primary_artist()
                    ));
                    self.download_tagged(&track, Some(&directory.join(file)))
                        .await
                }
                .await;

                Ok::<_, Infallible>(match outcome {
                    Ok(DownloadOutput::Saved(path)) => Some(path),
                    Ok(DownloadOutput::Buffer(_)) => None,
                    Err(e) => {
                        warn!(track = %id, error = %e, "track download failed");
                        None
                    }
                })
            },
        )
        .await;

        saved
    }

    async fn download_batch(&self, track_ids: &[String]) -> BatchResult<Vec<u8>> {
        let Ok(buffers) = map_with_concurrency(
            track_ids,
            self.settings.download_concurrency,
            |id| async move {
                Ok::<_, Infallible>(match self.download_track(id, None).await {
                    Ok(DownloadOutput::Buffer(bytes)) => Some(bytes),
                    Ok(DownloadOutput::Saved(_)) => None,
                    Err(e) => {
                        warn!(track = %id, error = %e, "track download failed");
                        None
                    }
                })
            },
        )
        .await;

        buffers
    }
}

/// Extracts the catalog id, rejecting references that yield none.
fn catalog_id(reference: &str) -> Result<String> {
    let id = utils::get_id(reference);
    if id.is_empty() {
        return Err(Error::InvalidReference(reference.to_string()));
    }
    Ok(id)
}

/// Removes a scratch directory; failures are only logged.
fn release_scratch(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        debug!(path = %path.display(), error = %e, "could not remove scratch directory");
    }
}

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use spotfetch::{
    Error, Result,
    audio::{AudioDownloader, AudioResolver},
    config::FetchSettings,
    error::ResponseDetails,
    management::{ArchiveSink, ClientState, SpotifyFetcher},
    spotify::CatalogApi,
    types::{
        AlbumObject, AlbumSummary, ArtistObject, Image, Paging, PlaylistItem, PlaylistObject,
        PlaylistOwner, SimpleArtist, TokenResponse, TrackAlbum, TrackObject, TrackRef,
        UserProfile,
    },
};

pub fn track_id(n: usize) -> String {
    format!("t{:03}", n)
}

pub fn track_object(id: &str) -> TrackObject {
    TrackObject {
        id: Some(id.to_string()),
        name: format!("Song {}", id),
        artists: vec![SimpleArtist {
            id: None,
            name: format!("Artist {}", id),
        }],
        album: TrackAlbum {
            name: "Album".to_string(),
            release_date: Some("2020-01-01".to_string()),
            images: vec![Image {
                url: format!("http://127.0.0.1:9/image/{}", id),
                height: None,
                width: None,
            }],
        },
    }
}

fn paging<T: Clone>(all: &[T], limit: usize, offset: usize) -> Paging<T> {
    let items: Vec<T> = all.iter().skip(offset).take(limit).cloned().collect();
    let end = offset + items.len();
    Paging {
        next: (end < all.len()).then(|| format!("offset={}", end)),
        total: all.len(),
        limit: Some(limit),
        offset: Some(offset),
        items,
    }
}

/// In-memory catalog with call counters.
#[derive(Default)]
pub struct FakeCatalog {
    pub playlists: HashMap<String, (String, Vec<String>)>,
    pub albums: HashMap<String, (String, Vec<String>)>,
    pub artist_albums: HashMap<String, Vec<String>>,
    pub missing_tracks: HashSet<String>,
    pub failing_grants: bool,
    pub page_size: usize,
    pub track_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub grant_calls: AtomicUsize,
    pub refresh_calls: Mutex<Vec<(String, String, Option<String>)>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            page_size: 50,
            ..Self::default()
        }
    }

    pub fn with_playlist(mut self, id: &str, name: &str, tracks: Vec<String>) -> Self {
        self.playlists
            .insert(id.to_string(), (name.to_string(), tracks));
        self
    }

    pub fn with_album(mut self, id: &str, name: &str, tracks: Vec<String>) -> Self {
        self.albums.insert(id.to_string(), (name.to_string(), tracks));
        self
    }

    pub fn with_failing_grants(mut self) -> Self {
        self.failing_grants = true;
        self
    }

    pub fn without_track(mut self, id: &str) -> Self {
        self.missing_tracks.insert(id.to_string());
        self
    }

    fn not_found() -> Error {
        Error::upstream(ResponseDetails::new(404))
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn track(&self, _token: &str, id: &str) -> Result<TrackObject> {
        self.track_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_tracks.contains(id) {
            return Err(Self::not_found());
        }
        Ok(track_object(id))
    }

    async fn playlist(&self, _token: &str, id: &str) -> Result<PlaylistObject> {
        let (name, tracks) = self.playlists.get(id).ok_or_else(Self::not_found)?;
        let items: Vec<PlaylistItem> = tracks
            .iter()
            .map(|t| PlaylistItem {
                track: Some(TrackRef {
                    id: Some(t.clone()),
                }),
            })
            .collect();

        Ok(PlaylistObject {
            id: id.to_string(),
            name: name.clone(),
            owner: PlaylistOwner {
                display_name: Some("owner".to_string()),
            },
            tracks: paging(&items, self.page_size, 0),
        })
    }

    async fn playlist_tracks(
        &self,
        _token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<PlaylistItem>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let (_, tracks) = self.playlists.get(id).ok_or_else(Self::not_found)?;
        let items: Vec<PlaylistItem> = tracks
            .iter()
            .map(|t| PlaylistItem {
                track: Some(TrackRef {
                    id: Some(t.clone()),
                }),
            })
            .collect();
        Ok(paging(&items, limit, offset))
    }

    async fn album(&self, _token: &str, id: &str) -> Result<AlbumObject> {
        let (name, tracks) = self.albums.get(id).ok_or_else(Self::not_found)?;
        let items: Vec<TrackRef> = tracks
            .iter()
            .map(|t| TrackRef {
                id: Some(t.clone()),
            })
            .collect();

        Ok(AlbumObject {
            id: id.to_string(),
            name: name.clone(),
            label: Some("label".to_string()),
            tracks: paging(&items, self.page_size, 0),
        })
    }

    async fn album_tracks(
        &self,
        _token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<TrackRef>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let (_, tracks) = self.albums.get(id).ok_or_else(Self::not_found)?;
        let items: Vec<TrackRef> = tracks
            .iter()
            .map(|t| TrackRef {
                id: Some(t.clone()),
            })
            .collect();
        Ok(paging(&items, limit, offset))
    }

    async fn artist(&self, _token: &str, id: &str) -> Result<ArtistObject> {
        Ok(ArtistObject {
            id: id.to_string(),
            name: format!("Artist {}", id),
            href: format!("https://api.spotify.com/v1/artists/{}", id),
        })
    }

    async fn artist_albums(
        &self,
        _token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<AlbumSummary>> {
        let albums: Vec<AlbumSummary> = self
            .artist_albums
            .get(id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|album_id| AlbumSummary {
                name: format!("Album {}", album_id),
                id: album_id,
            })
            .collect();
        Ok(paging(&albums, limit, offset))
    }

    async fn user(&self, _token: &str, id: &str) -> Result<UserProfile> {
        Ok(UserProfile {
            id: id.to_string(),
            display_name: Some(format!("User {}", id)),
            external_urls: Default::default(),
            followers: Default::default(),
            href: None,
            images: Vec::new(),
            kind: Some("user".to_string()),
            uri: Some(format!("spotify:user:{}", id)),
        })
    }

    async fn client_credentials_grant(
        &self,
        _client_id: &str,
        _client_secret: &str,
    ) -> Result<TokenResponse> {
        let n = self.grant_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_grants {
            return Err(Error::upstream(ResponseDetails::new(400)));
        }
        Ok(TokenResponse {
            access_token: format!("service-token-{}", n),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
            refresh_token: None,
            scope: None,
        })
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<TokenResponse> {
        self.refresh_calls.lock().unwrap().push((
            refresh_token.to_string(),
            client_id.to_string(),
            client_secret.map(str::to_string),
        ));
        Ok(TokenResponse {
            access_token: "refreshed-token".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
            refresh_token: None,
            scope: None,
        })
    }
}

/// Resolves every query to a fake watch URL, except queries containing one of
/// the `unresolvable` fragments.
#[derive(Default)]
pub struct FakeResolver {
    pub unresolvable: Vec<String>,
}

#[async_trait]
impl AudioResolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<Option<String>> {
        if self.unresolvable.iter().any(|u| query.contains(u.as_str())) {
            return Ok(None);
        }
        Ok(Some(format!(
            "https://www.youtube.com/watch?v={}",
            query.replace(' ', "_")
        )))
    }
}

/// Writes the URL itself as the "audio", failing for URLs containing one of
/// the `failing` fragments. Every output path it is handed is recorded.
#[derive(Default)]
pub struct FakeDownloader {
    pub failing: Vec<String>,
    pub fetched: Mutex<Vec<String>>,
    pub outputs: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl AudioDownloader for FakeDownloader {
    async fn fetch(&self, url: &str, output: &Path) -> Result<()> {
        self.outputs.lock().unwrap().push(output.to_path_buf());
        if self.failing.iter().any(|f| url.contains(f.as_str())) {
            return Err(Error::Fetch {
                message: format!("exit status 1 for {}", url),
            });
        }
        self.fetched.lock().unwrap().push(url.to_string());
        tokio::fs::write(output, url.as_bytes()).await?;
        Ok(())
    }
}

/// Archive sink that keeps entries in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub entries: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    pub finished: Arc<AtomicUsize>,
}

#[async_trait]
impl ArchiveSink for MemorySink {
    async fn append(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        assert_eq!(
            self.finished.load(Ordering::SeqCst),
            0,
            "append after finish"
        );
        self.entries.lock().unwrap().push((name.to_string(), data));
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn fetcher(
    catalog: Arc<FakeCatalog>,
    resolver: FakeResolver,
    downloader: Arc<FakeDownloader>,
) -> SpotifyFetcher {
    let session = ClientState::user("user-token", None, None).unwrap();
    SpotifyFetcher::new(
        catalog,
        Arc::new(resolver),
        downloader,
        session,
        FetchSettings::default(),
    )
}

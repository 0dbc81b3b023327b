use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config,
    error::{Error, ResponseDetails, Result},
    types::{
        AlbumObject, AlbumSummary, ArtistObject, Paging, PlaylistItem, PlaylistObject,
        TokenResponse, TrackObject, TrackRef, UserProfile,
    },
};

/// The catalog and token endpoints spotfetch talks to.
///
/// Every call is a single HTTP exchange: no retries and no token handling
/// happen here. Non-2xx answers come back as `Error::Upstream`.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn track(&self, token: &str, id: &str) -> Result<TrackObject>;

    async fn playlist(&self, token: &str, id: &str) -> Result<PlaylistObject>;

    async fn playlist_tracks(
        &self,
        token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<PlaylistItem>>;

    async fn album(&self, token: &str, id: &str) -> Result<AlbumObject>;

    async fn album_tracks(
        &self,
        token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<TrackRef>>;

    async fn artist(&self, token: &str, id: &str) -> Result<ArtistObject>;

    async fn artist_albums(
        &self,
        token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<AlbumSummary>>;

    async fn user(&self, token: &str, id: &str) -> Result<UserProfile>;

    /// Client-credentials grant authenticated with HTTP basic auth.
    async fn client_credentials_grant(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse>;

    /// Refresh-token grant.
    ///
    /// With a secret the client authenticates via basic auth; without one the
    /// `client_id` travels in the form body, as public clients do.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<TokenResponse>;
}

/// reqwest implementation of [`CatalogApi`] against the Spotify Web API.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_url: String,
}

impl Default for SpotifyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotifyClient {
    /// Client for the endpoints configured in the environment.
    pub fn new() -> Self {
        Self::with_urls(config::spotify_api_url(), config::spotify_token_url())
    }

    pub fn with_urls(api_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%url, "catalog request");

        let request = self.http.get(&url).bearer_auth(token).query(query);
        send(request).await
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        basic_auth: Option<(&str, &str)>,
    ) -> Result<TokenResponse> {
        let mut request = self.http.post(&self.token_url).form(form);
        if let Some((id, secret)) = basic_auth {
            request = request.basic_auth(id, Some(secret));
        }

        send(request).await
    }
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn track(&self, token: &str, id: &str) -> Result<TrackObject> {
        self.get_json(token, &format!("/tracks/{}", id), &[]).await
    }

    async fn playlist(&self, token: &str, id: &str) -> Result<PlaylistObject> {
        self.get_json(token, &format!("/playlists/{}", id), &[])
            .await
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<PlaylistItem>> {
        self.get_json(
            token,
            &format!("/playlists/{}/tracks", id),
            &page_query(limit, offset),
        )
        .await
    }

    async fn album(&self, token: &str, id: &str) -> Result<AlbumObject> {
        self.get_json(token, &format!("/albums/{}", id), &[]).await
    }

    async fn album_tracks(
        &self,
        token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<TrackRef>> {
        self.get_json(
            token,
            &format!("/albums/{}/tracks", id),
            &page_query(limit, offset),
        )
        .await
    }

    async fn artist(&self, token: &str, id: &str) -> Result<ArtistObject> {
        self.get_json(token, &format!("/artists/{}", id), &[]).await
    }

    async fn artist_albums(
        &self,
        token: &str,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<AlbumSummary>> {
        self.get_json(
            token,
            &format!("/artists/{}/albums", id),
            &page_query(limit, offset),
        )
        .await
    }

    async fn user(&self, token: &str, id: &str) -> Result<UserProfile> {
        self.get_json(token, &format!("/users/{}", id), &[]).await
    }

    async fn client_credentials_grant(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse> {
        self.token_request(
            &[("grant_type", "client_credentials")],
            Some((client_id, client_secret)),
        )
        .await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<TokenResponse> {
        match client_secret {
            Some(secret) => {
                self.token_request(
                    &[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token),
                    ],
                    Some((client_id, secret)),
                )
                .await
            }
            None => {
                self.token_request(
                    &[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token),
                        ("client_id", client_id),
                    ],
                    None,
                )
                .await
            }
        }
    }
}

fn page_query(limit: usize, offset: usize) -> [(&'static str, String); 2] {
    [("limit", limit.to_string()), ("offset", offset.to_string())]
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    if response.status().is_success() {
        let body = response.bytes().await?;
        return decode_body(&body);
    }

    Err(Error::upstream(response_details(response).await))
}

/// Decodes a successful response body. Malformed JSON is `Error::Json`, kept
/// apart from transport failures.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Captures status, `retry-after`, headers and body of a failed response.
pub async fn response_details(response: Response) -> ResponseDetails {
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let retry_after = headers
        .get("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok());

    let text = response.text().await.unwrap_or_default();
    let body = if text.is_empty() {
        None
    } else {
        Some(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    };

    ResponseDetails {
        status,
        retry_after,
        body,
        headers,
    }
}

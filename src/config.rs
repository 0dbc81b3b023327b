//! Configuration management for spotfetch.
//!
//! Values are read from environment variables, which may be populated from a
//! `.env` file in the working directory or in the platform-specific local data
//! directory (`spotfetch/.env`). Lookup order:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the current directory
//! 3. `.env` in the local data directory
//! 4. Application defaults (where applicable)
//!
//! Tunable fan-out and retry limits are grouped in [`FetchSettings`].

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::spotify::RetryPolicy;

const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_PORT: u16 = 3000;

/// Loads environment variables from `.env` files.
///
/// Missing files are not an error; values already present in the process
/// environment are never overwritten.
///
/// # Errors
///
/// Returns an error string if the local data directory cannot be created or a
/// `.env` file exists but cannot be parsed.
///
/// # Example
///
/// ```
/// use spotfetch::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotfetch/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    for candidate in [PathBuf::from(".env"), path] {
        if candidate.is_file() {
            dotenv::from_path(&candidate)
                .map_err(|e| format!("{}: {}", candidate.display(), e))?;
        }
    }

    Ok(())
}

/// Address the HTTP server binds to.
///
/// Uses `SERVER_ADDRESS` when set, otherwise `0.0.0.0:$PORT` with port 3000 as
/// the fallback.
pub fn server_addr() -> String {
    non_empty("SERVER_ADDRESS").unwrap_or_else(|| {
        let port = parse_env::<u16>("PORT").unwrap_or(DEFAULT_PORT);
        format!("0.0.0.0:{}", port)
    })
}

/// Base URL of the Spotify Web API, e.g. `https://api.spotify.com/v1`.
pub fn spotify_api_url() -> String {
    non_empty("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Token endpoint used for client-credentials and refresh grants.
pub fn spotify_token_url() -> String {
    non_empty("SPOTIFY_API_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string())
}

pub fn spotify_client_id() -> Option<String> {
    non_empty("SPOTIFY_CLIENT_ID")
}

/// The client secret should never appear in logs.
pub fn spotify_client_secret() -> Option<String> {
    non_empty("SPOTIFY_CLIENT_SECRET")
}

pub fn spotify_access_token() -> Option<String> {
    non_empty("SPOTIFY_ACCESS_TOKEN")
}

pub fn spotify_refresh_token() -> Option<String> {
    non_empty("SPOTIFY_REFRESH_TOKEN")
}

/// Install locations searched for `youtube-dl`, in order.
const YOUTUBE_DL_PATHS: [&str; 2] = ["/usr/bin/youtube-dl", "/usr/local/bin/youtube-dl"];

/// Install locations searched for `yt-dlp`, in order. The standalone Linux
/// release ships as `yt-dlp_linux`.
const YTDLP_PATHS: [&str; 3] = [
    "/usr/local/bin/yt-dlp_linux",
    "/usr/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
];

/// Location of the primary `youtube-dl` binary.
///
/// `YOUTUBE_DL_BIN` wins; otherwise the first well-known install path that
/// exists, falling back to a bare `youtube-dl` resolved through `PATH`.
pub fn youtube_dl_bin() -> PathBuf {
    find_program("YOUTUBE_DL_BIN", &YOUTUBE_DL_PATHS, "youtube-dl")
}

/// Location of the fallback `yt-dlp` binary, looked up like [`youtube_dl_bin`].
pub fn ytdlp_bin() -> PathBuf {
    find_program("YTDLP_BIN", &YTDLP_PATHS, "yt-dlp")
}

/// Path to a Netscape cookie file passed to the fetch subprocess.
pub fn ytdlp_cookies_path() -> Option<PathBuf> {
    non_empty("YTDLP_COOKIES_PATH").map(PathBuf::from)
}

/// Base64-encoded cookie file contents, used when no cookie path is set.
pub fn ytdlp_cookies_b64() -> Option<String> {
    non_empty("YTDLP_COOKIES_B64")
}

pub fn ytdlp_proxy() -> Option<String> {
    non_empty("YTDLP_PROXY")
}

/// Whether a public HTTP proxy should be fetched at startup (`ENABLE_PROXY`).
pub fn proxy_enabled() -> bool {
    non_empty("ENABLE_PROXY")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Fan-out limits and retry policy used by the batch orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Concurrent track-metadata lookups per collection.
    pub metadata_concurrency: usize,
    /// Concurrent track downloads for `download_playlist` and friends.
    pub download_concurrency: usize,
    /// Concurrent resolve-and-fetch workers per collection during archive export.
    pub archive_concurrency: usize,
    /// Items requested per catalog page.
    pub page_size: usize,
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            metadata_concurrency: 5,
            download_concurrency: 3,
            archive_concurrency: 3,
            page_size: 50,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchSettings {
    /// Defaults overridden by any `SPOTFETCH_*` variables that parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            metadata_concurrency: parse_env("SPOTFETCH_METADATA_CONCURRENCY")
                .unwrap_or(defaults.metadata_concurrency),
            download_concurrency: parse_env("SPOTFETCH_DOWNLOAD_CONCURRENCY")
                .unwrap_or(defaults.download_concurrency),
            archive_concurrency: parse_env("SPOTFETCH_ARCHIVE_CONCURRENCY")
                .unwrap_or(defaults.archive_concurrency),
            page_size: parse_env("SPOTFETCH_PAGE_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            retry: RetryPolicy {
                max_retries: parse_env("SPOTFETCH_MAX_RETRIES")
                    .unwrap_or(defaults.retry.max_retries),
                base_delay: parse_env("SPOTFETCH_BASE_BACKOFF_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.base_delay),
            },
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    non_empty(key).and_then(|v| v.parse().ok())
}

fn find_program(key: &str, candidates: &[&str], fallback: &str) -> PathBuf {
    if let Some(path) = non_empty(key) {
        return PathBuf::from(path);
    }

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from(fallback))
}

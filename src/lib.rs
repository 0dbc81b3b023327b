//! spotfetch library
//!
//! Batch retrieval of Spotify catalog metadata (tracks, albums, artists,
//! playlists) with audio resolved through an external search, delivered as
//! structured records or streamed into a ZIP archive.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the batch server
//! - `audio` - audio resolution, download subprocesses and tagging
//! - `cli` - Command-line interface implementations
//! - `concurrency` - bounded-concurrency mapping
//! - `config` - Configuration management and environment variables
//! - `error` - the crate-wide error type
//! - `management` - credential sessions, batch orchestration and archive export
//! - `server` - axum router and server startup
//! - `spotify` - Spotify Web API client, rate limiting and pagination
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use spotfetch::{audio, config, management::{ClientState, SpotifyFetcher}, spotify};
//!
//! #[tokio::main]
//! async fn main() -> spotfetch::Result<()> {
//!     let session = ClientState::service("client-id", "client-secret")?;
//!     let fetcher = SpotifyFetcher::new(
//!         Arc::new(spotify::SpotifyClient::new()),
//!         Arc::new(audio::YoutubeSearchResolver::default()),
//!         Arc::new(audio::YtDlpDownloader::from_env(None)),
//!         session,
//!         config::FetchSettings::from_env(),
//!     );
//!     let playlist = fetcher.get_tracks_from_playlist("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").await?;
//!     println!("{} tracks", playlist.tracks.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod audio;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints a status line prefixed with a blue `[o]`.
///
/// Takes the same arguments as `println!`.
///
/// ```
/// info!("Archiving {} tracks into {}", total, path.display());
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a completion line prefixed with a green `[✓]`.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `[!]` line to stderr and exits with status 1.
///
/// The expansion diverges, so it can stand in for a value in `match` arms:
///
/// ```
/// let tracks = match fetcher.get_tracks_from_playlist(url).await {
///     Ok(tracks) => tracks,
///     Err(e) => error!("Failed to fetch tracks. Err: {}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow `[!]` line to stderr for problems that are not fatal.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

//! # CLI Module
//!
//! User-facing commands of the `spotfetch` binary. Each command takes a ready
//! [`SpotifyFetcher`](crate::management::SpotifyFetcher), shows a spinner while
//! it works, and reports through the colored `info!` / `success!` /
//! `warning!` / `error!` macros. `error!` ends the process with exit code 1.
//!
//! ## Commands
//!
//! - [`track`] - metadata of a single track
//! - [`tracks`] - every track of one or more playlists or albums, as a table or JSON
//! - [`artist`] - artist details, optionally with every album
//! - [`user`] - public profile of a user
//! - [`download`] - one track as a tagged MP3 file
//! - [`export`] - the audio of whole playlists or albums as a ZIP archive
//! - [`serve`] - the HTTP API
//!
//! ## Usage
//!
//! ```bash
//! spotfetch track https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC
//! spotfetch tracks --json spotify:playlist:37i9dQZF1DXcBWIGoYBM5M
//! spotfetch export --output mix.zip https://open.spotify.com/playlist/...
//! spotfetch serve
//! ```

mod artist;
mod playlist;
mod serve;
mod track;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

pub use artist::{artist, user};
pub use playlist::{export, tracks};
pub use serve::serve;
pub use track::{download, track};

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => crate::error!("Cannot serialize output. Err: {}", e),
    }
}

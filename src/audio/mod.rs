//! # Audio Module
//!
//! Everything that happens to a track after its catalog metadata is known:
//! finding an audio source ([`AudioResolver`]), downloading it
//! ([`AudioDownloader`]), and writing tags into the result
//! ([`MetadataTagger`]). The resolver and downloader are traits so the batch
//! orchestrator can run against substitutes.
//!
//! The default implementations shell out to `yt-dlp` / `youtube-dl`.

mod download;
mod proxy;
mod resolver;
mod tags;

pub use download::{AudioDownloader, CLIENT_PROFILES, CookieSource, YtDlpDownloader};
pub use proxy::select_proxy;
pub use resolver::{AudioResolver, YoutubeSearchResolver};
pub use tags::MetadataTagger;

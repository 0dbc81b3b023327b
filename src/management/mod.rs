//! # Management Module
//!
//! Session state and the batch orchestration built on top of it.
//!
//! - [`ClientState`] / [`Credential`]: the credentials of one session and
//!   their refresh deadline
//! - [`ensure_fresh`] / [`TokenManager`]: decides when and how credentials are
//!   refreshed
//! - [`SpotifyFetcher`]: metadata lookups, bounded fan-out over tracks,
//!   downloads and archive export
//! - [`ArchiveSink`] / [`ZipSink`]: where exported audio ends up

mod archive;
mod auth;
mod fetcher;
mod state;

pub use archive::{ArchiveReport, ArchiveSink, SkippedTrack, ZipSink};
pub use auth::{TokenManager, ensure_fresh};
pub use fetcher::SpotifyFetcher;
pub use state::{ClientState, Credential, REFRESH_INTERVAL_MINUTES};

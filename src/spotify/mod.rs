//! # Spotify Module
//!
//! Access to the Spotify Web API catalog: the [`CatalogApi`] seam and its
//! reqwest implementation, the 429-aware request executor, the pagination
//! harvester, and the extraction helpers that turn raw catalog objects into
//! the records spotfetch hands back.
//!
//! Extraction helpers take a [`CatalogRequest`], which bundles everything a
//! catalog call needs once credentials have been checked: the API, the retry
//! policy, a fresh access token and the page size.

mod artists;
mod client;
mod pagination;
mod rate_limit;
mod tracks;

pub use artists::{extract_artist, extract_artist_album_ids, extract_user};
pub use client::{CatalogApi, SpotifyClient, response_details};
pub use pagination::{Page, collect_pages};
pub use rate_limit::{RetryPolicy, execute};
pub use tracks::{extract_album, extract_playlist, extract_track, track_details};

/// Borrowed context for one authenticated round of catalog calls.
#[derive(Clone, Copy)]
pub struct CatalogRequest<'a> {
    pub api: &'a dyn CatalogApi,
    pub policy: &'a RetryPolicy,
    pub token: &'a str,
    pub page_size: usize,
}

//! Error types shared by every layer of spotfetch.
//!
//! Failures that originate from an HTTP exchange carry a [`ResponseDetails`]
//! payload so callers (and the HTTP surface) can surface the upstream status,
//! the `retry-after` hint and the raw body without re-parsing error strings.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Structured view of a failed upstream HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseDetails {
    /// HTTP status code of the response.
    pub status: u16,
    /// Parsed `retry-after` header, in seconds.
    pub retry_after: Option<u64>,
    /// Response body, decoded as JSON when possible and kept as a string otherwise.
    pub body: Option<serde_json::Value>,
    /// Response headers with lowercase names.
    pub headers: BTreeMap<String, String>,
}

impl ResponseDetails {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Every failure spotfetch reports.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither a user access token nor a client id/secret pair was supplied.
    #[error("credentials incomplete: {0}")]
    CredentialsIncomplete(String),

    /// The token endpoint answered, but not with a usable token.
    #[error("authentication failed: {message}")]
    Auth {
        message: String,
        response: Option<ResponseDetails>,
    },

    /// The catalog kept answering 429 after every permitted retry.
    #[error("rate limit still in effect after {attempts} attempts")]
    RateLimitExhausted {
        attempts: u32,
        response: ResponseDetails,
    },

    /// Non-2xx response from the catalog or token endpoint.
    #[error("upstream request failed with status {}", .response.status)]
    Upstream { response: ResponseDetails },

    /// No audio source could be found for a track.
    #[error("couldn't find audio for track: {track}")]
    Resolution { track: String },

    /// The audio fetch subprocess failed.
    #[error("audio fetch failed: {message}")]
    Fetch { message: String },

    /// A page came back empty before the declared total was reached.
    #[error("pagination stalled after {accumulated} of {total} items")]
    CollectionStall { accumulated: usize, total: usize },

    /// A URL or URI from which no catalog id could be extracted.
    #[error("no catalog id in reference: {0:?}")]
    InvalidReference(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("tagging error: {0}")]
    Tag(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn upstream(response: ResponseDetails) -> Self {
        Error::Upstream { response }
    }

    /// True for a 429 answer that the rate-limited executor may retry.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Upstream { response } if response.status == 429)
    }

    /// The upstream response attached to this error, if any.
    pub fn response(&self) -> Option<&ResponseDetails> {
        match self {
            Error::Upstream { response } | Error::RateLimitExhausted { response, .. } => {
                Some(response)
            }
            Error::Auth { response, .. } => response.as_ref(),
            _ => None,
        }
    }

    /// HTTP status a surrounding layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Upstream { response } => response.status,
            Error::RateLimitExhausted { .. } => 429,
            Error::Auth { response, .. } => response.as_ref().map_or(401, |r| r.status),
            Error::CredentialsIncomplete(_) | Error::InvalidReference(_) => 400,
            Error::Resolution { .. } => 404,
            Error::CollectionStall { .. } | Error::Fetch { .. } => 502,
            Error::Http(e) => e.status().map_or(502, |s| s.as_u16()),
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! # API Module
//!
//! HTTP endpoints served by `spotfetch serve`.
//!
//! - [`health`] - liveness probe returning status and version
//! - [`process_playlists`] - batch metadata for a list of playlists, or a
//!   streamed ZIP of their audio
//!
//! Handlers return [`crate::Error`] directly; its [`IntoResponse`] impl maps
//! every variant to a status code and a JSON body of the form
//! `{error, statusCode, body, headers}`, passing upstream statuses through.

mod health;
mod playlists;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::error::Error;

pub use health::health;
pub use playlists::{ProcessQuery, ProcessRequest, process_playlists};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        warn!(status = status.as_u16(), error = %self, "request failed");

        let response = self.response();
        let body = json!({
            "error": self.to_string(),
            "statusCode": status.as_u16(),
            "body": response.and_then(|r| r.body.clone()),
            "headers": response.map(|r| r.headers.clone()),
        });

        (status, Json(body)).into_response()
    }
}

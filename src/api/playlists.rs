use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::{
    management::{ClientState, ZipSink},
    server::AppState,
};

const ARCHIVE_PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    #[serde(default)]
    pub playlists: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    pub mode: Option<String>,
}

/// `POST /playlists/process`
///
/// Answers with every playlist's track metadata as JSON, or streams a ZIP of
/// the tracks' audio when `?mode=download` is given or the client accepts
/// `application/zip`.
pub async fn process_playlists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessQuery>,
    headers: HeaderMap,
    Json(request): Json<ProcessRequest>,
) -> Response {
    let Some(access_token) = request.access_token.filter(|t| !t.is_empty()) else {
        return bad_request("accessToken is required");
    };
    if request.playlists.is_empty() {
        return bad_request("playlists must be a non-empty array");
    }

    let session = match ClientState::user(access_token, request.refresh_token, request.client_id)
    {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    let fetcher = Arc::new(state.fetcher(session));

    let collections = match fetcher.get_tracks_from_playlists(&request.playlists).await {
        Ok(collections) => collections,
        Err(e) => return e.into_response(),
    };

    if !wants_archive(&query, &headers) {
        info!(playlists = collections.len(), "returning playlist metadata");
        return Json(json!({ "result": collections })).into_response();
    }

    let (writer, reader) = tokio::io::duplex(ARCHIVE_PIPE_CAPACITY);
    tokio::spawn(async move {
        match fetcher
            .export_archive(&collections, ZipSink::new(writer))
            .await
        {
            Ok(report) => info!(
                entries = report.entries.len(),
                skipped = report.skipped.len(),
                "archive streamed"
            ),
            Err(e) => error!(error = %e, "archive export aborted"),
        }
    });

    let disposition = format!(
        "attachment; filename=\"spotify-playlists-{}.zip\"",
        Utc::now().timestamp_millis()
    );

    let mut response = Body::from_stream(ReaderStream::new(reader)).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}

fn wants_archive(query: &ProcessQuery, headers: &HeaderMap) -> bool {
    query
        .mode
        .as_deref()
        .is_some_and(|mode| mode.eq_ignore_ascii_case("download"))
        || headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("application/zip"))
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message, "statusCode": 400 })),
    )
        .into_response()
}

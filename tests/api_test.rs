mod common;

use std::sync::Arc;

use axum::{
    Json,
    body::to_bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use common::{FakeCatalog, FakeDownloader, FakeResolver, track_id};
use serde_json::{Value, json};
use spotfetch::{
    Error,
    api::{ProcessQuery, ProcessRequest, process_playlists},
    audio::MetadataTagger,
    config::FetchSettings,
    error::ResponseDetails,
    server::AppState,
};

fn app_state(catalog: FakeCatalog) -> Arc<AppState> {
    Arc::new(AppState {
        catalog: Arc::new(catalog),
        resolver: Arc::new(FakeResolver::default()),
        downloader: Arc::new(FakeDownloader::default()),
        tagger: MetadataTagger::default(),
        settings: FetchSettings::default(),
    })
}

fn morning() -> FakeCatalog {
    FakeCatalog::new().with_playlist("p1", "Morning", (0..2).map(track_id).collect())
}

fn request(access_token: Option<&str>, playlists: &[&str]) -> ProcessRequest {
    ProcessRequest {
        access_token: access_token.map(str::to_string),
        refresh_token: None,
        client_id: None,
        playlists: playlists.iter().map(|p| p.to_string()).collect(),
    }
}

async fn call(
    state: Arc<AppState>,
    mode: Option<&str>,
    headers: HeaderMap,
    body: ProcessRequest,
) -> Response {
    let query = ProcessQuery {
        mode: mode.map(str::to_string),
    };
    process_playlists(State(state), Query(query), headers, Json(body)).await
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_access_token_is_rejected() {
    let response = call(
        app_state(morning()),
        None,
        HeaderMap::new(),
        request(Some(""), &["p1"]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "accessToken is required", "statusCode": 400 })
    );
}

#[tokio::test]
async fn test_empty_playlist_list_is_rejected() {
    let response = call(
        app_state(morning()),
        None,
        HeaderMap::new(),
        request(Some("user-token"), &[]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "playlists must be a non-empty array");
}

#[tokio::test]
async fn test_metadata_is_returned_as_json() {
    let response = call(
        app_state(morning()),
        None,
        HeaderMap::new(),
        request(Some("user-token"), &["p1"]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let result = body["result"].as_array().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0]["name"], "Morning - owner");
    assert_eq!(result[0]["total_tracks"], 2);
    assert_eq!(result[0]["tracks"][0]["name"], "Song t000");
    assert_eq!(result[0]["tracks"][1]["artists"], json!(["Artist t001"]));
}

#[tokio::test]
async fn test_unknown_playlist_passes_upstream_status_through() {
    let response = call(
        app_state(morning()),
        None,
        HeaderMap::new(),
        request(Some("user-token"), &["p1", "missing"]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({
            "error": "upstream request failed with status 404",
            "statusCode": 404,
            "body": null,
            "headers": {},
        })
    );
}

#[tokio::test]
async fn test_download_mode_streams_zip() {
    let response = call(
        app_state(morning()),
        Some("Download"),
        HeaderMap::new(),
        request(Some("user-token"), &["p1"]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"spotify-playlists-"));
    assert!(disposition.ends_with(".zip\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..4], b"PK\x03\x04");
    let entry = b"Morning - owner/Song t001 - Artist t001.mp3";
    assert!(bytes.windows(entry.len()).any(|w| w == entry));
}

#[tokio::test]
async fn test_accept_header_selects_zip() {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/zip"));

    let response = call(
        app_state(morning()),
        None,
        headers,
        request(Some("user-token"), &["p1"]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
}

#[tokio::test]
async fn test_error_body_carries_upstream_details() {
    let details = ResponseDetails::new(503).with_body(json!({ "error": "down" }));
    let response = Error::upstream(details).into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 503);
    assert_eq!(body["body"], json!({ "error": "down" }));

    let exhausted = Error::RateLimitExhausted {
        attempts: 6,
        response: ResponseDetails::new(429).with_retry_after(3),
    }
    .into_response();
    assert_eq!(exhausted.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json_body(exhausted).await["error"],
        "rate limit still in effect after 6 attempts"
    );
}

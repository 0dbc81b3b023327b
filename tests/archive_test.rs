mod common;

use std::sync::{Arc, atomic::Ordering};

use common::{FakeCatalog, FakeDownloader, FakeResolver, MemorySink, fetcher, track_id};
use spotfetch::{
    Error,
    management::{ArchiveSink, ZipSink},
    types::CollectionTracks,
};

fn ids(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(track_id).collect()
}

async fn two_playlists(
    resolver: FakeResolver,
    downloader: FakeDownloader,
) -> (spotfetch::management::SpotifyFetcher, Vec<CollectionTracks>) {
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_playlist("p1", "Morning", ids(0..3))
            .with_playlist("p2", "Evening", ids(10..13)),
    );
    let fetcher = fetcher(catalog, resolver, Arc::new(downloader));
    let collections = fetcher
        .get_tracks_from_playlists(&["p1".to_string(), "p2".to_string()])
        .await
        .unwrap();
    (fetcher, collections)
}

#[tokio::test]
async fn test_unresolvable_track_in_each_playlist_is_skipped() {
    let resolver = FakeResolver {
        unresolvable: vec![track_id(1), track_id(11)],
    };
    let downloader = Arc::new(FakeDownloader::default());
    let catalog = Arc::new(
        FakeCatalog::new()
            .with_playlist("p1", "Morning", ids(0..3))
            .with_playlist("p2", "Evening", ids(10..13)),
    );
    let fetcher = fetcher(catalog, resolver, downloader.clone());
    let collections = fetcher
        .get_tracks_from_playlists(&["p1".to_string(), "p2".to_string()])
        .await
        .unwrap();
    let sink = MemorySink::default();

    let report = fetcher
        .export_archive(&collections, sink.clone())
        .await
        .unwrap();

    let expected = vec![
        "Morning - owner/Song t000 - Artist t000.mp3",
        "Morning - owner/Song t002 - Artist t002.mp3",
        "Evening - owner/Song t010 - Artist t010.mp3",
        "Evening - owner/Song t012 - Artist t012.mp3",
    ];
    assert_eq!(report.entries, expected);

    // The sink sees entries in completion order.
    let mut written: Vec<String> = sink
        .entries
        .lock()
        .unwrap()
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    written.sort();
    let mut sorted = expected.clone();
    sorted.sort();
    assert_eq!(written, sorted);

    let skipped: Vec<(&str, &str)> = report
        .skipped
        .iter()
        .map(|s| (s.collection.as_str(), s.track.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("Morning - owner", "Song t001"),
            ("Evening - owner", "Song t011"),
        ]
    );
    assert!(
        report
            .skipped
            .iter()
            .all(|s| s.reason.starts_with("couldn't find audio"))
    );
    // Unresolved tracks never reach the downloader.
    assert_eq!(downloader.fetched.lock().unwrap().len(), 4);
    assert_eq!(sink.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_entry_contains_fetched_audio() {
    let (fetcher, collections) =
        two_playlists(FakeResolver::default(), FakeDownloader::default()).await;
    let sink = MemorySink::default();

    fetcher
        .export_archive(&collections[..1], sink.clone())
        .await
        .unwrap();

    let entries = sink.entries.lock().unwrap();
    assert_eq!(entries.len(), 3);
    let (_, data) = entries
        .iter()
        .find(|(name, _)| name == "Morning - owner/Song t000 - Artist t000.mp3")
        .unwrap();
    assert_eq!(
        data,
        b"https://www.youtube.com/watch?v=Song_t000_Artist_t000"
    );
}

#[tokio::test]
async fn test_failed_download_is_skipped() {
    let downloader = FakeDownloader {
        failing: vec![track_id(2)],
        ..FakeDownloader::default()
    };
    let (fetcher, collections) = two_playlists(FakeResolver::default(), downloader).await;
    let sink = MemorySink::default();

    let report = fetcher
        .export_archive(&collections, sink.clone())
        .await
        .unwrap();

    assert_eq!(report.entries.len(), 5);
    assert_eq!(sink.entries.lock().unwrap().len(), 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].track, "Song t002");
    assert!(report.skipped[0].reason.starts_with("audio fetch failed"));
}

#[tokio::test]
async fn test_empty_export_still_finalizes() {
    let (fetcher, _) = two_playlists(FakeResolver::default(), FakeDownloader::default()).await;
    let sink = MemorySink::default();

    let report = fetcher.export_archive(&[], sink.clone()).await.unwrap();

    assert!(report.entries.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(sink.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zip_sink_writes_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.zip");
    let file = tokio::fs::File::create(&path).await.unwrap();
    let mut sink = ZipSink::new(file);

    sink.append("Mix - owner/Song - Artist.mp3", vec![7u8; 4096])
        .await
        .unwrap();
    sink.finish().await.unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"PK\x03\x04");
    assert!(
        bytes
            .windows(b"Mix - owner/Song - Artist.mp3".len())
            .any(|w| w == b"Mix - owner/Song - Artist.mp3")
    );
    // Highly repetitive data compresses well below its size.
    assert!(bytes.len() < 4096);
}

#[tokio::test]
async fn test_zip_sink_rejects_entries_after_finish() {
    let dir = tempfile::tempdir().unwrap();
    let file = tokio::fs::File::create(dir.path().join("out.zip"))
        .await
        .unwrap();
    let mut sink = ZipSink::new(file);

    sink.finish().await.unwrap();

    assert!(matches!(
        sink.append("late.mp3", Vec::new()).await,
        Err(Error::Archive(_))
    ));
    // Finishing twice is harmless.
    sink.finish().await.unwrap();
}

use std::path::Path;

use tabled::Table;

use crate::{
    cli::{print_json, spinner},
    error, info,
    management::{SpotifyFetcher, ZipSink},
    success,
    types::{CollectionTracks, TrackTableRow},
    warning,
};

/// Prints every track of the given playlists (or albums).
pub async fn tracks(fetcher: &SpotifyFetcher, urls: &[String], album: bool, json: bool) {
    let collections = load_collections(fetcher, urls, album).await;

    if json {
        print_json(&collections);
        return;
    }

    for collection in &collections {
        info!(
            "{} ({} of {} tracks)",
            collection.name,
            collection.tracks.len(),
            collection.total_tracks
        );
        let rows: Vec<TrackTableRow> = collection.tracks.iter().map(TrackTableRow::from).collect();
        println!("{}", Table::new(rows));
    }
}

/// Writes the audio of every track of the given playlists (or albums) into a
/// ZIP archive at `output`.
pub async fn export(fetcher: &SpotifyFetcher, urls: &[String], album: bool, output: &Path) {
    let collections = load_collections(fetcher, urls, album).await;
    let total: usize = collections.iter().map(|c| c.tracks.len()).sum();

    let file = match tokio::fs::File::create(output).await {
        Ok(file) => file,
        Err(e) => error!("Cannot create {}. Err: {}", output.display(), e),
    };

    info!("Archiving {} tracks into {}", total, output.display());
    let pb = spinner("Resolving and downloading audio...");
    let result = fetcher
        .export_archive(&collections, ZipSink::new(file))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(report) => {
            for skipped in &report.skipped {
                warning!(
                    "Skipped {} from {}: {}",
                    skipped.track,
                    skipped.collection,
                    skipped.reason
                );
            }
            success!(
                "Archived {} of {} tracks into {}",
                report.entries.len(),
                total,
                output.display()
            );
        }
        Err(e) => error!("Archive export failed. Err: {}", e),
    }
}

async fn load_collections(
    fetcher: &SpotifyFetcher,
    urls: &[String],
    album: bool,
) -> Vec<CollectionTracks> {
    let pb = spinner(if album {
        "Fetching album tracks..."
    } else {
        "Fetching playlist tracks..."
    });
    let result = if album {
        fetcher.get_tracks_from_albums(urls).await
    } else {
        fetcher.get_tracks_from_playlists(urls).await
    };
    pb.finish_and_clear();

    match result {
        Ok(collections) => collections,
        Err(e) => error!("Failed to fetch tracks. Err: {}", e),
    }
}

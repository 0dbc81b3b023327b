use std::path::PathBuf;

use tabled::Table;

use crate::{
    cli::{print_json, spinner},
    error, info,
    management::SpotifyFetcher,
    success,
    types::{DownloadOutput, TrackTableRow},
    utils,
};

pub async fn track(fetcher: &SpotifyFetcher, url: &str, json: bool) {
    let pb = spinner("Fetching track...");
    let result = fetcher.get_track(url).await;
    pb.finish_and_clear();

    match result {
        Ok(track) if json => print_json(&track),
        Ok(track) => println!("{}", Table::new([TrackTableRow::from(&track)])),
        Err(e) => error!("Failed to fetch track. Err: {}", e),
    }
}

/// Downloads a single track to `output`, or to `title - artist.mp3` in the
/// current directory.
pub async fn download(fetcher: &SpotifyFetcher, url: &str, output: Option<PathBuf>) {
    let pb = spinner("Fetching track...");
    let result = fetcher.get_track(url).await;
    pb.finish_and_clear();

    let track = match result {
        Ok(track) => track,
        Err(e) => error!("Failed to fetch track. Err: {}", e),
    };
    let destination = output.unwrap_or_else(|| {
        PathBuf::from(utils::sanitize_filename(&format!(
            "{} - {}.mp3",
            track.name,
            track.primary_artist()
        )))
    });

    info!("Downloading to {}", destination.display());
    let pb = spinner("Resolving and downloading audio...");
    let result = fetcher.download_tagged(&track, Some(&destination)).await;
    pb.finish_and_clear();

    match result {
        Ok(DownloadOutput::Saved(path)) => success!("Saved {}", path.display()),
        Ok(DownloadOutput::Buffer(bytes)) => success!("Downloaded {} bytes", bytes.len()),
        Err(e) => error!("Failed to download track. Err: {}", e),
    }
}

use tabled::{Table, Tabled};

use crate::{
    cli::{print_json, spinner},
    error, info,
    management::SpotifyFetcher,
};

#[derive(Tabled)]
struct AlbumTableRow {
    name: String,
    tracks: usize,
}

pub async fn artist(fetcher: &SpotifyFetcher, url: &str, albums: bool, json: bool) {
    if !albums {
        let pb = spinner("Fetching artist...");
        let result = fetcher.get_artist(url).await;
        pb.finish_and_clear();

        match result {
            Ok(artist) if json => print_json(&artist),
            Ok(artist) => info!("{} ({})", artist.name, artist.href),
            Err(e) => error!("Failed to fetch artist. Err: {}", e),
        }
        return;
    }

    let pb = spinner("Fetching artist albums...");
    let result = fetcher.get_artist_albums(url).await;
    pb.finish_and_clear();

    let artist_albums = match result {
        Ok(artist_albums) => artist_albums,
        Err(e) => error!("Failed to fetch artist albums. Err: {}", e),
    };

    if json {
        print_json(&artist_albums);
        return;
    }

    info!(
        "{} has {} albums",
        artist_albums.artist.name,
        artist_albums.albums.len()
    );
    let rows: Vec<AlbumTableRow> = artist_albums
        .albums
        .into_iter()
        .map(|a| AlbumTableRow {
            name: a.name,
            tracks: a.total_tracks,
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub async fn user(fetcher: &SpotifyFetcher, id: &str) {
    let pb = spinner("Fetching user...");
    let result = fetcher.get_user(id).await;
    pb.finish_and_clear();

    match result {
        Ok(profile) => print_json(&profile),
        Err(e) => error!("Failed to fetch user. Err: {}", e),
    }
}

use crate::{
    error::{Error, Result},
    spotify::{CatalogRequest, Page, collect_pages, execute},
    types::{CollectionDetails, PlaylistItem, TrackDetails, TrackObject},
};

/// Fetches a single track and reduces it to [`TrackDetails`].
pub async fn extract_track(req: CatalogRequest<'_>, id: &str) -> Result<TrackDetails> {
    let track = execute(req.policy, "get track", || req.api.track(req.token, id)).await?;
    Ok(track_details(track))
}

pub fn track_details(track: TrackObject) -> TrackDetails {
    TrackDetails {
        name: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
        cover_url: track.album.images.into_iter().next().map(|i| i.url),
        release_date: track.album.release_date.unwrap_or_default(),
        album_name: track.album.name,
    }
}

/// Resolves a playlist to its display name (`name - owner`) and every track id.
///
/// The first page of tracks comes embedded in the playlist object; the rest is
/// harvested page by page. Entries without a track (removed or local files)
/// are dropped after collection, so `tracks` may be shorter than
/// `total_tracks`.
pub async fn extract_playlist(req: CatalogRequest<'_>, id: &str) -> Result<CollectionDetails> {
    let playlist = execute(req.policy, "get playlist", || {
        req.api.playlist(req.token, id)
    })
    .await?;

    let name = format!(
        "{} - {}",
        playlist.name,
        playlist.owner.display_name.unwrap_or_default()
    );
    let total_tracks = playlist.tracks.total;
    let first = Page::from(playlist.tracks).map(playlist_track_id);

    let ids = collect_pages(async { Ok::<_, Error>(first) }, req.page_size, move |offset| async move {
        let page = execute(req.policy, "get playlist tracks", || {
            req.api
                .playlist_tracks(req.token, id, req.page_size, offset)
        })
        .await?;
        Ok::<_, Error>(Page::from(page).map(playlist_track_id))
    })
    .await?;

    Ok(CollectionDetails {
        name,
        total_tracks,
        tracks: ids.into_iter().flatten().collect(),
    })
}

/// Resolves an album to its display name (`name - label`) and every track id.
pub async fn extract_album(req: CatalogRequest<'_>, id: &str) -> Result<CollectionDetails> {
    let album = execute(req.policy, "get album", || req.api.album(req.token, id)).await?;

    let name = format!("{} - {}", album.name, album.label.unwrap_or_default());
    let total_tracks = album.tracks.total;
    let first = Page::from(album.tracks).map(|t| t.id);

    let ids = collect_pages(async { Ok::<_, Error>(first) }, req.page_size, move |offset| async move {
        let page = execute(req.policy, "get album tracks", || {
            req.api.album_tracks(req.token, id, req.page_size, offset)
        })
        .await?;
        Ok::<_, Error>(Page::from(page).map(|t| t.id))
    })
    .await?;

    Ok(CollectionDetails {
        name,
        total_tracks,
        tracks: ids.into_iter().flatten().collect(),
    })
}

fn playlist_track_id(item: PlaylistItem) -> Option<String> {
    item.track.and_then(|t| t.id)
}

use crate::{
    error::{Error, Result},
    spotify::{CatalogRequest, Page, collect_pages, execute},
    types::{ArtistDetails, UserProfile},
};

pub async fn extract_artist(req: CatalogRequest<'_>, id: &str) -> Result<ArtistDetails> {
    let artist = execute(req.policy, "get artist", || req.api.artist(req.token, id)).await?;

    Ok(ArtistDetails {
        id: artist.id,
        name: artist.name,
        href: artist.href,
    })
}

/// Ids of every album in an artist's discography, in catalog order.
///
/// Unlike playlists and albums, the first page is requested explicitly at
/// offset 0 before the remaining pages are harvested.
pub async fn extract_artist_album_ids(req: CatalogRequest<'_>, id: &str) -> Result<Vec<String>> {
    let first = async {
        let page = execute(req.policy, "get artist albums", || {
            req.api.artist_albums(req.token, id, req.page_size, 0)
        })
        .await?;
        Ok::<_, Error>(Page::from(page).map(|a| a.id))
    };

    collect_pages(first, req.page_size, move |offset| async move {
        let page = execute(req.policy, "get artist albums", || {
            req.api
                .artist_albums(req.token, id, req.page_size, offset)
        })
        .await?;
        Ok::<_, Error>(Page::from(page).map(|a| a.id))
    })
    .await
}

pub async fn extract_user(req: CatalogRequest<'_>, id: &str) -> Result<UserProfile> {
    execute(req.policy, "get user", || req.api.user(req.token, id)).await
}

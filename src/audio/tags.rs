use std::path::{Path, PathBuf};

use lofty::{Accessor, ItemKey, Picture, PictureType, Probe, Tag, TagExt, TaggedFileExt};
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    types::TrackDetails,
};

/// Writes catalog metadata and cover art into downloaded audio files.
#[derive(Debug, Clone, Default)]
pub struct MetadataTagger {
    http: Client,
}

impl MetadataTagger {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Tags the file at `path` with title, artists, album, date and cover.
    ///
    /// A cover that cannot be downloaded is skipped with a warning; the text
    /// tags are still written.
    pub async fn apply(&self, path: &Path, track: &TrackDetails) -> Result<()> {
        let cover = match &track.cover_url {
            Some(url) => match self.fetch_cover(url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(%url, error = %e, "cover art unavailable");
                    None
                }
            },
            None => None,
        };

        let path: PathBuf = path.to_path_buf();
        let track = track.clone();

        tokio::task::spawn_blocking(move || write_tags(&path, &track, cover))
            .await
            .map_err(|e| Error::Tag(e.to_string()))?
    }

    async fn fetch_cover(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn write_tags(path: &Path, track: &TrackDetails, cover: Option<Vec<u8>>) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .and_then(|opened| opened.read())
        .map_err(|e| Error::Tag(e.to_string()))?;

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        return Err(Error::Tag(format!("no {:?} tag on {}", tag_type, path.display())));
    };

    tag.set_title(track.name.clone());
    tag.set_artist(track.artists.join(", "));
    tag.set_album(track.album_name.clone());

    if !track.release_date.is_empty() {
        tag.insert_text(ItemKey::RecordingDate, track.release_date.clone());
        if let Some(year) = track
            .release_date
            .get(..4)
            .and_then(|y| y.parse::<u32>().ok())
        {
            tag.set_year(year);
        }
    }

    if let Some(bytes) = cover {
        match Picture::from_reader(&mut bytes.as_slice()) {
            Ok(mut picture) => {
                picture.set_pic_type(PictureType::CoverFront);
                tag.push_picture(picture);
            }
            Err(e) => warn!(error = %e, "cover art is not a readable image"),
        }
    }

    tag.save_to_path(path)
        .map_err(|e: lofty::error::LoftyError| Error::Tag(e.to_string()))?;

    debug!(path = %path.display(), "wrote track tags");
    Ok(())
}

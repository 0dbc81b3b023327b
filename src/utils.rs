use crate::types::TrackDetails;

/// Characters that are not allowed in archive entry names on common filesystems.
const FORBIDDEN_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Extracts the catalog id from a Spotify URI, URL, or bare id.
///
/// Query strings and fragments are stripped first. URIs (`spotify:track:ID`)
/// yield their last non-empty `:`-separated part, everything else its last
/// non-empty `/`-separated segment. Extraction is idempotent, and an empty
/// input yields an empty id.
///
/// # Example
///
/// ```
/// use spotfetch::utils::get_id;
///
/// assert_eq!(get_id("spotify:track:4uLU6hMCjMI75M1A2tKUQC"), "4uLU6hMCjMI75M1A2tKUQC");
/// assert_eq!(
///     get_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc"),
///     "37i9dQZF1DXcBWIGoYBM5M"
/// );
/// ```
pub fn get_id(reference: &str) -> String {
    let trimmed = reference.trim();
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let reference = &trimmed[..end];

    let separator = if reference.starts_with("spotify:") {
        ':'
    } else {
        '/'
    };

    reference
        .split(separator)
        .filter(|part| !part.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

/// Replaces characters that are illegal in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FORBIDDEN_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Search string handed to the audio resolver: title and primary artist.
pub fn search_query(track: &TrackDetails) -> String {
    format!("{} {}", track.name, track.primary_artist())
        .trim()
        .to_string()
}

/// Archive path of a track inside its collection folder.
///
/// Both the folder and the `title - artist.mp3` file name are sanitized, so
/// the only `/` in the result is the folder separator.
pub fn archive_entry_name(collection: &str, track: &TrackDetails) -> String {
    let folder = if collection.trim().is_empty() {
        "playlist"
    } else {
        collection
    };
    let file = format!("{} - {}.mp3", track.name, track.primary_artist());

    format!("{}/{}", sanitize_filename(folder), sanitize_filename(&file))
}

/// Whether a URL points at YouTube.
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtu.be") || url.contains("youtube.com")
}

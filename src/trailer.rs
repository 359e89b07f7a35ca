use crate::models::VideoRef;

const YOUTUBE: &str = "YouTube";
const TRAILER: &str = "Trailer";

/// Picks the preferred YouTube video for a movie.
///
/// Only YouTube entries are considered. Among them the first official trailer wins, then
/// the first trailer of any kind, then the first entry. Input order is the provider's
/// ranking and is never changed.
pub fn select_trailer(videos: &[VideoRef]) -> Option<&VideoRef> {
    let youtube = || videos.iter().filter(|v| v.site == YOUTUBE);
    youtube()
        .find(|v| v.kind == TRAILER && v.official)
        .or_else(|| youtube().find(|v| v.kind == TRAILER))
        .or_else(|| youtube().next())
}

pub fn trailer_key(videos: &[VideoRef]) -> Option<String> {
    select_trailer(videos).map(|v| v.key.clone())
}

pub fn watch_url(key: &str) -> String {
    format!("https://www.youtube.com/watch?v={key}")
}

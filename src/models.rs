use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const UNTITLED: &str = "Untitled";

/// One entry of a movie's `/videos` list.
///
/// Every field is optional upstream; a missing or null field never matches a selection criterion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub site: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub official: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SummaryWire")]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
}

// Raw upstream shape. Search and trending results may carry `name` instead of `title`.
#[derive(Deserialize)]
struct SummaryWire {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    backdrop_path: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    release_date: Option<String>,
}

impl From<SummaryWire> for MovieSummary {
    fn from(w: SummaryWire) -> Self {
        let title = w
            .title
            .filter(|t| !t.trim().is_empty())
            .or(w.name.filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| UNTITLED.to_string());
        Self {
            id: w.id,
            title,
            overview: w.overview.unwrap_or_default(),
            backdrop_path: non_empty(w.backdrop_path),
            poster_path: non_empty(w.poster_path),
            vote_average: w
                .vote_average
                .filter(|v| v.is_finite() && (0.0..=10.0).contains(v)),
            release_date: non_empty(w.release_date),
        }
    }
}

impl MovieSummary {
    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }

    /// Vote average rounded to one decimal, as shown next to a star.
    pub fn rating(&self) -> Option<f64> {
        self.vote_average.map(|v| (v * 10.0).round() / 10.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

/// Detail, selected trailer and capped cast for a single movie page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMovieView {
    pub detail: MovieDetail,
    pub trailer_key: Option<String>,
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub results: Vec<T>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Paged<T> {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 1,
        }
    }

}

/// List row used by search results and the favorites page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCard {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub poster: Option<String>,
    pub rating: Option<f64>,
    pub year: Option<i32>,
    pub trailer_key: Option<String>,
}

impl MovieCard {
    pub fn from_summary(summary: &MovieSummary, trailer_key: Option<String>) -> Self {
        Self {
            id: summary.id,
            title: summary.title.clone(),
            overview: summary.overview.clone(),
            poster: image_url(summary.poster_path.as_deref(), ImageSize::W342),
            rating: summary.rating(),
            year: summary.release_year(),
            trailer_key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    W45,
    W92,
    W154,
    W185,
    W300,
    W342,
    W500,
    #[default]
    W780,
    W1280,
    H632,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W45 => "w45",
            ImageSize::W92 => "w92",
            ImageSize::W154 => "w154",
            ImageSize::W185 => "w185",
            ImageSize::W300 => "w300",
            ImageSize::W342 => "w342",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::W1280 => "w1280",
            ImageSize::H632 => "h632",
            ImageSize::Original => "original",
        }
    }
}

pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{IMAGE_BASE}/{}{path}", size.as_str()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a list item by item, skipping entries that do not fit `T`.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = raw.len();
    let items: Vec<T> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if items.len() < total {
        debug!(skipped = total - items.len(), "Skipped malformed list entries");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_falls_back_to_name_then_untitled() {
        let named: MovieSummary =
            serde_json::from_value(json!({ "id": 1, "name": "From Name" })).unwrap();
        assert_eq!(named.title, "From Name");
        assert_eq!(named.overview, "");

        let bare: MovieSummary = serde_json::from_value(json!({ "id": 2, "title": "" })).unwrap();
        assert_eq!(bare.title, UNTITLED);
    }

    #[test]
    fn summary_drops_out_of_range_votes_and_empty_paths() {
        let s: MovieSummary = serde_json::from_value(json!({
            "id": 3,
            "title": "X",
            "vote_average": 11.5,
            "poster_path": "",
            "release_date": ""
        }))
        .unwrap();
        assert_eq!(s.vote_average, None);
        assert_eq!(s.poster_path, None);
        assert_eq!(s.release_date, None);
    }

    #[test]
    fn detail_flattens_summary_and_defaults_extras() {
        let d: MovieDetail = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "overview": "Mischief.",
            "vote_average": 8.433,
            "release_date": "1999-10-15",
            "genres": [{ "id": 18, "name": "Drama" }]
        }))
        .unwrap();
        assert_eq!(d.summary.id, 550);
        assert!(!d.adult);
        assert_eq!(d.genres.len(), 1);
        assert_eq!(d.summary.release_year(), Some(1999));
        assert_eq!(d.summary.rating(), Some(8.4));
    }

    #[test]
    fn video_ref_reads_type_as_kind_and_tolerates_missing_fields() {
        let v: VideoRef = serde_json::from_value(json!({ "key": "abc", "type": "Teaser" })).unwrap();
        assert_eq!(v.kind, "Teaser");
        assert_eq!(v.site, "");
        assert!(!v.official);
    }

    #[test]
    fn video_ref_treats_null_fields_as_unset() {
        let v: VideoRef = serde_json::from_value(json!({
            "key": "x",
            "site": null,
            "type": null,
            "official": null
        }))
        .unwrap();
        assert_eq!(v.site, "");
        assert_eq!(v.kind, "");
        assert!(!v.official);
    }

    #[test]
    fn cast_member_with_null_name_still_decodes() {
        let c: CastMember =
            serde_json::from_value(json!({ "id": 4, "name": null, "character": null })).unwrap();
        assert_eq!(c.name, "");
        assert_eq!(c.character, None);
    }

    #[test]
    fn card_carries_release_year() {
        let s: MovieSummary = serde_json::from_value(json!({
            "id": 9,
            "title": "Dated",
            "release_date": "2001-12-19"
        }))
        .unwrap();
        assert_eq!(MovieCard::from_summary(&s, None).year, Some(2001));

        let undated: MovieSummary =
            serde_json::from_value(json!({ "id": 10, "release_date": "soon" })).unwrap();
        assert_eq!(MovieCard::from_summary(&undated, None).year, None);
    }

    #[test]
    fn paged_defaults_missing_pagination_to_one() {
        let p: Paged<MovieSummary> = serde_json::from_value(json!({ "results": [] })).unwrap();
        assert_eq!((p.page, p.total_pages), (1, 1));
    }

    #[test]
    fn image_url_skips_missing_paths() {
        assert_eq!(image_url(None, ImageSize::W342), None);
        assert_eq!(image_url(Some(""), ImageSize::W342), None);
        assert_eq!(
            image_url(Some("/p.jpg"), ImageSize::Original).as_deref(),
            Some("https://image.tmdb.org/t/p/original/p.jpg")
        );
    }

    #[test]
    fn aggregated_view_serializes_camel_case_keys() {
        let view = AggregatedMovieView {
            detail: MovieDetail {
                summary: MovieSummary {
                    id: 1,
                    title: "T".to_string(),
                    overview: String::new(),
                    backdrop_path: None,
                    poster_path: None,
                    vote_average: None,
                    release_date: None,
                },
                adult: false,
                genres: vec![],
            },
            trailer_key: Some("k".to_string()),
            cast: vec![],
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["trailerKey"], "k");
        assert_eq!(value["detail"]["title"], "T");
    }
}

//! Media catalog data types.
//!
//! Field names follow the upstream schema (camelCase on the wire). Nullable
//! lists decode to empty vectors.

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Localized titles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTitle {
    /// Romanized title.
    #[serde(default)]
    pub romaji: Option<String>,
    /// English title.
    #[serde(default)]
    pub english: Option<String>,
    /// Native-script title.
    #[serde(default)]
    pub native: Option<String>,
    /// The viewer's preferred title.
    #[serde(default)]
    pub user_preferred: Option<String>,
}

impl MediaTitle {
    /// Title to show: English, then romaji, then native, then "Untitled".
    #[must_use]
    pub fn display(&self) -> &str {
        [&self.english, &self.romaji, &self.native]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|title| !title.trim().is_empty())
            .unwrap_or("Untitled")
    }
}

/// Cover art.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub extra_large: Option<String>,
    /// Dominant color as `#rrggbb`.
    #[serde(default)]
    pub color: Option<String>,
}

impl CoverImage {
    /// Largest available image URL.
    #[must_use]
    pub fn best(&self) -> Option<&str> {
        self.extra_large
            .as_deref()
            .or(self.large.as_deref())
            .or(self.medium.as_deref())
    }
}

/// A calendar date where any part may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl std::fmt::Display for FuzzyDate {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`; nothing without a year. A day
    /// without a month is dropped.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(year) = self.year else {
            return Ok(());
        };
        match (self.month, self.day) {
            (Some(month), Some(day)) => write!(f, "{year}-{month:02}-{day:02}"),
            (Some(month), None) => write!(f, "{year}-{month:02}"),
            (None, _) => write!(f, "{year}"),
        }
    }
}

/// Pagination metadata of a page query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub last_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// A media entry as shown in list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub id: u64,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub title: MediaTitle,
    #[serde(default)]
    pub average_score: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u64>,
    #[serde(default)]
    pub trending: Option<u64>,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub season_year: Option<i32>,
}

/// One page of media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Vec<MediaSummary>,
}

/// `data` of a page query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    #[serde(rename = "Page")]
    pub page: MediaPage,
}

/// A studio credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioEdge {
    #[serde(default)]
    pub is_main: Option<bool>,
}

/// Studios with their edge metadata; `edges[i]` describes `nodes[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioConnection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<StudioEdge>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Studio>,
}

impl StudioConnection {
    /// Studios flagged as main, in upstream order.
    pub fn main_studios(&self) -> impl Iterator<Item = &Studio> {
        self.nodes
            .iter()
            .zip(&self.edges)
            .filter(|(_, edge)| edge.is_main == Some(true))
            .map(|(studio, _)| studio)
    }
}

/// A descriptive tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTag {
    pub name: String,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub is_general_spoiler: Option<bool>,
    #[serde(default)]
    pub is_media_spoiler: Option<bool>,
}

impl MediaTag {
    /// Tag reveals plot details.
    #[must_use]
    pub fn is_spoiler(&self) -> bool {
        self.is_general_spoiler == Some(true) || self.is_media_spoiler == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank: u32,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub all_time: Option<bool>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiringEpisode {
    /// Unix seconds.
    #[serde(default)]
    pub airing_at: Option<i64>,
    #[serde(default)]
    pub time_until_airing: Option<i64>,
    #[serde(default)]
    pub episode: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingEpisode {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Everything the detail view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetail {
    pub id: u64,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub title: MediaTitle,
    #[serde(default, deserialize_with = "null_as_default")]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    /// Minutes per episode.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub season_year: Option<i32>,
    #[serde(default)]
    pub start_date: Option<FuzzyDate>,
    #[serde(default)]
    pub end_date: Option<FuzzyDate>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub is_adult: Option<bool>,
    #[serde(default)]
    pub average_score: Option<u32>,
    #[serde(default)]
    pub mean_score: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u64>,
    #[serde(default)]
    pub favourites: Option<u64>,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<MediaTag>,
    #[serde(default)]
    pub studios: Option<StudioConnection>,
    #[serde(default)]
    pub trailer: Option<Trailer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rankings: Vec<Ranking>,
    #[serde(default)]
    pub next_airing_episode: Option<AiringEpisode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub streaming_episodes: Vec<StreamingEpisode>,
}

/// `data` of the detail query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDetailData {
    #[serde(rename = "Media", default)]
    pub media: Option<MediaDetail>,
}

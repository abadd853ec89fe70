//! GraphQL operations issued by the catalog.

use mediadb_graphql::GraphqlOperation;
use serde::Serialize;

use crate::types::{MediaDetailData, PageData};

/// Server-side ordering of a media page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaSort {
    TrendingDesc,
    ScoreDesc,
    PopularityDesc,
}

/// Variables of the page queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVariables {
    pub page: u32,
    pub per_page: u32,
    pub sort: Vec<MediaSort>,
}

/// Variables of the detail query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaIdVariables {
    pub id: u64,
}

/// Currently trending media.
#[derive(Debug, Clone, Copy)]
pub struct TrendingMedia;

impl GraphqlOperation for TrendingMedia {
    type Variables = PageVariables;
    type ResponseData = PageData;

    const QUERY: &'static str = r"
query TrendingMedia($page: Int!, $perPage: Int!, $sort: [MediaSort]) {
  Page(page: $page, perPage: $perPage) {
    pageInfo { total perPage currentPage lastPage hasNextPage }
    media(type: ANIME, sort: $sort) {
      id
      siteUrl
      title { romaji english native }
      averageScore
      popularity
      trending
      coverImage { medium large color }
      format
      episodes
      season
      seasonYear
    }
  }
}";
    const OPERATION_NAME: &'static str = "TrendingMedia";
}

/// Highest rated media of all time.
#[derive(Debug, Clone, Copy)]
pub struct TopRatedMedia;

impl GraphqlOperation for TopRatedMedia {
    type Variables = PageVariables;
    type ResponseData = PageData;

    const QUERY: &'static str = r"
query TopRatedMedia($page: Int!, $perPage: Int!, $sort: [MediaSort]) {
  Page(page: $page, perPage: $perPage) {
    pageInfo { total perPage currentPage lastPage hasNextPage }
    media(type: ANIME, sort: $sort) {
      id
      siteUrl
      title { romaji english native }
      averageScore
      popularity
      coverImage { medium large color }
      format
      episodes
      season
      seasonYear
    }
  }
}";
    const OPERATION_NAME: &'static str = "TopRatedMedia";
}

/// One media entry with everything the detail view shows.
#[derive(Debug, Clone, Copy)]
pub struct MediaDetailQuery;

impl GraphqlOperation for MediaDetailQuery {
    type Variables = MediaIdVariables;
    type ResponseData = MediaDetailData;

    const QUERY: &'static str = r"
query MediaDetail($id: Int!) {
  Media(id: $id, type: ANIME) {
    id
    siteUrl
    title { romaji english native userPreferred }
    synonyms
    description(asHtml: false)
    format
    status
    episodes
    duration
    season
    seasonYear
    startDate { year month day }
    endDate { year month day }
    source
    countryOfOrigin
    isAdult
    averageScore
    meanScore
    popularity
    favourites
    coverImage { medium large extraLarge color }
    bannerImage
    genres
    tags { name rank isGeneralSpoiler isMediaSpoiler }
    studios { edges { isMain } nodes { id name siteUrl } }
    trailer { id site thumbnail }
    rankings { rank type year season allTime context }
    nextAiringEpisode { airingAt timeUntilAiring episode }
    streamingEpisodes { title url site thumbnail }
  }
}";
    const OPERATION_NAME: &'static str = "MediaDetail";
}

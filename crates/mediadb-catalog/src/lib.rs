//! mediadb catalog - Typed media catalog on top of the GraphQL pipeline.
//!
//! [`Catalog`] issues the trending, top rated and detail queries through one
//! shared client and binds the list queries to incremental loaders.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod catalog;
mod format;
mod operations;
mod types;

pub use catalog::Catalog;
pub use format::{humanize_enum, sanitize_description};
pub use operations::{
    MediaDetailQuery, MediaIdVariables, MediaSort, PageVariables, TopRatedMedia, TrendingMedia,
};
pub use types::{
    AiringEpisode, CoverImage, FuzzyDate, MediaDetail, MediaDetailData, MediaPage, MediaSummary,
    MediaTag, MediaTitle, PageData, PageInfo, Ranking, StreamingEpisode, Studio, StudioConnection,
    StudioEdge, Trailer,
};

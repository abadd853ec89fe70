//! `trending` and `top`: page through a media list.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use mediadb_catalog::{Catalog, MediaSummary, TopRatedMedia, TrendingMedia};
use mediadb_graphql::GraphqlOperation;
use mediadb_loader::{IncrementalLoader, LoaderOptions, LoaderSnapshot};
use mediadb_telemetry::log_operation;

use crate::render;

/// Arguments for the list subcommands.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Items per page.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub per_page: u32,

    /// Number of pages to load.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Stop after this many items.
    #[arg(long)]
    pub max_items: Option<usize>,
}

/// Which list to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Trending,
    TopRated,
}

impl ListKind {
    const fn operation_name(self) -> &'static str {
        match self {
            Self::Trending => TrendingMedia::OPERATION_NAME,
            Self::TopRated => TopRatedMedia::OPERATION_NAME,
        }
    }

    const fn command(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::TopRated => "top",
        }
    }
}

/// Load `args.pages` pages and print them as they arrive.
pub async fn run(
    catalog: &Catalog,
    kind: ListKind,
    args: &ListArgs,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut options = LoaderOptions::default().with_per_page(args.per_page);
    if let Some(max_items) = args.max_items {
        options = options.with_max_items(max_items);
    }
    let loader = match kind {
        ListKind::Trending => catalog.trending_loader(options),
        ListKind::TopRated => catalog.top_rated_loader(options),
    };

    let result = load_pages(&loader, kind, args, json, out).await;
    loader.unmount();
    result
}

async fn load_pages(
    loader: &IncrementalLoader<MediaSummary>,
    kind: ListKind,
    args: &ListArgs,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut printed = 0;
    let mut pages_loaded = 0;

    while pages_loaded < args.pages {
        let page = loader.snapshot().page;
        let started = Instant::now();
        if pages_loaded == 0 {
            loader.load_initial().await;
        } else {
            loader.show_more().await;
        }
        let snapshot = loader.snapshot();
        log_step(kind, page, args.per_page, started, &snapshot);

        if let Some(error) = &snapshot.error {
            bail!("{}", error.user_message);
        }
        pages_loaded += 1;

        if !json {
            for (index, media) in snapshot.items.iter().enumerate().skip(printed) {
                writeln!(out, "{}", render::summary_line(index + 1, media))?;
            }
        }
        printed = snapshot.items.len();

        if !snapshot.has_more {
            break;
        }
    }

    let snapshot = loader.snapshot();
    if json {
        let body = serde_json::json!({
            "items": snapshot.items,
            "hasMore": snapshot.has_more,
        });
        serde_json::to_writer_pretty(&mut *out, &body).context("failed to encode items")?;
        writeln!(out)?;
    } else if snapshot.items.is_empty() {
        writeln!(out, "No media found.")?;
    } else if snapshot.has_more {
        writeln!(
            out,
            "\nMore available: mediadb {} --pages {}",
            kind.command(),
            pages_loaded + 1
        )?;
    }
    Ok(())
}

fn log_step(
    kind: ListKind,
    page: u32,
    per_page: u32,
    started: Instant,
    snapshot: &LoaderSnapshot<MediaSummary>,
) {
    let variables = serde_json::json!({ "page": page, "perPage": per_page });
    let error = snapshot.error.as_ref().map(|error| error.raw_message.as_str());
    log_operation(kind.operation_name(), &variables, started.elapsed(), error);
}

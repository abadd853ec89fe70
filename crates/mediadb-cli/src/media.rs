//! `media`: show one entry.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use mediadb_catalog::{Catalog, MediaDetailQuery};
use mediadb_graphql::{GraphqlClientError, GraphqlOperation, classify};
use mediadb_telemetry::log_operation;

use crate::render;

/// Arguments for the `media` subcommand.
#[derive(Args, Debug, Clone)]
pub struct MediaArgs {
    /// Media id.
    pub id: u64,
}

/// Fetch and print one media entry.
pub async fn run(
    catalog: &Catalog,
    args: &MediaArgs,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let started = Instant::now();
    let result = catalog.media_detail(args.id, None).await;

    let variables = serde_json::json!({ "id": args.id });
    let raw_error = result.as_ref().err().map(ToString::to_string);
    log_operation(
        MediaDetailQuery::OPERATION_NAME,
        &variables,
        started.elapsed(),
        raw_error.as_deref(),
    );

    let media = match result {
        Ok(media) => media,
        Err(GraphqlClientError::NotFound { .. }) => bail!("No media with id {}.", args.id),
        Err(err) => bail!("{}", classify(&err).user_message),
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &media).context("failed to encode media")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render::detail(&media))?;
    }
    Ok(())
}

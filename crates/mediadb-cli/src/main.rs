//! `mediadb` - terminal views over the media catalog.
//!
//! - `mediadb trending` - currently trending media, page by page
//! - `mediadb top` - highest rated media, page by page
//! - `mediadb media <ID>` - full details of one entry

#![forbid(unsafe_code)]

mod list;
mod media;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediadb_catalog::Catalog;
use mediadb_graphql::{ClientSettings, ConfigError, ENV_DEBUG, ENV_ENDPOINT, ENV_TIMEOUT_MS};
use mediadb_telemetry::{TelemetryConfig, init_telemetry};

use list::{ListArgs, ListKind};
use media::MediaArgs;

/// Browse a GraphQL media catalog from the terminal.
#[derive(Parser, Debug)]
#[command(name = "mediadb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GraphQL endpoint URL.
    #[arg(long, global = true, env = ENV_ENDPOINT)]
    endpoint: Option<String>,

    /// Request timeout in milliseconds (0 disables it).
    #[arg(long, global = true, env = ENV_TIMEOUT_MS)]
    timeout_ms: Option<String>,

    /// Enable debug logging.
    #[arg(
        long,
        global = true,
        env = ENV_DEBUG,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    debug: Option<String>,

    /// Write logs to stderr as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Print results as JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Currently trending media.
    Trending(ListArgs),

    /// Highest rated media.
    Top(ListArgs),

    /// Details of one media entry.
    Media(MediaArgs),
}

impl Cli {
    /// Validate flags (already merged with the environment by clap).
    fn settings(&self) -> Result<ClientSettings, ConfigError> {
        ClientSettings::from_lookup(|key| match key {
            ENV_ENDPOINT => self.endpoint.clone(),
            ENV_TIMEOUT_MS => self.timeout_ms.clone(),
            ENV_DEBUG => self.debug.clone(),
            _ => None,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings().context("invalid configuration")?;

    init_telemetry(
        TelemetryConfig::from_debug_flag("mediadb", settings.debug).with_json_logs(cli.json_logs),
    )?;
    tracing::debug!(
        endpoint = %settings.endpoint,
        timeout_ms = ?settings.timeout.map(|timeout| timeout.as_millis()),
        "settings loaded"
    );

    let catalog = Catalog::from_settings(&settings).context("failed to build GraphQL client")?;
    let mut stdout = std::io::stdout();

    match &cli.command {
        Commands::Trending(args) => {
            list::run(&catalog, ListKind::Trending, args, cli.json, &mut stdout).await
        }
        Commands::Top(args) => {
            list::run(&catalog, ListKind::TopRated, args, cli.json, &mut stdout).await
        }
        Commands::Media(args) => media::run(&catalog, args, cli.json, &mut stdout).await,
    }
}

//! MediaProbe: finds a bounded sample of preview-able pictures in a folder tree.
//!
//! Thin binary entry point. All logic lives in the `mediaprobe-core` crate.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mediaprobe_core::discovery::album_roots;
use mediaprobe_core::{Config, LocalStorage, MediaDiscovery, MimeSet, RootRelativeMapper};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaprobe")]
#[command(author, version, long_about = None)]
#[command(about = "Find preview-able pictures in a folder tree")]
struct Cli {
    /// Folder to search
    root: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Supported mime type (repeatable); replaces the configured set
    #[arg(short, long = "mime", value_name = "TYPE")]
    mime_types: Vec<String>,

    /// Pictures collected per sub-folder before its remaining entries are skipped
    #[arg(long, value_name = "N")]
    level_cap: Option<usize>,

    /// Name of the marker file that opts a folder out
    #[arg(long, value_name = "NAME")]
    sentinel: Option<String>,

    /// Deepest level to search
    #[arg(long, value_name = "N", conflicts_with = "unbounded")]
    max_depth: Option<usize>,

    /// Search at any depth, lifting the configured ceiling
    #[arg(long)]
    unbounded: bool,

    /// Preview every immediate sub-folder of ROOT as its own album, in parallel
    #[arg(long)]
    albums: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&cli, &mut config);
    config.validate().context("Invalid command-line options")?;

    let supported: MimeSet = if cli.mime_types.is_empty() {
        config.media.mime_set()
    } else {
        cli.mime_types.iter().collect()
    };
    tracing::debug!("Supported types: {}", supported.sorted().join(", "));

    let sentinel = config.discovery.sentinel.clone();
    let engine = MediaDiscovery::new(LocalStorage::new(), RootRelativeMapper::new(&cli.root))
        .with_config(config.discovery);

    let stdout = io::stdout();
    let out = stdout.lock();

    if cli.albums {
        let roots = album_roots(engine.storage(), &cli.root, &sentinel)
            .with_context(|| format!("Cannot list albums in {}", cli.root.display()))?;
        let previews = engine.discover_albums(&roots, &supported);
        match cli.format {
            OutputFormat::Json => output::write_albums_json(out, &previews),
            OutputFormat::Csv => output::write_albums_csv(out, &previews),
        }
    } else {
        let records = engine
            .discover(&cli.root, &supported)
            .with_context(|| format!("Cannot search {}", cli.root.display()))?;
        match cli.format {
            OutputFormat::Json => output::write_json(out, &records),
            OutputFormat::Csv => output::write_csv(out, &records),
        }
    }
}

/// Command-line values win over the loaded configuration.
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(cap) = cli.level_cap {
        config.discovery.level_cap = cap;
    }
    if let Some(sentinel) = &cli.sentinel {
        config.discovery.sentinel = sentinel.as_str().into();
    }
    if cli.unbounded {
        config.discovery.max_depth = None;
    } else if cli.max_depth.is_some() {
        config.discovery.max_depth = cli.max_depth;
    }
}

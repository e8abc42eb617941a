//! # postindex CLI
//!
//! Builds the paginated post index for a static site and browses it the way
//! the site's listing page does.
//!
//! ## Usage
//!
//! ```bash
//! postindex --config ./config/postindex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `postindex build` | Scan posts, write shards, summary, sitemap and feed if anything changed |
//! | `postindex stats` | Load the published index and verify the shard chain |
//! | `postindex browse` | Print one page (or several infinite-scroll pages) of the index |
//! | `postindex session` | Interactive retrieval session driven by stdin commands |
//!
//! ## Examples
//!
//! ```bash
//! # Rebuild after adding a post; a no-op when nothing changed
//! postindex build
//!
//! # See what would change without writing
//! postindex build --dry-run
//!
//! # Third page, filtered to one tag
//! postindex browse --page 3 --tag rust
//!
//! # Three infinite-scroll pages as JSON
//! postindex browse --infinite --pages 3 --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postindex::browse::{run_browse, run_interactive, BrowseOptions};
use postindex::config::{self, Config};
use postindex::ingest::run_build;
use postindex::progress::ProgressMode;
use postindex::stats::run_stats;

/// postindex: paginated JSON index, sitemap and RSS for a static blog, plus
/// a client that reads them back.
#[derive(Parser)]
#[command(name = "postindex", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/postindex.toml`. When the file is missing,
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/postindex.toml")]
    config: PathBuf,

    /// More log output (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Build progress on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index.
    ///
    /// Rewrites only files whose bytes changed and removes shards for pages
    /// that no longer exist. Prints `no changes` when the output is already
    /// current.
    Build {
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Load the published index and verify it.
    Stats,

    /// Print a view of the index.
    Browse {
        /// Page to show (paged mode).
        #[arg(long)]
        page: Option<u32>,

        /// Pages to accumulate (infinite-scroll mode).
        #[arg(long)]
        pages: Option<u32>,

        /// Search query applied to the loaded items.
        #[arg(long)]
        search: Option<String>,

        /// Show only items carrying this tag.
        #[arg(long)]
        tag: Option<String>,

        /// Use infinite-scroll mode.
        #[arg(long)]
        infinite: bool,

        /// Print the view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session.
    ///
    /// Reads one command per line from stdin:
    /// `next`, `prev`, `page <n>`, `search <text>`, `tag <name>`, `clear`,
    /// `scroll <top> <viewport> <height>`, `mode paged|infinite`, `reset`,
    /// `quit`.
    Session {
        #[arg(long)]
        infinite: bool,

        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Build { dry_run } => {
            let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
            let report = run_build(&cfg, dry_run, progress.reporter().as_ref())?;

            println!(
                "Indexed {} items into {} pages ({} skipped)",
                report.items, report.pages, report.skipped
            );
            if !report.changed {
                println!("no changes");
            } else {
                let verb = if dry_run { "would write" } else { "wrote" };
                for name in &report.written {
                    println!("  {} {}", verb, name);
                }
                let verb = if dry_run { "would remove" } else { "removed" };
                for name in &report.removed {
                    println!("  {} {}", verb, name);
                }
            }
        }
        Commands::Stats => {
            run_stats(&cfg).await?;
        }
        Commands::Browse {
            page,
            pages,
            search,
            tag,
            infinite,
            json,
        } => {
            let opts = BrowseOptions {
                page,
                pages,
                search,
                tag,
                infinite,
                json,
            };
            run_browse(&cfg, &opts).await?;
        }
        Commands::Session { infinite, json } => {
            run_interactive(&cfg, infinite, json).await?;
        }
    }

    Ok(())
}

//! # wikishelf CLI (`shelf`)
//!
//! The `shelf` binary drives the article pipeline from the terminal: fetch
//! and transform an article, print its outline, and manage the offline
//! shelf.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf fetch <title>` | Load, transform, and print an article |
//! | `shelf fetch <title> --save` | Also save the transformed article offline |
//! | `shelf toc <title>` | Print the article's outline |
//! | `shelf saved list` | List articles on the offline shelf |
//! | `shelf saved remove <title>` | Remove one saved article |
//! | `shelf saved clear` | Empty the shelf |
//! | `shelf saved usage` | Show the shelf's serialized size |
//!
//! `--offline` skips the network entirely and serves from the shelf.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use wikishelf::cache::{FileStorage, OfflineCache};
use wikishelf::client::HttpContentSource;
use wikishelf::config;
use wikishelf::retrieve::{
    FailReason, LoadState, NoHighlights, OfflineReason, Orchestrator, StaticConnectivity,
};
use wikishelf::transform::TransformOptions;

/// wikishelf CLI — a local-first encyclopedia reading pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; a missing file falls back to defaults (English Wikipedia upstream,
/// `./data/shelf-cache.json` shelf).
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "wikishelf — fetch, transform, and shelve encyclopedia articles for offline reading",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    /// Skip the network and serve from the offline shelf only.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Load an article: fetch, sanitize, rewrite links/media, and print
    /// the transformed HTML.
    Fetch {
        /// Article title, e.g. "Domestic cat".
        title: String,

        /// Save the transformed article to the offline shelf.
        #[arg(long)]
        save: bool,

        /// Print only the load outcome, not the article body.
        #[arg(long)]
        quiet: bool,
    },

    /// Print the article's table-of-contents outline.
    Toc {
        /// Article title.
        title: String,
    },

    /// Manage the offline shelf.
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
}

/// Offline shelf subcommands.
#[derive(Subcommand)]
enum SavedAction {
    /// List saved articles, newest first.
    List,
    /// Remove one saved article by title.
    Remove { title: String },
    /// Empty the entire shelf.
    Clear,
    /// Show the serialized size of the shelf.
    Usage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    let cache = Arc::new(OfflineCache::open(
        FileStorage::new(&cfg.cache.path),
        cfg.cache.max_entries,
    ));

    match cli.command {
        Commands::Fetch { title, save, quiet } => {
            let state = load_article(&cfg, cli.offline, cache.clone(), &title).await?;
            match state {
                LoadState::Ready(view) => {
                    if save {
                        cache.save(&title, &view.content, Vec::new())?;
                        println!("Saved '{}' to the offline shelf.", title);
                    }
                    if let Some(summary) = &view.summary {
                        println!("--- {} ---", summary.title);
                        println!("{}", summary.extract);
                        println!();
                    }
                    if !quiet {
                        println!("{}", view.content);
                    }
                    if !view.related.is_empty() {
                        println!();
                        println!("Related:");
                        for related in &view.related {
                            println!("  {}", related.title);
                        }
                    }
                }
                LoadState::OfflineReady(view, reason) => {
                    match reason {
                        OfflineReason::Disconnected => {
                            println!("(offline — serving '{}' from the shelf)", title)
                        }
                        OfflineReason::NetworkError => {
                            println!("(network error — serving '{}' from the shelf)", title)
                        }
                    }
                    if !quiet {
                        println!("{}", view.content);
                    }
                }
                LoadState::Failed(FailReason::UnavailableOffline) => {
                    eprintln!("Error: '{}' is not available offline.", title);
                    std::process::exit(1);
                }
                LoadState::Failed(FailReason::Fetch(reason)) => {
                    eprintln!("Error: could not load '{}': {}", title, reason);
                    std::process::exit(1);
                }
                LoadState::Idle | LoadState::Loading => unreachable!(),
            }
        }
        Commands::Toc { title } => {
            let state = load_article(&cfg, cli.offline, cache, &title).await?;
            let view = match state {
                LoadState::Ready(view) | LoadState::OfflineReady(view, _) => view,
                _ => {
                    eprintln!("Error: could not load '{}'.", title);
                    std::process::exit(1);
                }
            };
            if view.outline.is_empty() {
                println!("(no outline)");
            } else {
                for entry in &view.outline {
                    let indent = "  ".repeat(entry.level as usize - 2);
                    println!("{}{}  [{}]", indent, entry.text, entry.id);
                }
            }
        }
        Commands::Saved { action } => match action {
            SavedAction::List => {
                let entries = cache.list();
                if entries.is_empty() {
                    println!("The offline shelf is empty.");
                } else {
                    println!("{} saved article(s):", entries.len());
                    for entry in entries {
                        println!("  {}  ({} bytes)", entry.title, entry.content.len());
                    }
                }
            }
            SavedAction::Remove { title } => {
                if cache.has(&title) {
                    cache.remove(&title)?;
                    println!("Removed '{}'.", title);
                } else {
                    println!("'{}' is not on the shelf.", title);
                }
            }
            SavedAction::Clear => {
                cache.clear()?;
                println!("Shelf cleared.");
            }
            SavedAction::Usage => {
                println!(
                    "{} article(s), {} bytes serialized",
                    cache.len(),
                    cache.size_bytes()
                );
            }
        },
    }

    Ok(())
}

async fn load_article(
    cfg: &config::Config,
    offline: bool,
    cache: Arc<OfflineCache<FileStorage>>,
    title: &str,
) -> Result<LoadState> {
    let source = Arc::new(HttpContentSource::new(&cfg.upstream)?);
    let orchestrator = Orchestrator::new(
        source,
        Arc::new(StaticConnectivity(!offline)),
        Arc::new(NoHighlights),
        cache,
        TransformOptions::from_config(cfg),
    );
    Ok(orchestrator.load(title).await)
}

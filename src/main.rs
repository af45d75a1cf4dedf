//! savekeeper - PC save-data discovery, backup and restore
//!
//! CLI front end over the library: find where a game keeps its saves,
//! pack them into a portable zip, and put them back later.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use savekeeper::archive::{analyze_restore, apply_restore, build_backup};
use savekeeper::cache::HintCache;
use savekeeper::config::AppConfig;
use savekeeper::discovery::discover_save_paths;
use savekeeper::hints::Env;
use savekeeper::tasks;
use savekeeper::wiki::PcgwClient;

#[derive(Parser)]
#[command(name = "savekeeper")]
#[command(version)]
#[command(about = "Finds, backs up and restores PC game save data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a game's save locations
    Find {
        /// Game name as it appears on PCGamingWiki (roughly)
        game: String,
    },

    /// Search PCGamingWiki for matching game titles
    Search {
        /// Partial game name
        query: String,

        /// Maximum number of suggestions
        #[arg(short, long, default_value = "8")]
        limit: u32,
    },

    /// Back up a game's save data into a zip archive
    Backup {
        /// Game name
        game: String,

        /// Backup destination root (defaults to the last one used,
        /// then ~/GameSaveBackups)
        #[arg(short, long, env = "SAVEKEEPER_BACKUP_DIR")]
        dest: Option<PathBuf>,

        /// Back up these paths instead of the discovered ones
        #[arg(short, long)]
        path: Vec<PathBuf>,
    },

    /// Inspect a backup archive without restoring it
    Analyze {
        /// Path to the backup zip
        archive: PathBuf,
    },

    /// Restore a backup archive to its original locations
    Restore {
        /// Path to the backup zip
        archive: PathBuf,

        /// Overwrite existing files without asking
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(if cli.verbose {
                "savekeeper=debug".parse()?
            } else {
                "savekeeper=warn".parse()?
            }))
            .init();
    }

    let config = AppConfig::from_system()?;
    config.validate()?;
    let cache = HintCache::open(&config.cache_path);
    let env = Env::from_system();

    match cli.command {
        Commands::Find { game } => {
            let wiki = PcgwClient::new()?;
            let spinner = spinner(format!("Searching save locations for '{game}'..."));
            let result = discover_save_paths(&wiki, &cache, &env, &game).await;
            spinner.finish_and_clear();
            let result = result?;

            if result.is_empty() {
                println!("No save locations found for '{game}'.");
                return Ok(());
            }

            println!("Hints{}:", if result.from_cache { " (cached)" } else { "" });
            for hint in &result.hints {
                println!("  {hint}");
            }
            println!();
            if result.existing.is_empty() {
                println!("None of these paths exist on this machine yet.");
            } else {
                println!("Existing on this machine:");
                for path in &result.existing {
                    println!("  {}", path.display());
                }
            }
        }

        Commands::Search { query, limit } => {
            let wiki = PcgwClient::new()?;
            let titles = wiki.search_titles(&query, limit).await?;
            if titles.is_empty() {
                println!("No titles match '{query}'.");
            } else {
                for title in titles {
                    println!("{title}");
                }
            }
        }

        Commands::Backup { game, dest, path } => {
            let paths = if path.is_empty() {
                let wiki = PcgwClient::new()?;
                let spinner = spinner(format!("Searching save locations for '{game}'..."));
                let result = discover_save_paths(&wiki, &cache, &env, &game).await;
                spinner.finish_and_clear();
                let result = result?;

                if result.existing.is_empty() {
                    bail!("No existing save paths found for '{game}'; nothing to back up");
                }
                result.existing
            } else {
                let mut seen = std::collections::BTreeSet::new();
                let paths: Vec<PathBuf> =
                    path.into_iter().filter(|p| seen.insert(p.clone())).collect();
                for p in &paths {
                    if !p.exists() {
                        bail!("Path does not exist: {}", p.display());
                    }
                }
                paths
            };

            let dest_root = dest
                .or_else(|| cache.last_backup_dir())
                .unwrap_or_else(|| config.backup_root.clone());

            println!("Backing up {} path(s):", paths.len());
            for p in &paths {
                println!("  {}", p.display());
            }

            let spinner = spinner("Creating backup...".to_string());
            let outcome = {
                let game = game.clone();
                let paths = paths.clone();
                let dest_root = dest_root.clone();
                tasks::submit(move || build_backup(&game, &paths, &dest_root))
                    .join()
                    .await?
            };
            spinner.finish_and_clear();
            let outcome = outcome?;

            cache.set_last_backup_dir(&dest_root);

            println!("Backup written: {}", outcome.archive_path.display());
            println!("  {} file(s) stored", outcome.files_written);
            if outcome.files_skipped > 0 {
                println!("  {} file(s) skipped, see log", outcome.files_skipped);
            }
        }

        Commands::Analyze { archive } => {
            let analysis = tasks::submit(move || analyze_restore(&archive)).join().await??;
            println!("Game:             {}", analysis.game);
            println!("Restorable files: {}", analysis.eligible);
            println!(
                "Conflicts:        {}",
                if analysis.has_conflict {
                    "yes, some destinations already exist"
                } else {
                    "none"
                }
            );
        }

        Commands::Restore { archive, yes } => {
            let analysis = {
                let archive = archive.clone();
                tasks::submit(move || analyze_restore(&archive)).join().await??
            };

            if analysis.eligible == 0 {
                println!("Archive contains no restorable files.");
                return Ok(());
            }

            if analysis.has_conflict && !yes && !confirm_overwrite()? {
                println!("Restore aborted.");
                return Ok(());
            }

            let spinner = spinner(format!("Restoring '{}'...", analysis.game));
            let report = tasks::submit(move || apply_restore(&archive)).join().await?;
            spinner.finish_and_clear();
            let report = report?;

            println!("Files restored: {}", report.restored);
            if report.failed > 0 {
                println!("Files failed:   {}", report.failed);
            }
        }
    }

    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn confirm_overwrite() -> Result<bool> {
    print!("Some destination files already exist. Overwrite ALL of them? [y/N] ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES"))
}

//! graphis - CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use graphis::config::EngineConfig;
use graphis::daemon::{self, InstanceLock};
use graphis::engine::cycle::{CycleOutcome, Engine};
use graphis::git::process::check_git_installed;

#[derive(Parser, Debug)]
#[command(name = "graphis")]
#[command(about = "Autonomous change detection and auto-commit for git working trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one detection/commit cycle and exit
    RunOnce {
        /// Repository root to watch (defaults to current directory)
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Minimum number of changes required to commit
        #[arg(long)]
        threshold: Option<usize>,
    },

    /// Watch the repository and commit on a schedule until terminated
    RunDaemon {
        /// Repository root to watch (defaults to current directory)
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Seconds to sleep between cycles
        #[arg(long)]
        interval: Option<u64>,

        /// Minimum number of changes required to commit
        #[arg(long)]
        threshold: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunOnce { dir, threshold } => run_once(&dir, threshold).await,
        Commands::RunDaemon {
            dir,
            interval,
            threshold,
        } => run_daemon(&dir, interval, threshold).await,
    }
}

/// Single pass. Exit code 0 means a commit was created, 1 means there was
/// nothing to commit, 2 means the cycle failed.
async fn run_once(dir: &Path, threshold: Option<usize>) -> ExitCode {
    match try_run_once(dir, threshold).await {
        Ok(CycleOutcome::Committed {
            sequence, counts, ..
        }) => {
            println!(
                "Committed {} change(s) as commit #{}",
                counts.total(),
                sequence
            );
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::NothingToCommit) => {
            println!("Nothing to commit");
            ExitCode::from(1)
        }
        Ok(CycleOutcome::BelowThreshold { total, threshold }) => {
            println!(
                "{} change(s) found, below commit threshold {}",
                total, threshold
            );
            ExitCode::from(1)
        }
        Ok(CycleOutcome::NoChanges) => {
            println!("No changes detected");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn try_run_once(dir: &Path, threshold: Option<usize>) -> Result<CycleOutcome> {
    check_preconditions(dir).await?;
    let _lock = InstanceLock::acquire(dir).context("Could not take the instance lock")?;
    let config = load_config(dir, None, threshold)?;
    let engine = Engine::new(dir, config)?;
    Ok(engine.run_cycle().await?)
}

async fn run_daemon(dir: &Path, interval: Option<u64>, threshold: Option<usize>) -> ExitCode {
    match try_run_daemon(dir, interval, threshold).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn try_run_daemon(dir: &Path, interval: Option<u64>, threshold: Option<usize>) -> Result<()> {
    check_preconditions(dir).await?;
    let config = load_config(dir, interval, threshold)?;
    daemon::run(dir, config).await?;
    Ok(())
}

async fn check_preconditions(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    // Paths in the state document are relative to the repository root, so
    // graphis must be pointed at the root rather than a subdirectory.
    if !dir.join(".git").exists() {
        bail!(
            "{} is not the root of a git repository. Run git init first or point --dir at the repository root",
            dir.display()
        );
    }
    check_git_installed().await?;
    Ok(())
}

/// File configuration with CLI flags layered on top. Overrides are
/// re-validated so a flag cannot smuggle in a value the file could not.
fn load_config(
    dir: &Path,
    interval: Option<u64>,
    threshold: Option<usize>,
) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(dir).context("Failed to load configuration")?;
    if let Some(interval) = interval {
        config.interval_secs = interval;
    }
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    Ok(config.validated()?)
}

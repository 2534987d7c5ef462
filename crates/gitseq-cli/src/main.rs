//! gitseq - checkout directive sequencer CLI
//!
//! ## Commands
//!
//! - `script`: render the checkout script for a job file
//! - `plan`: print the directive plan as JSON
//!
//! Job files are JSON documents with `git`, `timeouts` and `data` sections.
//! Depth and submodule settings can be overridden per invocation with flags
//! or the `GITSEQ_GIT_DEPTH` / `GITSEQ_GIT_SUBMODULES` environment variables.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use gitseq_core::{CheckoutSequencer, JobSpec, ShellExecutor};

#[derive(Parser)]
#[command(name = "gitseq")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Checkout directive sequencer for build sandboxes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the checkout script
    Script {
        #[command(flatten)]
        job: JobArgs,

        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the ordered directive list as JSON
    Plan {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Args, Debug, Default)]
struct JobArgs {
    /// Path to the job description (JSON)
    #[arg(long)]
    job: PathBuf,

    /// Override the fetch depth
    #[arg(long, env = "GITSEQ_GIT_DEPTH")]
    depth: Option<u32>,

    /// Override submodule handling (true/false)
    #[arg(long, env = "GITSEQ_GIT_SUBMODULES")]
    submodules: Option<bool>,

    /// Skip submodules regardless of the job file or environment
    #[arg(long)]
    no_submodules: bool,

    /// Override the ref to fetch
    #[arg(long = "ref")]
    git_ref: Option<String>,
}

impl JobArgs {
    /// Apply per-invocation overrides on top of the job file.
    fn apply(&self, mut job: JobSpec) -> JobSpec {
        if let Some(depth) = self.depth {
            job.git.fetch_depth = depth;
        }
        if let Some(enabled) = self.submodules {
            job.git.submodules_enabled = enabled;
        }
        if self.no_submodules {
            job.git.submodules_enabled = false;
        }
        if let Some(git_ref) = &self.git_ref {
            job.data.git_ref = Some(git_ref.clone());
        }
        job
    }

    fn load(&self) -> Result<JobSpec> {
        let job = read_job(&self.job)?;
        Ok(self.apply(job))
    }
}

fn read_job(path: &Path) -> Result<JobSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    JobSpec::from_json(&text).with_context(|| format!("Invalid job file {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    gitseq_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Script { job, out } => cmd_script(&job, out.as_deref()),
        Commands::Plan { job } => cmd_plan(&job),
    }
}

fn cmd_script(args: &JobArgs, out: Option<&Path>) -> Result<()> {
    let job = args.load()?;
    let executor = ShellExecutor::new(job.timeouts);
    let checkout = CheckoutSequencer::sequence(&job.git, &job.data, &executor)
        .context("Failed to sequence checkout")?;

    match out {
        Some(path) => {
            std::fs::write(path, &checkout.script)
                .with_context(|| format!("Failed to write script to {}", path.display()))?;
            info!(
                path = %path.display(),
                digest = %checkout.digest(),
                directives = checkout.directives.len(),
                "Wrote checkout script"
            );
        }
        None => print!("{}", checkout.script),
    }
    Ok(())
}

fn cmd_plan(args: &JobArgs) -> Result<()> {
    let job = args.load()?;
    let executor = ShellExecutor::new(job.timeouts);
    let directives = CheckoutSequencer::plan(&job.git, &job.data, &executor)
        .context("Failed to sequence checkout")?;
    println!("{}", serde_json::to_string_pretty(&directives)?);
    Ok(())
}

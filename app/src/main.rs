mod config;
mod infrastructure;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use service::LaunchService;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use self::config::LauncherConfig;
use self::infrastructure::environment::ModuleEnvironment;

/// Batch job launcher: renders a job description into the target
/// scheduler's directive syntax, submits it, and propagates the invoked
/// program's exit code.
#[derive(Parser, Debug)]
#[command(name = "sbx", version, about, long_about = None)]
struct Cli {
    /// Launcher configuration file (defaults to ./launcher.yaml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit the job described by a job file
    Submit {
        #[arg(short = 'f', long = "file")]
        job_file: PathBuf,

        /// Block until the job reaches a terminal state and exit with the
        /// invoked program's exit code
        #[arg(long)]
        wait: bool,
    },
    /// Render the batch script without submitting it
    Script {
        #[arg(short = 'f', long = "file")]
        job_file: PathBuf,
    },
    /// Show the scheduler's view of a job
    Status { job_id: String },
    /// Cancel a queued or running job
    Cancel { job_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let launcher_config = LauncherConfig::load(cli.config.as_deref())
        .context("Failed to load launcher configuration")?;

    let scheduler = infrastructure::scheduler::select(&launcher_config)?;
    let launcher = LaunchService::new(
        scheduler,
        Arc::new(ModuleEnvironment),
        Duration::from_secs(launcher_config.poll_interval.max(1)),
    );

    match cli.command {
        Commands::Submit { job_file, wait } => {
            let spec = config::load_job_spec(&job_file)
                .with_context(|| format!("Failed to read job file {}", job_file.display()))?;
            let job_id = launcher.submit(&spec).await?;
            println!("{job_id}");
            if wait {
                let code = launcher.wait(&job_id).await?;
                std::process::exit(code);
            }
        }
        Commands::Script { job_file } => {
            let spec = config::load_job_spec(&job_file)
                .with_context(|| format!("Failed to read job file {}", job_file.display()))?;
            print!("{}", launcher.render(&spec)?);
        }
        Commands::Status { job_id } => {
            let job = launcher.status(&job_id).await?;
            println!(
                "{id}\t{name}\t{state}\texit={exit}",
                id = job.id,
                name = job.name,
                state = job.state,
                exit = job.exit_status_code,
            );
        }
        Commands::Cancel { job_id } => {
            launcher.cancel(&job_id).await?;
        }
    }
    Ok(())
}

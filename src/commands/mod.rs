mod readiness;
mod resolution;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::info;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::tasks::deadline_closer;
use crate::voting::workflow::ResolutionWorkflow;

#[derive(Parser, Debug)]
#[command(
    name = "board-governance",
    about = "Board-readiness scoring and resolution voting",
    version
)]
pub struct Cli {
    /// Override DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage resolutions and their votes
    Resolution {
        #[command(subcommand)]
        command: ResolutionCommand,
    },
    /// Score a professional profile for board readiness
    Readiness(ReadinessArgs),
    /// Close resolutions as their voting deadlines pass
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum ResolutionCommand {
    /// Create a draft resolution
    Create(CreateArgs),
    /// Open a draft resolution for voting
    Open { id: String },
    /// Cast a vote on an open resolution
    Vote(VoteArgs),
    /// Close voting and record the outcome
    Close { id: String },
    /// Show a resolution and its current tally
    Show { id: String },
    /// List resolutions, newest first
    List {
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "meeting")]
    pub meeting_id: Option<String>,
    /// simple_majority, two_thirds or unanimous
    #[arg(long, default_value = "simple_majority")]
    pub voting_type: String,
    #[arg(long, default_value_t = 0)]
    pub quorum: u32,
    /// Close automatically this many minutes after creation
    #[arg(long)]
    pub deadline_minutes: Option<i64>,
}

#[derive(Args, Debug)]
pub struct VoteArgs {
    pub id: String,
    #[arg(long)]
    pub voter: String,
    /// approve, reject or abstain
    #[arg(long)]
    pub choice: String,
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReadinessArgs {
    /// JSON document with headline, summary, experiences, skills and certifications
    pub profile: PathBuf,
    /// Print per-bucket points and matched tiers
    #[arg(long)]
    pub breakdown: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    let workflow = ResolutionWorkflow::new(config.unanimity);

    match cli.command {
        // Scoring is pure; no database needed.
        Command::Readiness(args) => readiness::handle_readiness(&args),
        Command::Resolution { command } => {
            let database = Database::new(&config).await?;
            resolution::handle_resolution_command(&database, &workflow, command).await
        }
        Command::Watch => {
            let database = Arc::new(Database::new(&config).await?);
            let every = config.deadline_check_interval;

            let watcher = tokio::spawn(deadline_closer::check_expired_resolutions_task(
                Arc::clone(&database),
                workflow,
                every,
            ));

            tokio::signal::ctrl_c().await?;
            info!("Shutting down deadline watcher.");
            watcher.abort();
            Ok(())
        }
    }
}

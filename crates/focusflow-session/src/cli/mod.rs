/*
[INPUT]:  Parsed CLI arguments and loaded AppConfig
[OUTPUT]: Subcommand dispatch against the tracker and flow state machines
[POS]:    CLI layer - command tree and shared runtime context
[UPDATE]: When adding subcommands or global flags
*/

pub mod flow;
pub mod track;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use focusflow_adapter::{EnergyLevel, FocusflowClient};
use focusflow_session::{AppConfig, JsonFileStore};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "focusflow", version, about = "Time tracking and flow mode client")]
pub struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: String,
    /// Write logs to a daily rolling file at PATH instead of stderr
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Track time against a single task
    #[command(subcommand)]
    Track(TrackCommand),
    /// Work through a server-chosen task sequence
    #[command(subcommand)]
    Flow(FlowCommand),
}

#[derive(Subcommand, Debug)]
pub enum TrackCommand {
    /// Start tracking; stops any entry running for another task
    Start(TaskArgs),
    Stop,
    Status,
    /// Start tracking and drive pause/resume/stop interactively
    Focus(TaskArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct TaskArgs {
    #[arg(long = "task", value_name = "ID")]
    pub task_id: String,
    #[arg(long)]
    pub title: String,
    #[arg(long = "list", value_name = "ID")]
    pub list_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum FlowCommand {
    Start {
        /// Session length in minutes
        #[arg(long, value_name = "MIN")]
        duration: Option<u32>,
        #[arg(long, value_name = "LEVEL")]
        energy: Option<EnergyLevel>,
    },
    Next,
    Complete,
    Skip,
    Stop,
    Status,
    /// Reattach, poll and print changes until Ctrl-C
    Watch,
}

/// Everything a subcommand needs, built once from configuration
pub struct AppContext {
    pub config: AppConfig,
    pub client: Arc<FocusflowClient>,
    pub store: Arc<JsonFileStore>,
}

impl AppContext {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate().context("validate config")?;
        let client = Arc::new(config.build_client()?);
        let dir = config.storage_dir()?;
        let store = Arc::new(
            JsonFileStore::new(dir.clone())
                .with_context(|| format!("open state directory {}", dir.display()))?,
        );
        info!(base_url = %client.base_url(), state_dir = %dir.display(), "client ready");
        Ok(Self {
            config,
            client,
            store,
        })
    }
}

pub async fn run(command: Command, ctx: AppContext) -> Result<()> {
    match command {
        Command::Track(cmd) => track::run(cmd, &ctx).await,
        Command::Flow(cmd) => flow::run(cmd, &ctx).await,
    }
}

/// `1h 02m 03s` style rendering for elapsed seconds
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else {
        format!("{minutes:02}m {secs:02}s")
    }
}

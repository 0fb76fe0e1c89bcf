/*
[INPUT]:  CLI arguments, YAML configuration file, FOCUSFLOW_TOKEN
[OUTPUT]: Time tracking and flow mode commands against the remote API
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or log setup
*/

mod cli;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cli::{AppContext, Cli};
use focusflow_session::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_deref())?;

    let config = load_config(args.config_path.as_deref())?;
    info!(
        config_path = ?args.config_path,
        base_url = %config.api.base_url,
        "starting focusflow"
    );

    let ctx = AppContext::from_config(config)?;
    cli::run(args.command, ctx).await
}

/// Stderr logging, plus a daily rolling file when `log_file` is given
fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let guard = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .context("log file path must name a file")?;
            let appender = tracing_appender::rolling::daily(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Some(guard)
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            None
        }
    };
    Ok(guard)
}

/// Explicit path, else `<config_dir>/focusflow/config.yaml` when present, else defaults
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::from_file(path).context("load config");
    }
    let default_path = dirs::config_dir().map(|dir| dir.join("focusflow").join("config.yaml"));
    match default_path {
        Some(path) if path.exists() => AppConfig::from_file(&path).context("load config"),
        _ => Ok(AppConfig::default()),
    }
}

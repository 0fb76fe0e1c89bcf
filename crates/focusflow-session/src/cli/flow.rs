/*
[INPUT]:  Flow subcommands, remote flow API, persisted session marker
[OUTPUT]: Flow session transitions and status output
[POS]:    CLI layer - flow mode commands
[UPDATE]: When flow session operations change
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use focusflow_adapter::{FocusflowClient, TransitionOutcome};
use focusflow_session::{FlowSession, FlowSnapshot, JsonFileStore};
use tracing::info;

use super::{AppContext, FlowCommand};

type CliFlowSession = FlowSession<Arc<FocusflowClient>, Arc<JsonFileStore>>;

pub async fn run(command: FlowCommand, ctx: &AppContext) -> Result<()> {
    let config = ctx.config.flow_session_config();

    match command {
        FlowCommand::Start { duration, energy } => {
            let session =
                FlowSession::restore(ctx.client.clone(), ctx.store.clone(), config).await;
            let duration = duration.unwrap_or(ctx.config.flow.default_duration_minutes);
            let energy = energy.or(ctx.config.flow.default_energy);
            let response = session
                .start_flow(duration, energy)
                .await
                .context("start flow session")?;
            println!(
                "{} {} tasks for {} min",
                style("Flow started:").green().bold(),
                response.sequence.len(),
                duration
            );
            for task in &response.sequence {
                println!("  {}. {} ({} min)", task.order + 1, task.title, task.duration);
            }
        }
        FlowCommand::Next => {
            let session = new_session(ctx);
            let outcome = session.next_task().await.context("advance flow")?;
            print_outcome(&outcome, &session.snapshot());
        }
        FlowCommand::Complete => {
            let session = new_session(ctx);
            let outcome = session.complete_task().await.context("complete flow task")?;
            print_outcome(&outcome, &session.snapshot());
        }
        FlowCommand::Skip => {
            let session = new_session(ctx);
            let outcome = session.skip_task().await.context("skip flow task")?;
            print_outcome(&outcome, &session.snapshot());
        }
        FlowCommand::Stop => {
            let session = new_session(ctx);
            session.stop_flow().await.context("stop flow session")?;
            println!("{}", style("Flow stopped.").green());
        }
        FlowCommand::Status => {
            let session = new_session(ctx);
            session.refresh_status().await.context("fetch flow status")?;
            print_snapshot(&session.snapshot());
        }
        FlowCommand::Watch => watch(ctx).await?,
    }
    Ok(())
}

fn new_session(ctx: &AppContext) -> CliFlowSession {
    FlowSession::new(
        ctx.client.clone(),
        ctx.store.clone(),
        ctx.config.flow_session_config(),
    )
}

async fn watch(ctx: &AppContext) -> Result<()> {
    let session = new_session(ctx);
    if !session.resume_if_persisted().await.context("resume flow session")? {
        session.refresh_status().await.context("fetch flow status")?;
    }
    if !session.is_active() {
        println!("{}", style("No active flow session.").dim());
        return Ok(());
    }

    info!(
        interval_secs = ctx.config.flow.poll_interval_secs,
        "watching flow session"
    );
    let mut snapshots = session.subscribe();
    print_snapshot(&snapshots.borrow_and_update());

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot);
                if !snapshot.is_active {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listen for ctrl-c")?;
                break;
            }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &TransitionOutcome, snapshot: &FlowSnapshot) {
    match outcome {
        TransitionOutcome::FlowComplete => {
            println!("{}", style("Flow complete. Nice work.").green().bold());
        }
        TransitionOutcome::Advanced { .. } => print_snapshot(snapshot),
    }
}

fn print_snapshot(snapshot: &FlowSnapshot) {
    if !snapshot.is_active {
        println!("{}", style("No active flow session.").dim());
        return;
    }
    println!("{}", render_progress(snapshot));
    if let Some(task) = &snapshot.current_task {
        println!("  now: {} ({} min)", style(&task.title).bold(), task.duration);
        if let Some(reason) = &task.reason {
            println!("       {}", style(reason).dim());
        }
    }
    if let Some(error) = &snapshot.error {
        println!("  {}", style(error).red());
    }
}

fn render_progress(snapshot: &FlowSnapshot) -> String {
    match snapshot.progress {
        Some(progress) => format!(
            "{} {}/{} ({}%)",
            style("Flow").cyan().bold(),
            progress.current,
            progress.total,
            progress.percentage
        ),
        None => format!("{}", style("Flow").cyan().bold()),
    }
}

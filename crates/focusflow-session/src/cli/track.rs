/*
[INPUT]:  Track subcommands, remote time entry store
[OUTPUT]: Started/stopped time entries, status and live elapsed display
[POS]:    CLI layer - active time tracking commands
[UPDATE]: When tracker operations or the focus loop change
*/

use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::{Select, theme::ColorfulTheme};
use focusflow_adapter::{TimeEntry, TimeEntryStore};
use focusflow_session::{ActiveTimeTracker, Clock, SystemClock, TrackerSnapshot, TrackerState};
use tracing::warn;

use super::{AppContext, TaskArgs, TrackCommand, format_elapsed};

pub async fn run(command: TrackCommand, ctx: &AppContext) -> Result<()> {
    let mut tracker = ActiveTimeTracker::new(ctx.client.clone(), SystemClock)
        .with_tick_interval(ctx.config.tick_interval());
    tracker.refresh().await.context("load time entries")?;

    match command {
        TrackCommand::Start(args) => {
            let entry = start(&mut tracker, &args).await?;
            println!(
                "{} {} ({})",
                style("Tracking").green().bold(),
                entry.description,
                entry.id
            );
        }
        TrackCommand::Stop => match tracker.stop().await.context("stop tracking")? {
            Some(entry) => print_stopped(&entry),
            None => println!("{}", style("Nothing is being tracked.").yellow()),
        },
        TrackCommand::Status => print_snapshot(&tracker.snapshot()),
        TrackCommand::Focus(args) => focus(&mut tracker, &args).await?,
    }
    Ok(())
}

async fn start<S, C>(tracker: &mut ActiveTimeTracker<S, C>, args: &TaskArgs) -> Result<TimeEntry>
where
    S: TimeEntryStore,
    C: Clock + Clone + 'static,
{
    tracker
        .start(&args.task_id, &args.title, args.list_id.as_deref())
        .await
        .with_context(|| format!("start tracking task {}", args.task_id))
}

#[derive(Debug, Clone, Copy)]
enum FocusAction {
    Pause,
    Resume,
    Continue,
    Stop,
}

impl FocusAction {
    fn label(self) -> &'static str {
        match self {
            FocusAction::Pause => "Pause",
            FocusAction::Resume => "Resume",
            FocusAction::Continue => "Back to timer",
            FocusAction::Stop => "Stop and save",
        }
    }
}

/// Live timer until Ctrl-C, then an action menu; Esc in the menu stops
async fn focus<S, C>(tracker: &mut ActiveTimeTracker<S, C>, args: &TaskArgs) -> Result<()>
where
    S: TimeEntryStore,
    C: Clock + Clone + 'static,
{
    let entry = start(tracker, args).await?;
    println!("{} {}", style("Focusing on").cyan().bold(), entry.description);

    let theme = ColorfulTheme::default();
    loop {
        live_view(tracker).await?;

        let actions: &[FocusAction] = match tracker.state() {
            TrackerState::Running => &[FocusAction::Continue, FocusAction::Pause, FocusAction::Stop],
            TrackerState::Paused => &[FocusAction::Resume, FocusAction::Stop],
            TrackerState::Idle => {
                println!("{}", style("Entry was closed elsewhere.").yellow());
                return Ok(());
            }
        };
        let labels: Vec<&str> = actions.iter().map(|action| action.label()).collect();
        let selection = match Select::with_theme(&theme)
            .with_prompt(format!("{} elapsed", format_elapsed(tracker.elapsed_seconds())))
            .items(&labels)
            .default(0)
            .interact_opt()
        {
            Ok(selection) => selection,
            Err(err) => {
                warn!(error = %err, "focus prompt failed; stopping");
                None
            }
        };

        match selection.map(|idx| actions[idx]) {
            Some(FocusAction::Pause) => {
                tracker.pause();
            }
            Some(FocusAction::Resume) => {
                tracker.resume();
            }
            Some(FocusAction::Continue) => {}
            Some(FocusAction::Stop) | None => break,
        }
    }

    if let Some(entry) = tracker.stop().await.context("stop tracking")? {
        print_stopped(&entry);
    }
    Ok(())
}

/// Redraw the elapsed line on every snapshot until Ctrl-C
async fn live_view<S, C>(tracker: &ActiveTimeTracker<S, C>) -> Result<()>
where
    S: TimeEntryStore,
    C: Clock + Clone + 'static,
{
    let term = Term::stdout();
    let mut snapshots = tracker.subscribe();
    println!("{}", style("Ctrl-C for actions").dim());

    loop {
        let line = render_line(&snapshots.borrow_and_update());
        term.clear_line()?;
        term.write_str(&line)?;

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listen for ctrl-c")?;
                break;
            }
        }
    }
    term.write_line("")?;
    Ok(())
}

fn render_line(snapshot: &TrackerSnapshot) -> String {
    let state = match snapshot.state {
        TrackerState::Running => style("running").green(),
        TrackerState::Paused => style("paused").yellow(),
        TrackerState::Idle => style("idle").dim(),
    };
    format!(
        "{} [{}] {}",
        snapshot.title.as_deref().unwrap_or("-"),
        state,
        format_elapsed(snapshot.elapsed_seconds)
    )
}

fn print_snapshot(snapshot: &TrackerSnapshot) {
    if snapshot.state == TrackerState::Idle {
        println!("{}", style("Nothing is being tracked.").dim());
        return;
    }
    println!("{}", render_line(snapshot));
    if let Some(task_id) = &snapshot.task_id {
        println!("  task:    {task_id}");
    }
    if let Some(started_at) = snapshot.started_at {
        println!("  started: {}", started_at.with_timezone(&chrono::Local).format("%H:%M:%S"));
    }
}

fn print_stopped(entry: &TimeEntry) {
    println!(
        "{} {} after {} min",
        style("Stopped").green().bold(),
        entry.description,
        entry.duration
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_line_contains_title_and_elapsed() {
        let snapshot = TrackerSnapshot {
            state: TrackerState::Paused,
            entry_id: Some("te_1".to_string()),
            task_id: Some("t1".to_string()),
            title: Some("Write report".to_string()),
            started_at: Some(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()),
            elapsed_seconds: 75,
        };
        let line = console::strip_ansi_codes(&render_line(&snapshot)).to_string();
        assert_eq!(line, "Write report [paused] 01m 15s");
    }
}

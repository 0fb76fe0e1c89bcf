/*
[INPUT]:  TimeEntryStore (remote), Clock, start/pause/resume/stop commands
[OUTPUT]: Single derived view of the in-progress time entry + watch snapshots
[POS]:    Core state machine - active time tracking
[UPDATE]: When changing duration accounting or the at-most-one-active rule
[UPDATE]: 2026-10-16 Display tick only runs while tracking is running
*/

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use focusflow_adapter::{NewTimeEntry, TimeEntry, TimeEntryPatch, TimeEntryStore};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock, local_date};
use crate::error::Result;
use crate::scheduler::PeriodicTask;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub entry_id: Option<String>,
    pub task_id: Option<String>,
    pub title: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
}

impl TrackerSnapshot {
    fn idle() -> Self {
        Self {
            state: TrackerState::Idle,
            entry_id: None,
            task_id: None,
            title: None,
            started_at: None,
            elapsed_seconds: 0,
        }
    }
}

/// Client-only pause bookkeeping; never sent to the server
#[derive(Debug, Clone, Copy)]
struct PauseLedger {
    paused_at: Option<DateTime<Utc>>,
    total: TimeDelta,
}

impl Default for PauseLedger {
    fn default() -> Self {
        Self {
            paused_at: None,
            total: TimeDelta::zero(),
        }
    }
}

/// The entry without an end time; most recent start wins if several exist
pub fn select_active(entries: &[TimeEntry]) -> Option<&TimeEntry> {
    entries
        .iter()
        .filter(|entry| entry.is_active())
        .max_by_key(|entry| entry.start_time)
}

/// Whole elapsed seconds between `started_at` and `instant`, minus paused time
pub fn elapsed_between(started_at: DateTime<Utc>, instant: DateTime<Utc>, paused: TimeDelta) -> u64 {
    let secs = (instant - started_at).num_seconds() - paused.num_seconds();
    secs.max(0) as u64
}

/// Minutes recorded on stop: `ceil(active_seconds / 60)`
pub fn tracked_minutes(started_at: DateTime<Utc>, stopped_at: DateTime<Utc>, paused: TimeDelta) -> u32 {
    let secs = elapsed_between(started_at, stopped_at, paused);
    u32::try_from(secs.div_ceil(60)).unwrap_or(u32::MAX)
}

/// Tracks the one task currently being worked on
///
/// Elapsed time is always recomputed from wall-clock deltas, never accumulated tick by tick,
/// so suspended timers cannot make it drift.
#[derive(Debug)]
pub struct ActiveTimeTracker<S, C = SystemClock> {
    store: S,
    clock: C,
    active: Option<TimeEntry>,
    pause: PauseLedger,
    tick_interval: Duration,
    ticker: Option<PeriodicTask>,
    snapshots: Arc<watch::Sender<TrackerSnapshot>>,
}

impl<S, C> ActiveTimeTracker<S, C>
where
    S: TimeEntryStore,
    C: Clock + Clone + 'static,
{
    pub fn new(store: S, clock: C) -> Self {
        let (snapshots, _rx) = watch::channel(TrackerSnapshot::idle());
        Self {
            store,
            clock,
            active: None,
            pause: PauseLedger::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            ticker: None,
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Construct and adopt whatever entry is currently in progress remotely
    pub async fn load(store: S, clock: C) -> Result<Self> {
        let mut tracker = Self::new(store, clock);
        tracker.refresh().await?;
        Ok(tracker)
    }

    pub fn state(&self) -> TrackerState {
        match (&self.active, self.pause.paused_at) {
            (None, _) => TrackerState::Idle,
            (Some(_), Some(_)) => TrackerState::Paused,
            (Some(_), None) => TrackerState::Running,
        }
    }

    pub fn active_entry(&self) -> Option<&TimeEntry> {
        self.active.as_ref()
    }

    /// Running: measured up to now. Paused: frozen at the pause instant.
    pub fn elapsed_seconds(&self) -> u64 {
        let Some(entry) = &self.active else {
            return 0;
        };
        let until = self.pause.paused_at.unwrap_or_else(|| self.clock.now());
        elapsed_between(entry.start_time, until, self.pause.total)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        match &self.active {
            None => TrackerSnapshot::idle(),
            Some(entry) => TrackerSnapshot {
                state: self.state(),
                entry_id: Some(entry.id.clone()),
                task_id: entry.task_id.clone(),
                title: Some(entry.description.clone()),
                started_at: Some(entry.start_time),
                elapsed_seconds: self.elapsed_seconds(),
            },
        }
    }

    /// Snapshots after every transition and on every display tick
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshots.subscribe()
    }

    /// Re-derive the active entry from the remote store
    pub async fn refresh(&mut self) -> Result<TrackerSnapshot> {
        let entries = self.store.list().await?;
        match select_active(&entries).cloned() {
            Some(entry) => {
                let unchanged = self
                    .active
                    .as_ref()
                    .is_some_and(|current| current.id == entry.id);
                if unchanged {
                    self.active = Some(entry);
                    self.publish();
                } else {
                    debug!(entry_id = %entry.id, "adopting active time entry");
                    self.adopt(entry);
                }
            }
            None => {
                if let Some(previous) = &self.active {
                    debug!(entry_id = %previous.id, "active time entry closed elsewhere");
                }
                self.clear();
            }
        }
        Ok(self.snapshot())
    }

    /// Begin tracking `task_id`, stopping any entry active for a different task first
    ///
    /// Without a local mirror the store is listed first, so an entry left open by another
    /// client is closed rather than duplicated.
    pub async fn start(
        &mut self,
        task_id: &str,
        title: &str,
        list_id: Option<&str>,
    ) -> Result<TimeEntry> {
        if self.active.is_none() {
            self.refresh().await?;
        }
        if let Some(active) = &self.active {
            if active.is_for_task(task_id) {
                return Ok(active.clone());
            }
            info!(
                previous_task = ?active.task_id,
                task_id = %task_id,
                "switching tracked task"
            );
            self.stop().await?;
        }

        let now = self.clock.now();
        let entry = NewTimeEntry {
            task_id: Some(task_id.to_string()),
            list_id: list_id.map(str::to_string),
            description: title.to_string(),
            start_time: now,
            end_time: None,
            duration: 0,
            date: local_date(now),
            tags: Vec::new(),
            billable: None,
        };

        let created = self.store.create(entry).await?;
        info!(entry_id = %created.id, task_id = %task_id, "time tracking started");
        self.adopt(created.clone());
        Ok(created)
    }

    /// Freeze elapsed time; returns false when not running
    pub fn pause(&mut self) -> bool {
        if self.state() != TrackerState::Running {
            return false;
        }
        self.pause.paused_at = Some(self.clock.now());
        self.stop_ticker();
        self.publish();
        debug!(elapsed_secs = self.elapsed_seconds(), "time tracking paused");
        true
    }

    /// Fold the pause gap into the paused total; returns false when not paused
    pub fn resume(&mut self) -> bool {
        let Some(paused_at) = self.pause.paused_at else {
            return false;
        };
        let gap = (self.clock.now() - paused_at).max(TimeDelta::zero());
        self.pause.total = self.pause.total + gap;
        self.pause.paused_at = None;
        self.start_ticker();
        self.publish();
        debug!(paused_secs = self.pause.total.num_seconds(), "time tracking resumed");
        true
    }

    /// Close the active entry with its final duration; `None` when idle
    ///
    /// Local state is only reset once the server accepts the update.
    pub async fn stop(&mut self) -> Result<Option<TimeEntry>> {
        let Some(active) = self.active.clone() else {
            return Ok(None);
        };

        let now = self.clock.now();
        let mut paused = self.pause.total;
        if let Some(paused_at) = self.pause.paused_at {
            paused = paused + (now - paused_at).max(TimeDelta::zero());
        }
        let minutes = tracked_minutes(active.start_time, now, paused);

        let updated = self
            .store
            .update(&active.id, TimeEntryPatch::finish(now, minutes))
            .await?;
        info!(
            entry_id = %active.id,
            duration_minutes = minutes,
            paused_secs = paused.num_seconds(),
            "time tracking stopped"
        );
        self.clear();
        Ok(Some(updated))
    }

    fn adopt(&mut self, entry: TimeEntry) {
        self.active = Some(entry);
        self.pause = PauseLedger::default();
        self.start_ticker();
        self.publish();
    }

    fn clear(&mut self) {
        self.stop_ticker();
        self.active = None;
        self.pause = PauseLedger::default();
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();
        let Some(entry) = &self.active else {
            return;
        };
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("tracker used without Tokio runtime; display tick not started");
            return;
        }

        let started_at = entry.start_time;
        let paused_total = self.pause.total;
        let clock = self.clock.clone();
        let snapshots = self.snapshots.clone();
        self.ticker = Some(PeriodicTask::spawn(
            "tracker-display-tick",
            self.tick_interval,
            move || {
                let elapsed = elapsed_between(started_at, clock.now(), paused_total);
                snapshots.send_modify(|snapshot| snapshot.elapsed_seconds = elapsed);
                std::future::ready(ControlFlow::Continue(()))
            },
        ));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

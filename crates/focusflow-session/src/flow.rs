/*
[INPUT]:  FlowApi (server-authoritative session), KeyValueStore (resume hint), poll cadence
[OUTPUT]: Mirrored flow session state, transition outcomes, background status polling
[POS]:    Core state machine - flow mode session mirror
[UPDATE]: When changing transition semantics, resumption, or polling
[UPDATE]: 2026-10-16 Reject overlapping transition commands instead of racing the server
[UPDATE]: 2026-10-16 Drop status replies fetched before a local reset
*/

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use focusflow_adapter::{
    EnergyLevel, FlowApi, FlowProgress, FlowStatus, FlowTask, FocusflowError, StartFlowRequest,
    StartFlowResponse, TransitionOutcome, TransitionResponse,
};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::scheduler::PeriodicTask;
use crate::state::KeyValueStore;

/// Storage key holding the last known session status
pub const FLOW_SESSION_KEY: &str = "flow_session";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FlowSessionConfig {
    pub poll_interval: Duration,
}

impl Default for FlowSessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Local mirror handed to callers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSnapshot {
    pub is_active: bool,
    pub session_id: Option<String>,
    pub session: Option<FlowStatus>,
    pub current_task: Option<FlowTask>,
    pub sequence: Vec<FlowTask>,
    pub progress: Option<FlowProgress>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Next,
    Complete,
    Skip,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Next => "next",
            Command::Complete => "complete",
            Command::Skip => "skip",
        }
    }
}

/// Only the `active` flag of the persisted status is trusted
#[derive(Debug, Deserialize)]
struct ResumeMarker {
    #[serde(default)]
    active: bool,
}

struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct FlowInner<A, K> {
    api: A,
    store: K,
    config: FlowSessionConfig,
    state: watch::Sender<FlowSnapshot>,
    in_flight: AtomicBool,
    /// Bumped whenever a command rewrites the mirror; status replies from older generations are stale
    generation: AtomicU64,
    poller: Mutex<Option<PeriodicTask>>,
}

/// Client-side mirror of a server-owned flow session
///
/// Cloning yields another handle to the same session. The status poller only holds a weak
/// reference and exits once every handle is dropped.
pub struct FlowSession<A, K> {
    inner: Arc<FlowInner<A, K>>,
}

impl<A, K> Clone for FlowSession<A, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, K> std::fmt::Debug for FlowSession<A, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSession")
            .field("state", &*self.inner.state.borrow())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<A, K> FlowSession<A, K>
where
    A: FlowApi + 'static,
    K: KeyValueStore + 'static,
{
    pub fn new(api: A, store: K, config: FlowSessionConfig) -> Self {
        Self {
            inner: Arc::new(FlowInner {
                api,
                store,
                config,
                state: watch::Sender::new(FlowSnapshot::default()),
                in_flight: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                poller: Mutex::new(None),
            }),
        }
    }

    /// Construct and reattach to a session left active by a previous run
    pub async fn restore(api: A, store: K, config: FlowSessionConfig) -> Self {
        let session = Self::new(api, store, config);
        if let Err(err) = session.resume_if_persisted().await {
            warn!(error = %err, "failed to resume flow session");
        }
        session
    }

    /// Issue one status refresh when the persisted status says a session was active
    ///
    /// Returns whether a resume was attempted.
    pub async fn resume_if_persisted(&self) -> Result<bool> {
        let raw = match self.inner.store.get(FLOW_SESSION_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to read persisted flow session");
                return Ok(false);
            }
        };
        let Some(raw) = raw else {
            return Ok(false);
        };

        let marker = match serde_json::from_str::<ResumeMarker>(&raw) {
            Ok(marker) => marker,
            Err(err) => {
                warn!(error = %err, "discarding unreadable persisted flow session");
                self.forget_persisted();
                return Ok(false);
            }
        };
        if !marker.active {
            return Ok(false);
        }

        info!("persisted flow session found; reattaching");
        self.refresh_status().await?;
        Ok(true)
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().is_active
    }

    pub fn session(&self) -> Option<FlowStatus> {
        self.inner.state.borrow().session.clone()
    }

    pub fn current_task(&self) -> Option<FlowTask> {
        self.inner.state.borrow().current_task.clone()
    }

    pub fn sequence(&self) -> Vec<FlowTask> {
        self.inner.state.borrow().sequence.clone()
    }

    pub fn progress(&self) -> Option<FlowProgress> {
        self.inner.state.borrow().progress
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    /// Snapshots after every local or polled change
    pub fn subscribe(&self) -> watch::Receiver<FlowSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }

    /// Ask the server for a new sequence of roughly `duration_minutes`
    pub async fn start_flow(
        &self,
        duration_minutes: u32,
        energy: Option<EnergyLevel>,
    ) -> Result<StartFlowResponse> {
        let _guard = self.begin("start")?;

        if self.is_active() {
            info!("stopping current flow session before starting a new one");
            if let Err(err) = self.inner.api.stop().await {
                warn!(error = %err, "stop before restart failed");
            }
            self.clear();
        }

        let request = StartFlowRequest {
            duration: duration_minutes,
            energy,
        };
        let response = self
            .inner
            .api
            .start(request)
            .await
            .map_err(|err| self.record_error(err))?;

        info!(
            session_id = %response.session_id,
            tasks = response.sequence.len(),
            duration_minutes,
            energy = ?energy,
            "flow session started"
        );
        self.bump_generation();
        self.inner.state.send_replace(FlowSnapshot {
            is_active: true,
            session_id: Some(response.session_id.clone()),
            session: None,
            current_task: response.sequence.first().cloned(),
            sequence: response.sequence.clone(),
            progress: Some(FlowProgress::from_counts(0, response.sequence.len() as u32)),
            error: None,
        });
        self.ensure_polling();

        if let Err(err) = self.refresh_status().await {
            warn!(error = %err, "status refresh after start failed");
        }
        Ok(response)
    }

    pub async fn next_task(&self) -> Result<TransitionOutcome> {
        self.transition(Command::Next).await
    }

    pub async fn complete_task(&self) -> Result<TransitionOutcome> {
        self.transition(Command::Complete).await
    }

    pub async fn skip_task(&self) -> Result<TransitionOutcome> {
        self.transition(Command::Skip).await
    }

    /// End the session; local state is cleared even if the server call fails
    pub async fn stop_flow(&self) -> Result<()> {
        let _guard = self.begin("stop")?;
        let result = self.inner.api.stop().await;
        self.clear();
        match result {
            Ok(()) => {
                info!("flow session stopped");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "flow stop call failed; local state cleared anyway");
                Err(err.into())
            }
        }
    }

    /// Replace the local mirror with the server's view
    ///
    /// A session the server no longer knows about is cleared, not reported. A reply that
    /// lands after a local stop, completion, or advance is discarded.
    pub async fn refresh_status(&self) -> Result<()> {
        let generation = self.inner.generation.load(Ordering::Acquire);
        let result = self.inner.api.status().await;
        if self.inner.generation.load(Ordering::Acquire) != generation {
            debug!("discarding flow status fetched before a local state change");
            return Ok(());
        }

        match result {
            Ok(status) if status.active => {
                self.apply_status(status);
                self.ensure_polling();
                Ok(())
            }
            Ok(_) => {
                debug!("server reports no active flow session");
                self.clear();
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!("flow session not found on server; clearing local state");
                self.clear();
                Ok(())
            }
            Err(err) => Err(self.record_error(err)),
        }
    }

    async fn transition(&self, command: Command) -> Result<TransitionOutcome> {
        let _guard = self.begin(command.name())?;

        let response: TransitionResponse = match command {
            Command::Next => self.inner.api.next().await,
            Command::Complete => self.inner.api.complete().await,
            Command::Skip => self.inner.api.skip().await,
        }
        .map_err(|err| self.record_error(err))?;

        let outcome = response.outcome();
        match &outcome {
            TransitionOutcome::FlowComplete => {
                info!(command = command.name(), "flow complete");
                self.clear();
            }
            TransitionOutcome::Advanced { task, progress } => {
                self.bump_generation();
                self.inner.state.send_modify(|state| {
                    if task.is_some() {
                        state.current_task = task.clone();
                    }
                    if progress.is_some() {
                        state.progress = *progress;
                    }
                });
                debug!(
                    command = command.name(),
                    task_id = ?task.as_ref().map(|task| task.id.as_str()),
                    "flow advanced"
                );
                if let Err(err) = self.refresh_status().await {
                    warn!(error = %err, "status refresh after transition failed");
                }
            }
        }
        Ok(outcome)
    }

    fn begin(&self, operation: &'static str) -> Result<InFlight<'_>> {
        let flag = &self.inner.in_flight;
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(operation, "flow command rejected while another is in flight");
            return Err(SessionError::Busy { operation });
        }
        Ok(InFlight { flag })
    }

    fn apply_status(&self, status: FlowStatus) {
        self.inner.state.send_modify(|state| {
            if let Some(previous) = &state.session {
                if status.current_index < previous.current_index {
                    warn!(
                        previous = previous.current_index,
                        current = status.current_index,
                        "server moved flow index backwards"
                    );
                }
            }

            let sequence = if status.sequence.is_empty() {
                std::mem::take(&mut state.sequence)
            } else {
                status.sequence.clone()
            };
            *state = FlowSnapshot {
                is_active: true,
                session_id: status.session_id.clone().or_else(|| state.session_id.take()),
                current_task: status.current_task.clone(),
                sequence,
                progress: Some(status.effective_progress()),
                session: Some(status.clone()),
                error: None,
            };
        });
        self.persist(&status);
    }

    fn persist(&self, status: &FlowStatus) {
        let result = serde_json::to_string(status)
            .map_err(SessionError::from)
            .and_then(|raw| {
                self.inner
                    .store
                    .set(FLOW_SESSION_KEY, &raw)
                    .map_err(SessionError::from)
            });
        if let Err(err) = result {
            warn!(error = %err, "failed to persist flow session");
        }
    }

    fn forget_persisted(&self) {
        if let Err(err) = self.inner.store.remove(FLOW_SESSION_KEY) {
            warn!(error = %err, "failed to remove persisted flow session");
        }
    }

    fn bump_generation(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn clear(&self) {
        self.bump_generation();
        self.inner.state.send_replace(FlowSnapshot::default());
        self.stop_polling();
        self.forget_persisted();
    }

    fn record_error(&self, err: FocusflowError) -> SessionError {
        let message = err.to_string();
        self.inner.state.send_modify(|state| state.error = Some(message));
        SessionError::Remote(err)
    }

    fn ensure_polling(&self) {
        let mut poller = lock(&self.inner.poller);
        if poller.as_ref().is_some_and(PeriodicTask::is_running) {
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("flow session used without Tokio runtime; status polling not started");
            return;
        }

        let weak: Weak<FlowInner<A, K>> = Arc::downgrade(&self.inner);
        *poller = Some(PeriodicTask::spawn(
            "flow-status-poll",
            self.inner.config.poll_interval,
            move || {
                let weak = weak.clone();
                async move {
                    let Some(inner) = weak.upgrade() else {
                        return ControlFlow::Break(());
                    };
                    let session = FlowSession { inner };
                    if let Err(err) = session.refresh_status().await {
                        warn!(error = %err, "flow status poll failed");
                    }
                    ControlFlow::Continue(())
                }
            },
        ));
        debug!(interval_secs = self.inner.config.poll_interval.as_secs(), "flow status polling started");
    }

    fn stop_polling(&self) {
        if let Some(poller) = lock(&self.inner.poller).take() {
            poller.cancel();
            debug!("flow status polling stopped");
        }
    }
}

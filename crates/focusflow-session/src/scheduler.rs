/*
[INPUT]:  Period + async callback
[OUTPUT]: Cancellable background task ticking on a fixed cadence
[POS]:    Runtime layer - timers owned by the state machines' lifecycle
[UPDATE]: When tick semantics (first tick, missed ticks) change
*/

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Repeating background task
///
/// The first run happens one `period` after spawning. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn on the current Tokio runtime
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tick().await.is_break() {
                            break;
                        }
                    }
                }
            }
            debug!(task = name, "periodic task exited");
        });

        Self {
            name,
            shutdown,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.handle.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

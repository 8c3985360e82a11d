use std::time::Duration;

use tokio::{
    task::JoinSet,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub type Task = (&'static str, anyhow::Result<()>);

/// Runs periodic background jobs until cancelled
pub struct Scheduler {
    cancel_token: CancellationToken,
    tasks: JoinSet<Task>,
}

impl Scheduler {
    pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a background task, running it right away and then every `period`.
    ///
    /// A failing run is logged and the task keeps its schedule.
    pub fn spawn_task<P, F, Fut>(&mut self, period: Duration, name: &'static str, params: P, mut task: F)
    where
        P: Clone + Send + Sync + 'static,
        F: FnMut(P) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let cancel = self.cancel_token.clone();
        self.tasks.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = task(params.clone()).await {
                            tracing::error!(error = %e, "Task {name} failed");
                        }
                    }
                }
            }

            (name, Ok(()))
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancels all tasks and waits for them to finish, giving up after `timeout`.
    ///
    /// Tasks still running at the deadline are aborted.
    pub async fn shutdown(mut self, timeout: Duration) {
        self.cancel_token.cancel();

        let deadline = Instant::now() + timeout;

        while !self.tasks.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());

            match time::timeout(remaining, self.tasks.join_next()).await {
                Ok(Some(Ok((name, Ok(()))))) => {
                    tracing::info!("Task {name} finished successfully");
                }
                Ok(Some(Ok((name, Err(e))))) => {
                    tracing::error!(error = %e, "Task {name} error");
                }
                Ok(Some(Err(e))) => {
                    tracing::error!(error = %e, "Task join error");
                }
                // no tasks left
                Ok(None) => break,
                Err(_) => {
                    tracing::error!("Scheduler timed out when shutting down");
                    self.tasks.abort_all();
                    break;
                }
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }
}

//! Background polling of generation jobs.
//!
//! [`JobPoller::spawn`] starts a task that fetches the job's status on a
//! fixed interval until the job reaches a terminal state. The task is tied to
//! a [`PollHandle`]: cancelling or dropping the handle stops the task, and any
//! status that was in flight at that moment is discarded instead of being
//! delivered to a screen that no longer exists.

use crate::api::{ApiClient, ApiError};
use crate::models::JobStatus;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Anything that can report the status of a job.
#[async_trait]
pub trait JobStatusSource: Send + Sync + 'static {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError>;
}

#[async_trait]
impl JobStatusSource for ApiClient {
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        ApiClient::job_status(self, job_id).await
    }
}

/// What the poll task reports back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PollUpdate {
    /// A non-terminal status; polling continues.
    Status(JobStatus),
    /// The job reached a terminal state; polling has stopped.
    Finished(JobStatus),
    /// The status request failed; polling has stopped.
    Failed(String),
}

/// Owner side of a running poll task.
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    updates: mpsc::UnboundedReceiver<PollUpdate>,
}

impl PollHandle {
    /// Stops the task. No update is delivered after this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Next pending update, without blocking.
    pub fn try_next(&mut self) -> Option<PollUpdate> {
        if self.token.is_cancelled() {
            return None;
        }
        self.updates.try_recv().ok()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct JobPoller;

impl JobPoller {
    /// Starts polling `job_id` every `every` on `runtime`.
    ///
    /// The first request is made one interval after spawning.
    pub fn spawn<S: JobStatusSource>(
        runtime: &Handle,
        source: Arc<S>,
        job_id: String,
        every: Duration,
    ) -> PollHandle {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        runtime.spawn(poll_until_terminal(source, job_id, every, token.clone(), tx));

        PollHandle {
            token,
            updates: rx,
        }
    }
}

async fn poll_until_terminal<S: JobStatusSource>(
    source: Arc<S>,
    job_id: String,
    every: Duration,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<PollUpdate>,
) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            _ = token.cancelled() => break,
            outcome = source.job_status(&job_id) => outcome,
        };

        if token.is_cancelled() {
            debug!(%job_id, "discarding status fetched after cancellation");
            break;
        }

        let update = match outcome {
            Ok(status) if status.is_terminal() => {
                info!(%job_id, status = %status.status, schedule_id = ?status.schedule_id(), "job finished");
                PollUpdate::Finished(status)
            }
            Ok(status) => {
                debug!(%job_id, status = %status.status, "job still running");
                PollUpdate::Status(status)
            }
            Err(err) => {
                warn!(%job_id, error = %err, "job status request failed");
                PollUpdate::Failed(err.to_string())
            }
        };

        let done = !matches!(update, PollUpdate::Status(_));
        if tx.send(update).is_err() || done {
            break;
        }
    }
    debug!(%job_id, "poller stopped");
}

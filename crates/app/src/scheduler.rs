//! Poll scheduler: periodic timer plus debounced on-demand refreshes.
//!
//! A single background task owns the schedule and awaits each poll inline,
//! so two polls can never overlap. Refresh requests are coalesced
//! trailing-edge: every request pushes the deadline back by the cooldown,
//! and one poll runs once the requests go quiet. Requests that arrive while
//! a poll is running stay queued and are coalesced into the next one.
//! After any poll, the periodic timer restarts from zero.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Something the scheduler can poll.
pub trait PollTarget: Send + Sync + 'static {
    /// Error reported by a failed poll. Logged, never propagated.
    type Error: fmt::Display + Send;

    /// Run one poll to completion.
    fn poll_once(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Timing of a scheduled poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Time between periodic polls.
    pub interval: Duration,
    /// Quiet period a refresh request waits for before polling.
    pub cooldown: Duration,
}

/// Cheap, cloneable handle used to ask for a refresh.
#[derive(Debug, Clone)]
pub struct RefreshRequester {
    sender: mpsc::UnboundedSender<()>,
}

impl RefreshRequester {
    /// Ask for a refresh. Never blocks; ignored once the loop has stopped.
    pub fn request(&self) {
        let _ = self.sender.send(());
    }
}

/// Receiving side of the refresh requests, consumed by [`spawn`].
#[derive(Debug)]
pub struct RefreshRequests {
    receiver: mpsc::UnboundedReceiver<()>,
}

/// Create a linked requester / request queue pair.
#[must_use]
pub fn refresh_channel() -> (RefreshRequester, RefreshRequests) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (RefreshRequester { sender }, RefreshRequests { receiver })
}

/// The poll loop was already started for this target.
#[derive(Debug, thiserror::Error)]
#[error("poll loop already started")]
pub struct AlreadyStartedError;

/// Handle to a running poll loop. The loop is aborted when the handle is
/// dropped.
#[derive(Debug)]
#[must_use = "the poll loop stops as soon as its handle is dropped"]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop. A poll in progress is abandoned.
    pub fn shutdown(self) {
        self.task.abort();
        tracing::info!("poll loop stopped");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the poll loop for `target` on the current tokio runtime.
///
/// The first periodic poll happens one `interval` after spawning; callers
/// that need data immediately poll once themselves before spawning.
pub fn spawn<T: PollTarget>(
    target: Arc<T>,
    requests: RefreshRequests,
    schedule: Schedule,
) -> PollHandle {
    tracing::info!(
        interval_ms = schedule.interval.as_millis(),
        cooldown_ms = schedule.cooldown.as_millis(),
        "poll loop started"
    );
    PollHandle {
        task: tokio::spawn(run(target, requests.receiver, schedule)),
    }
}

async fn run<T: PollTarget>(
    target: Arc<T>,
    mut requests: mpsc::UnboundedReceiver<()>,
    schedule: Schedule,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + schedule.interval, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut pending: Option<Instant> = None;
    let mut accepting = true;

    loop {
        let deadline = pending;
        tokio::select! {
            _ = ticker.tick() => {}
            received = requests.recv(), if accepting => {
                match received {
                    Some(()) => pending = Some(Instant::now() + schedule.cooldown),
                    None => accepting = false,
                }
                continue;
            }
            () = sleep_until(deadline), if deadline.is_some() => {
                tracing::debug!("running debounced refresh");
            }
        }

        pending = None;
        match target.poll_once().await {
            Ok(()) => tracing::debug!("poll completed"),
            Err(err) => tracing::warn!(%err, "poll failed, retrying next interval"),
        }
        ticker.reset();
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

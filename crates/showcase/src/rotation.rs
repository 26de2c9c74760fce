//! Timed rotation of the hero panel.
//!
//! A rotation is a spawned task that emits [`Tick`]s on a bounded channel every
//! `period`. The task ends when its [`RotationHandle`] is cancelled or dropped,
//! or when the receiving side goes away; the receiver then yields `None`.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(7_000);

/// One timer firing. `seq` starts at 1 for each rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
}

/// Stops the rotation task it was returned with. Dropping it stops the task too.
#[derive(Debug)]
pub struct RotationHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RotationHandle {
    pub fn cancel(self) { drop(self) }

    pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop.take() { let _ = tx.send(()); }
        self.task.abort();
    }
}

/// Spawn a rotation ticking every `period`, first tick one period from now.
/// Must be called inside a tokio runtime.
pub fn spawn_rotation(period: Duration) -> (RotationHandle, mpsc::Receiver<Tick>) {
    let period = if period.is_zero() {
        warn!(default_ms = DEFAULT_PERIOD.as_millis() as u64, "zero rotation period; using default");
        DEFAULT_PERIOD
    } else {
        period
    };
    let (tx, rx) = mpsc::channel(1);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq = 0u64;
        debug!(period_ms = period.as_millis() as u64, "rotation started");
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = interval.tick() => {
                    seq += 1;
                    match tx.try_send(Tick { seq }) {
                        Ok(()) => {}
                        // consumer is behind; skip rather than queue ticks up
                        Err(mpsc::error::TrySendError::Full(_)) => debug!(seq, "rotation tick dropped"),
                        Err(mpsc::error::TrySendError::Closed(_)) => break,
                    }
                }
            }
        }
        debug!(ticks = seq, "rotation stopped");
    });
    (RotationHandle { stop: Some(stop_tx), task }, rx)
}

/// At most one live rotation. Starting again replaces the previous one.
#[derive(Debug, Default)]
pub struct Rotation {
    handle: Option<RotationHandle>,
}

impl Rotation {
    pub fn new() -> Self { Self::default() }

    /// Cancel any running rotation, then start a new one if `count > 1`.
    /// Returns the tick receiver of the new rotation.
    pub fn start(&mut self, period: Duration, count: usize) -> Option<mpsc::Receiver<Tick>> {
        self.stop();
        if count <= 1 {
            debug!(count, "rotation not started");
            return None;
        }
        let (handle, rx) = spawn_rotation(period);
        self.handle = Some(handle);
        Some(rx)
    }

    pub fn stop(&mut self) {
        if let Some(h) = self.handle.take() { h.cancel(); }
    }

    pub fn is_running(&self) -> bool { self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false) }
}

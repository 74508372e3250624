//! Periodic invalidation of the interpolated position.
//!
//! The ticker is a two-state machine:
//!
//! ```text
//! Stopped --start()--> Running      (no-op if already Running)
//! Running --stop()---> Stopped      (no-op if already Stopped)
//! ```
//!
//! While running, a tokio task fires every `period`. Each tick marks the
//! cached estimate stale and emits [`TrackerEvent::InterpolatedPositionAvailable`],
//! but only if the vehicle link is alive at tick time. The tick never
//! recomputes the estimate itself.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::interpolator::InterpolationCache;
use super::provider::VehicleLink;
use super::state::TrackerEvent;

/// Default tick period (~30Hz).
pub const DEFAULT_INTERPOLATION_PERIOD: Duration = Duration::from_millis(33);

/// Handle to a running tick task.
struct RunningTicker {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningTicker {
    fn is_alive(&self) -> bool {
        !self.cancellation.is_cancelled() && !self.handle.is_finished()
    }
}

/// Starts and stops the periodic invalidation task.
pub struct InterpolationTicker {
    period: Duration,
    runtime: Handle,
    cache: Arc<InterpolationCache>,
    link: Arc<dyn VehicleLink>,
    events: broadcast::Sender<TrackerEvent>,
    running: Mutex<Option<RunningTicker>>,
}

impl InterpolationTicker {
    pub fn new(
        period: Duration,
        runtime: Handle,
        cache: Arc<InterpolationCache>,
        link: Arc<dyn VehicleLink>,
        events: broadcast::Sender<TrackerEvent>,
    ) -> Self {
        Self {
            period,
            runtime,
            cache,
            link,
            events,
            running: Mutex::new(None),
        }
    }

    /// True while a tick task is active.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(RunningTicker::is_alive)
    }

    /// Start the tick task if it is not already running.
    ///
    /// Returns true if a new task was spawned.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();

        if running.as_ref().is_some_and(RunningTicker::is_alive) {
            return false;
        }

        let cancellation = CancellationToken::new();
        let handle = self.runtime.spawn(run_ticks(
            self.period,
            Arc::clone(&self.cache),
            Arc::clone(&self.link),
            self.events.clone(),
            cancellation.clone(),
        ));

        info!(
            period_ms = self.period.as_millis() as u64,
            "Interpolation ticker started"
        );

        *running = Some(RunningTicker {
            cancellation,
            handle,
        });
        true
    }

    /// Cancel the tick task immediately.
    ///
    /// Returns true if a running task was cancelled. A tick already in
    /// progress may still complete.
    pub fn stop(&self) -> bool {
        let Some(ticker) = self.running.lock().take() else {
            return false;
        };

        let was_alive = ticker.is_alive();
        ticker.cancellation.cancel();
        ticker.handle.abort();

        if was_alive {
            info!("Interpolation ticker stopped");
        }
        was_alive
    }
}

impl Drop for InterpolationTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(
    period: Duration,
    cache: Arc<InterpolationCache>,
    link: Arc<dyn VehicleLink>,
    events: broadcast::Sender<TrackerEvent>,
    cancellation: CancellationToken,
) {
    // First tick one full period after start
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                debug!("Interpolation ticker cancelled");
                break;
            }
            _ = ticker.tick() => {
                tick(&cache, link.as_ref(), &events);
            }
        }
    }
}

fn tick(cache: &InterpolationCache, link: &dyn VehicleLink, events: &broadcast::Sender<TrackerEvent>) {
    if !link.is_connection_alive() {
        trace!("Interpolation tick skipped (link down)");
        return;
    }

    cache.invalidate();
    let _ = events.send(TrackerEvent::InterpolatedPositionAvailable);
}

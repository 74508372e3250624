//! Periodic tracker status logging.
//!
//! Spawns a background task that logs a [`TrackerStatus`] snapshot at DEBUG
//! level, useful when analysing how far the dead-reckoned estimate drifts
//! between sensor reports.
//!
//! # Output Format
//!
//! - `lat`, `lon` - Raw fix in decimal degrees
//! - `est_lat`, `est_lon` - Interpolated estimate
//! - `hdg` - Heading in degrees
//! - `age_ms` - Age of the raw fix
//! - `fix`, `sats`, `eph_m` - Fix quality
//! - `link` - Whether the vehicle link is alive

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::state::TrackerStatus;
use super::tracker::PositionTracker;

/// Spawns a background task that periodically logs tracker status.
///
/// Stops when the cancellation token is triggered. Callers should check
/// `tracing::enabled!(tracing::Level::DEBUG)` before spawning.
pub fn spawn_status_logger(
    tracker: Arc<PositionTracker>,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    log_status(&tracker.status());
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Tracker status logger stopped");
                    break;
                }
            }
        }
    })
}

fn log_status(status: &TrackerStatus) {
    match (status.position, status.interpolated) {
        (Some(fix), Some(estimate)) => {
            tracing::debug!(
                lat = format!("{:.6}", fix.latitude),
                lon = format!("{:.6}", fix.longitude),
                est_lat = format!("{:.6}", estimate.latitude),
                est_lon = format!("{:.6}", estimate.longitude),
                hdg = format!("{:.1}", status.heading),
                age_ms = status.position_age.as_millis() as u64,
                fix = %status.fix_type,
                sats = status.quality.satellite_count,
                eph_m = status.quality.horizontal_error_m,
                link = status.link_alive,
                "Tracker status"
            );
        }
        _ => {
            tracing::debug!(
                link = status.link_alive,
                ticker = status.interpolation_running,
                "Tracker status (no fix)"
            );
        }
    }
}

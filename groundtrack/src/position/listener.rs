//! Connection event listener.
//!
//! Forwards [`ConnectionEvent`]s from a broadcast channel into a tracker, so
//! the driver that detects heartbeats does not need a reference to every
//! component interested in link state.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::state::ConnectionEvent;
use super::tracker::PositionTracker;

/// Spawns a task that feeds connection events into the tracker.
///
/// The task stops when the cancellation token is triggered or when every
/// sender of the channel has been dropped.
pub fn spawn_connection_listener(
    tracker: Arc<PositionTracker>,
    mut events: broadcast::Receiver<ConnectionEvent>,
    cancellation: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    debug!("Connection listener cancelled");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => tracker.on_connection_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Connection listener lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Connection event channel closed");
                        break;
                    }
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::provider::{SharedGroundSpeed, SharedLink};

    fn create_tracker() -> Arc<PositionTracker> {
        let (tx, _rx) = broadcast::channel(16);
        Arc::new(
            PositionTracker::builder(SharedLink::new(true), SharedGroundSpeed::default(), tx)
                .build(),
        )
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_listener_drives_ticker() {
        let tracker = create_tracker();
        let (tx, rx) = broadcast::channel(8);
        let cancel = CancellationToken::new();
        let handle = spawn_connection_listener(Arc::clone(&tracker), rx, cancel.clone());

        tx.send(ConnectionEvent::Established).unwrap();
        settle().await;
        assert!(tracker.is_interpolation_running());

        tx.send(ConnectionEvent::Disconnected).unwrap();
        settle().await;
        assert!(!tracker.is_interpolation_running());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_listener_stops_when_channel_closes() {
        let tracker = create_tracker();
        let (tx, rx) = broadcast::channel(8);
        let handle = spawn_connection_listener(tracker, rx, CancellationToken::new());

        drop(tx);
        handle.await.unwrap();
    }
}

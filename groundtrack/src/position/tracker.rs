//! Position Tracker - last raw fix plus a dead-reckoned estimate.
//!
//! The tracker records raw fixes from an intermittent positioning sensor and
//! extrapolates the vehicle's current position along the last heading at the
//! current ground speed. The estimate is cached and only recomputed after the
//! periodic ticker marks it stale.
//!
//! # Usage
//!
//! ```ignore
//! let link = SharedLink::new(true);
//! let speed = SharedGroundSpeed::new(0.0);
//! let (events_tx, _) = broadcast::channel(64);
//!
//! let tracker = PositionTracker::builder(link.clone(), speed.clone(), events_tx).build();
//!
//! tracker.on_connection_event(ConnectionEvent::Established);
//! tracker.update_position(Coordinate::new(53.63, 9.99));
//! speed.set(5.0);
//!
//! if let Some(estimate) = tracker.interpolated_position() {
//!     println!("Now at {}", estimate);
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::interpolator::InterpolationCache;
use super::provider::{Geodesy, GroundSpeedSource, SphericalEarth, VehicleLink};
use super::state::{
    ConnectionEvent, FixQuality, FixType, TrackerEvent, TrackerStatus, UNKNOWN,
};
use super::ticker::{InterpolationTicker, DEFAULT_INTERPOLATION_PERIOD};
use crate::coord::Coordinate;

/// Runtime configuration for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Period of the interpolation invalidation ticker.
    pub interpolation_period: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interpolation_period: DEFAULT_INTERPOLATION_PERIOD,
        }
    }
}

/// Raw fix state. Written only by the telemetry ingestion path.
struct FixState {
    position: Option<Coordinate>,
    timestamp: Instant,
    heading: f64,
    fix_type: i32,
    quality: FixQuality,
}

/// Tracks a vehicle's raw fix and dead-reckoned current position.
pub struct PositionTracker {
    fix: RwLock<FixState>,
    interpolation: Arc<InterpolationCache>,
    ticker: InterpolationTicker,
    link: Arc<dyn VehicleLink>,
    speed: Arc<dyn GroundSpeedSource>,
    geodesy: Arc<dyn Geodesy>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<TrackerEvent>,
}

impl PositionTracker {
    /// Start building a tracker around the given collaborators.
    pub fn builder(
        link: impl VehicleLink + 'static,
        speed: impl GroundSpeedSource + 'static,
        events: broadcast::Sender<TrackerEvent>,
    ) -> PositionTrackerBuilder {
        PositionTrackerBuilder {
            link: Arc::new(link),
            speed: Arc::new(speed),
            events,
            geodesy: Arc::new(SphericalEarth),
            clock: Arc::new(SystemClock),
            config: TrackerConfig::default(),
            runtime: None,
        }
    }

    /// True once any raw fix has been recorded.
    pub fn is_position_valid(&self) -> bool {
        self.fix.read().position.is_some()
    }

    /// Last raw fix, unmodified.
    pub fn position(&self) -> Option<Coordinate> {
        self.fix.read().position
    }

    /// Horizontal error (m) and satellite count.
    pub fn fix_quality(&self) -> FixQuality {
        self.fix.read().quality
    }

    /// Estimated horizontal error in meters, `-1` until reported.
    pub fn horizontal_error_m(&self) -> f64 {
        self.fix.read().quality.horizontal_error_m
    }

    /// Visible satellite count, `-1` until reported.
    pub fn satellite_count(&self) -> i32 {
        self.fix.read().quality.satellite_count
    }

    /// Lock classification.
    pub fn fix_type(&self) -> FixType {
        FixType::from_numeric(self.fix_type_numeric())
    }

    /// Raw fix type as reported, `-1` until reported.
    pub fn fix_type_numeric(&self) -> i32 {
        self.fix.read().fix_type
    }

    /// Bearing in degrees into the most recent raw fix.
    pub fn heading(&self) -> f64 {
        self.fix.read().heading
    }

    /// Time since the last raw fix was recorded.
    ///
    /// Saturates at zero if the clock reads earlier than the fix timestamp.
    pub fn position_age(&self) -> Duration {
        let timestamp = self.fix.read().timestamp;
        self.clock.now().saturating_duration_since(timestamp)
    }

    /// Dead-reckoned estimate of the current position.
    ///
    /// Returns `None` without a fix, and the raw fix unmodified while the
    /// link is down.
    pub fn interpolated_position(&self) -> Option<Coordinate> {
        let (position, heading, timestamp) = {
            let fix = self.fix.read();
            (fix.position?, fix.heading, fix.timestamp)
        };

        if !self.link.is_connection_alive() {
            return Some(position);
        }

        let estimate = self.interpolation.get_or_refresh(position, |slot| {
            let age = self.clock.now().saturating_duration_since(timestamp);
            let speed = self.speed.current_ground_speed();

            if age.is_zero() || speed <= 0.0 {
                trace!(age_ms = age.as_millis() as u64, speed, "Holding interpolated position");
                return false;
            }

            let distance_m = speed * age.as_secs_f64();
            self.geodesy.project_into(position, heading, distance_m, slot);
            trace!(distance_m, heading, "Interpolated position recomputed");
            true
        });

        Some(estimate)
    }

    /// Record fix quality metadata.
    ///
    /// The horizontal error is only refreshed when the satellite count changes.
    pub fn update_fix_quality(&self, fix_type: i32, satellite_count: i32, horizontal_error_cm: u32) {
        let (count_changed, fix_changed) = {
            let mut fix = self.fix.write();

            let count_changed = fix.quality.satellite_count != satellite_count;
            if count_changed {
                fix.quality.satellite_count = satellite_count;
                fix.quality.horizontal_error_m = horizontal_error_cm as f64 / 100.0;
            }

            let fix_changed = fix.fix_type != fix_type;
            if fix_changed {
                fix.fix_type = fix_type;
            }

            (count_changed, fix_changed)
        };

        if count_changed {
            debug!(
                satellites = satellite_count,
                eph_m = horizontal_error_cm as f64 / 100.0,
                "Satellite count changed"
            );
            self.emit(TrackerEvent::SatelliteCountChanged);
        }
        if fix_changed {
            debug!(fix = %FixType::from_numeric(fix_type), fix_type, "Fix type changed");
            self.emit(TrackerEvent::FixTypeChanged);
        }
    }

    /// Record a new raw fix and make sure the ticker is running.
    pub fn update_position(&self, new_position: Coordinate) {
        let changed = {
            let mut fix = self.fix.write();
            fix.timestamp = self.clock.now();

            if let Some(previous) = fix.position {
                fix.heading = self.geodesy.bearing(previous, new_position);
            }

            let changed = fix.position != Some(new_position);
            if changed {
                fix.position = Some(new_position);
            }
            changed
        };

        if changed {
            debug!(
                lat = format!("{:.6}", new_position.latitude),
                lon = format!("{:.6}", new_position.longitude),
                heading = format!("{:.1}", self.heading()),
                "Position updated"
            );
            self.emit(TrackerEvent::PositionChanged);
        }

        self.ticker.start();
    }

    /// Drive the ticker from a connection lifecycle event.
    pub fn on_connection_event(&self, event: ConnectionEvent) {
        debug!(%event, "Connection event");
        if event.is_link_up() {
            self.ticker.start();
        } else {
            self.ticker.stop();
        }
    }

    /// True while the invalidation ticker is active.
    pub fn is_interpolation_running(&self) -> bool {
        self.ticker.is_running()
    }

    /// Subscribe to tracker notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Full snapshot of the tracker.
    pub fn status(&self) -> TrackerStatus {
        let (position, heading, fix_type, quality) = {
            let fix = self.fix.read();
            (fix.position, fix.heading, fix.fix_type, fix.quality)
        };

        TrackerStatus {
            position,
            interpolated: self.interpolated_position(),
            heading,
            position_age: self.position_age(),
            fix_type: FixType::from_numeric(fix_type),
            quality,
            link_alive: self.link.is_connection_alive(),
            interpolation_running: self.ticker.is_running(),
        }
    }

    fn emit(&self, event: TrackerEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    #[cfg(test)]
    pub(crate) fn interpolation_cache(&self) -> &InterpolationCache {
        &self.interpolation
    }
}

/// Builder for [`PositionTracker`].
pub struct PositionTrackerBuilder {
    link: Arc<dyn VehicleLink>,
    speed: Arc<dyn GroundSpeedSource>,
    events: broadcast::Sender<TrackerEvent>,
    geodesy: Arc<dyn Geodesy>,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
    runtime: Option<Handle>,
}

impl PositionTrackerBuilder {
    /// Use a custom geodesy implementation.
    pub fn geodesy(mut self, geodesy: impl Geodesy + 'static) -> Self {
        self.geodesy = Arc::new(geodesy);
        self
    }

    /// Use a custom time source.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Apply runtime configuration.
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawn the ticker on this runtime instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the tracker.
    ///
    /// # Panics
    ///
    /// Panics if no runtime was supplied and this is called outside a tokio
    /// runtime context.
    pub fn build(self) -> PositionTracker {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        let interpolation = Arc::new(InterpolationCache::new());
        let ticker = InterpolationTicker::new(
            self.config.interpolation_period,
            runtime,
            Arc::clone(&interpolation),
            Arc::clone(&self.link),
            self.events.clone(),
        );

        PositionTracker {
            fix: RwLock::new(FixState {
                position: None,
                timestamp: self.clock.now(),
                heading: 0.0,
                fix_type: UNKNOWN,
                quality: FixQuality::default(),
            }),
            interpolation,
            ticker,
            link: self.link,
            speed: self.speed,
            geodesy: self.geodesy,
            clock: self.clock,
            events: self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{bearing_between, distance_m};
    use crate::position::clock::ManualClock;
    use crate::position::provider::{SharedGroundSpeed, SharedLink};

    struct Harness {
        tracker: PositionTracker,
        link: SharedLink,
        speed: SharedGroundSpeed,
        clock: ManualClock,
        rx: broadcast::Receiver<TrackerEvent>,
    }

    fn harness() -> Harness {
        let link = SharedLink::new(true);
        let speed = SharedGroundSpeed::new(0.0);
        let clock = ManualClock::new();
        let (tx, rx) = broadcast::channel(64);
        let tracker = PositionTracker::builder(link.clone(), speed.clone(), tx)
            .clock(clock.clone())
            .build();
        Harness {
            tracker,
            link,
            speed,
            clock,
            rx,
        }
    }

    fn events(rx: &mut broadcast::Receiver<TrackerEvent>) -> Vec<TrackerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_initial_state() {
        let h = harness();

        assert!(!h.tracker.is_position_valid());
        assert!(h.tracker.position().is_none());
        assert!(h.tracker.interpolated_position().is_none());
        assert_eq!(h.tracker.heading(), 0.0);
        assert_eq!(h.tracker.fix_type_numeric(), -1);
        assert_eq!(h.tracker.fix_type(), FixType::NoFix);
        assert_eq!(h.tracker.satellite_count(), -1);
        assert_eq!(h.tracker.horizontal_error_m(), -1.0);
        assert!(!h.tracker.is_interpolation_running());
    }

    #[tokio::test]
    async fn test_first_fix_makes_position_valid() {
        let mut h = harness();

        h.tracker.update_position(Coordinate::new(0.0, 0.0));

        assert!(h.tracker.is_position_valid());
        assert_eq!(h.tracker.position(), Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(h.tracker.heading(), 0.0);
        assert!(h.tracker.is_interpolation_running());
        assert_eq!(events(&mut h.rx), vec![TrackerEvent::PositionChanged]);
    }

    #[tokio::test]
    async fn test_duplicate_fix_is_absorbed() {
        let mut h = harness();

        h.tracker.update_position(Coordinate::new(1.0, 1.0));
        h.tracker.update_position(Coordinate::new(1.0, 1.0));

        assert_eq!(events(&mut h.rx), vec![TrackerEvent::PositionChanged]);
    }

    #[tokio::test]
    async fn test_duplicate_fix_refreshes_timestamp() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(1.0, 1.0));
        h.clock.advance(Duration::from_secs(3));
        h.tracker.update_position(Coordinate::new(1.0, 1.0));

        assert_eq!(h.tracker.position_age(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_heading_uses_previous_fix() {
        let h = harness();
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.01);
        let c = Coordinate::new(0.01, 0.01);

        h.tracker.update_position(a);
        h.tracker.update_position(b);
        assert!((h.tracker.heading() - 90.0).abs() < 1e-6);

        h.tracker.update_position(c);
        assert!((h.tracker.heading() - bearing_between(b, c)).abs() < 1e-9);
        assert!((h.tracker.heading() - bearing_between(a, c)).abs() > 1.0);
    }

    #[tokio::test]
    async fn test_position_age_tracks_clock() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(0.0, 0.0));
        h.clock.advance(Duration::from_millis(750));

        assert_eq!(h.tracker.position_age(), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn test_position_age_saturates_on_backwards_clock() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(0.0, 0.0));
        h.clock.rewind(Duration::from_secs(1));

        assert_eq!(h.tracker.position_age(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_interpolation_projects_along_heading() {
        let h = harness();
        let second = Coordinate::new(0.001, 0.0);

        h.tracker.update_position(Coordinate::new(0.0, 0.0));
        h.clock.advance(Duration::from_secs(1));
        h.tracker.update_position(second);
        h.speed.set(5.0);
        h.clock.advance(Duration::from_millis(200));

        let estimate = h.tracker.interpolated_position().unwrap();

        assert!(h.tracker.heading().abs() < 1e-6);
        assert!((distance_m(second, estimate) - 1.0).abs() < 1e-3);
        assert!(estimate.latitude > second.latitude);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interpolation_is_cached_between_ticks() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(0.0, 0.0));
        h.tracker.update_position(Coordinate::new(0.0, 0.001));
        h.speed.set(10.0);
        h.clock.advance(Duration::from_secs(1));

        let first = h.tracker.interpolated_position();
        h.clock.advance(Duration::from_secs(5));
        let second = h.tracker.interpolated_position();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalidation_triggers_recompute() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(0.0, 0.0));
        h.tracker.update_position(Coordinate::new(0.0, 0.001));
        h.speed.set(10.0);
        h.clock.advance(Duration::from_secs(1));
        let first = h.tracker.interpolated_position().unwrap();

        h.clock.advance(Duration::from_secs(1));
        h.tracker.interpolation_cache().invalidate();
        let second = h.tracker.interpolated_position().unwrap();

        assert!(second.longitude > first.longitude);
    }

    #[tokio::test]
    async fn test_zero_speed_holds_raw_fix() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(5.0, 5.0));
        h.clock.advance(Duration::from_secs(2));

        assert_eq!(
            h.tracker.interpolated_position(),
            Some(Coordinate::new(5.0, 5.0))
        );
        assert!(!h.tracker.interpolation_cache().is_stale());
    }

    #[tokio::test]
    async fn test_zero_age_holds_position() {
        let h = harness();
        h.speed.set(20.0);

        h.tracker.update_position(Coordinate::new(5.0, 5.0));

        assert_eq!(
            h.tracker.interpolated_position(),
            Some(Coordinate::new(5.0, 5.0))
        );
    }

    #[tokio::test]
    async fn test_disconnected_returns_raw_fix() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(0.0, 0.0));
        h.tracker.update_position(Coordinate::new(0.0, 0.001));
        h.speed.set(50.0);
        h.clock.advance(Duration::from_secs(10));
        h.link.set_alive(false);

        assert_eq!(h.tracker.interpolated_position(), h.tracker.position());
        // Nothing was computed while disconnected
        assert!(h.tracker.interpolation_cache().is_stale());
    }

    #[tokio::test]
    async fn test_fix_quality_updates_and_events() {
        let mut h = harness();

        h.tracker.update_fix_quality(3, 9, 120);

        assert_eq!(h.tracker.fix_type(), FixType::Lock3D);
        assert_eq!(h.tracker.fix_type_numeric(), 3);
        assert_eq!(
            h.tracker.fix_quality(),
            FixQuality {
                horizontal_error_m: 1.2,
                satellite_count: 9
            }
        );
        assert_eq!(
            events(&mut h.rx),
            vec![
                TrackerEvent::SatelliteCountChanged,
                TrackerEvent::FixTypeChanged
            ]
        );
    }

    #[tokio::test]
    async fn test_same_satellite_count_keeps_stale_error() {
        let mut h = harness();

        h.tracker.update_fix_quality(2, 6, 150);
        events(&mut h.rx);
        h.tracker.update_fix_quality(2, 6, 300);

        assert_eq!(h.tracker.horizontal_error_m(), 1.5);
        assert!(events(&mut h.rx).is_empty());
    }

    #[tokio::test]
    async fn test_fix_type_change_alone() {
        let mut h = harness();

        h.tracker.update_fix_quality(2, 6, 150);
        events(&mut h.rx);
        h.tracker.update_fix_quality(3, 6, 150);

        assert_eq!(events(&mut h.rx), vec![TrackerEvent::FixTypeChanged]);
        assert_eq!(h.tracker.fix_type().to_string(), "3D");
    }

    #[tokio::test]
    async fn test_connection_events_drive_ticker() {
        let h = harness();

        h.tracker.on_connection_event(ConnectionEvent::Established);
        assert!(h.tracker.is_interpolation_running());

        h.tracker.on_connection_event(ConnectionEvent::TimedOut);
        assert!(!h.tracker.is_interpolation_running());

        h.tracker.on_connection_event(ConnectionEvent::Restored);
        assert!(h.tracker.is_interpolation_running());

        h.tracker.on_connection_event(ConnectionEvent::Disconnected);
        assert!(!h.tracker.is_interpolation_running());

        // Already stopped
        h.tracker.on_connection_event(ConnectionEvent::Disconnected);
        assert!(!h.tracker.is_interpolation_running());
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let h = harness();

        h.tracker.update_position(Coordinate::new(1.0, 2.0));
        h.tracker.update_fix_quality(3, 11, 80);
        h.clock.advance(Duration::from_millis(500));

        let status = h.tracker.status();

        assert_eq!(status.position, Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(status.interpolated, Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(status.fix_type, FixType::Lock3D);
        assert_eq!(status.quality.satellite_count, 11);
        assert_eq!(status.position_age, Duration::from_millis(500));
        assert!(status.link_alive);
        assert!(status.interpolation_running);
    }
}

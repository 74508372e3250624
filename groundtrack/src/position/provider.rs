//! Collaborator traits consumed by the tracker.
//!
//! The tracker does not own connection detection, the speed model, or the
//! navigation math. It reaches them through these narrow traits:
//!
//! - [`VehicleLink`] - Is the vehicle connection alive?
//! - [`GroundSpeedSource`] - Current ground speed in m/s
//! - [`Geodesy`] - Bearing and projection primitives
//!
//! [`SharedLink`] and [`SharedGroundSpeed`] are cheap shared cells that
//! drivers can update from their own telemetry path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::coord::{self, Coordinate};

/// Connection liveness query.
pub trait VehicleLink: Send + Sync {
    /// True while the vehicle connection is considered alive.
    fn is_connection_alive(&self) -> bool;
}

/// Ground speed query.
pub trait GroundSpeedSource: Send + Sync {
    /// Current ground speed in meters per second.
    fn current_ground_speed(&self) -> f64;
}

/// Navigation primitives used for heading and dead reckoning.
pub trait Geodesy: Send + Sync {
    /// Bearing in degrees (0-360) from `from` to `to`.
    fn bearing(&self, from: Coordinate, to: Coordinate) -> f64;

    /// Project `from` along `bearing_deg` for `distance_m`, writing into `out`.
    fn project_into(
        &self,
        from: Coordinate,
        bearing_deg: f64,
        distance_m: f64,
        out: &mut Coordinate,
    );

    /// Project `from` along `bearing_deg` for `distance_m`.
    fn project(&self, from: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
        let mut out = from;
        self.project_into(from, bearing_deg, distance_m, &mut out);
        out
    }
}

/// Great-circle geodesy on a spherical earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalEarth;

impl Geodesy for SphericalEarth {
    fn bearing(&self, from: Coordinate, to: Coordinate) -> f64 {
        coord::bearing_between(from, to)
    }

    fn project_into(
        &self,
        from: Coordinate,
        bearing_deg: f64,
        distance_m: f64,
        out: &mut Coordinate,
    ) {
        coord::project_into(from, bearing_deg, distance_m, out);
    }
}

/// Shared, lock-free connection flag.
#[derive(Debug, Clone, Default)]
pub struct SharedLink {
    alive: Arc<AtomicBool>,
}

impl SharedLink {
    /// Create a link cell with the given initial state.
    pub fn new(alive: bool) -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(alive)),
        }
    }

    /// Mark the link alive or dead.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }
}

impl VehicleLink for SharedLink {
    fn is_connection_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Shared, lock-free ground speed cell (stored as `f64` bits).
#[derive(Debug, Clone, Default)]
pub struct SharedGroundSpeed {
    bits: Arc<AtomicU64>,
}

impl SharedGroundSpeed {
    /// Create a speed cell with the given initial speed in m/s.
    pub fn new(meters_per_second: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(meters_per_second.to_bits())),
        }
    }

    /// Set the current ground speed in m/s.
    pub fn set(&self, meters_per_second: f64) {
        self.bits
            .store(meters_per_second.to_bits(), Ordering::Release);
    }
}

impl GroundSpeedSource for SharedGroundSpeed {
    fn current_ground_speed(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

// Allow Arc-wrapped collaborators to be passed directly
impl<T: VehicleLink + ?Sized> VehicleLink for Arc<T> {
    fn is_connection_alive(&self) -> bool {
        (**self).is_connection_alive()
    }
}

impl<T: GroundSpeedSource + ?Sized> GroundSpeedSource for Arc<T> {
    fn current_ground_speed(&self) -> f64 {
        (**self).current_ground_speed()
    }
}

//! Core state types for vehicle position tracking.
//!
//! - [`FixType`] - Sensor lock classification (No-fix / 2D / 3D)
//! - [`FixQuality`] - Horizontal error and satellite count
//! - [`ConnectionEvent`] - Link lifecycle input to the tracker
//! - [`TrackerEvent`] - Notifications emitted by the tracker
//! - [`TrackerStatus`] - Full snapshot for consumers

use std::time::Duration;

use crate::coord::Coordinate;

/// Numeric fix type reported by the sensor for a 2D lock.
pub const LOCK_2D: i32 = 2;

/// Numeric fix type reported by the sensor for a 3D lock.
pub const LOCK_3D: i32 = 3;

/// Sentinel for quality fields that have never been reported.
pub const UNKNOWN: i32 = -1;

/// Positioning sensor lock classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixType {
    /// No lock, or an unrecognized fix value.
    #[default]
    NoFix,
    /// Two-dimensional lock (no altitude).
    Lock2D,
    /// Three-dimensional lock.
    Lock3D,
}

impl FixType {
    /// Map the sensor's numeric fix type. Anything other than 2 or 3 is `NoFix`.
    pub fn from_numeric(fix_type: i32) -> Self {
        match fix_type {
            LOCK_2D => Self::Lock2D,
            LOCK_3D => Self::Lock3D,
            _ => Self::NoFix,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoFix => "NoFix",
            Self::Lock2D => "2D",
            Self::Lock3D => "3D",
        }
    }
}

impl std::fmt::Display for FixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Fix quality metadata. Both fields are `-1` until first reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixQuality {
    /// Estimated horizontal error in meters.
    pub horizontal_error_m: f64,
    /// Number of visible satellites.
    pub satellite_count: i32,
}

impl Default for FixQuality {
    fn default() -> Self {
        Self {
            horizontal_error_m: UNKNOWN as f64,
            satellite_count: UNKNOWN,
        }
    }
}

/// Connection lifecycle events consumed by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// First heartbeat after connecting.
    Established,
    /// Heartbeat resumed after a timeout.
    Restored,
    /// Heartbeat lost.
    TimedOut,
    /// Link closed.
    Disconnected,
}

impl ConnectionEvent {
    /// True for events that bring the link up.
    pub fn is_link_up(&self) -> bool {
        matches!(self, Self::Established | Self::Restored)
    }
}

impl std::fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Established => write!(f, "Established"),
            Self::Restored => write!(f, "Restored"),
            Self::TimedOut => write!(f, "TimedOut"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Notifications emitted by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerEvent {
    /// A new, distinct raw fix was recorded.
    PositionChanged,
    /// The interpolated position was invalidated and can be re-read.
    InterpolatedPositionAvailable,
    /// The visible satellite count changed.
    SatelliteCountChanged,
    /// The fix type changed.
    FixTypeChanged,
}

/// Complete tracker snapshot.
#[derive(Debug, Clone)]
pub struct TrackerStatus {
    /// Last raw fix, if any.
    pub position: Option<Coordinate>,

    /// Dead-reckoned estimate (raw fix while the link is down).
    pub interpolated: Option<Coordinate>,

    /// Bearing into the most recent raw fix, degrees.
    pub heading: f64,

    /// Time since the last raw fix was recorded.
    pub position_age: Duration,

    /// Lock classification.
    pub fix_type: FixType,

    /// Error and satellite count.
    pub quality: FixQuality,

    /// Whether the vehicle link reports alive.
    pub link_alive: bool,

    /// Whether the periodic invalidation task is running.
    pub interpolation_running: bool,
}

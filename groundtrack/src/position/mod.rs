//! Vehicle Position Tracking
//!
//! Tracks a vehicle's ground position as reported by an intermittent
//! positioning sensor, and estimates where the vehicle is *now* between
//! reports by dead reckoning along the last heading at the current ground
//! speed.
//!
//! # Architecture
//!
//! - The last raw fix, its timestamp, the heading into it, and fix quality
//!   are written by the telemetry ingestion path.
//! - The interpolated estimate is computed lazily and cached behind a stale
//!   flag.
//! - A periodic ticker (default 33ms) marks the cache stale and announces
//!   [`TrackerEvent::InterpolatedPositionAvailable`]. The ticker runs while
//!   the vehicle link is up and is stopped on timeout or disconnect.
//!
//! ```text
//! sensor ──update_position──▶ PositionTracker ◀──on_connection_event── link
//!                                  │   ▲
//!                 broadcast events │   │ stale flag
//!                                  ▼   │
//!                           subscribers  InterpolationTicker
//! ```
//!
//! # Components
//!
//! - [`state`] - `FixType`, `FixQuality`, `ConnectionEvent`, `TrackerEvent`, `TrackerStatus`
//! - [`provider`] - Collaborator traits: `VehicleLink`, `GroundSpeedSource`, `Geodesy`
//! - [`clock`] - `Clock` abstraction for fix timestamps
//! - [`interpolator`] - Stale flag and reusable estimate slot
//! - [`ticker`] - `InterpolationTicker` start/stop state machine
//! - [`tracker`] - `PositionTracker` and its builder
//! - [`listener`] - Channel-driven connection event intake
//! - [`logger`] - Periodic DEBUG status logging

pub mod clock;
pub mod interpolator;
mod listener;
mod logger;
pub mod provider;
pub mod state;
pub mod ticker;
mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use interpolator::InterpolationCache;
pub use listener::spawn_connection_listener;
pub use logger::spawn_status_logger;
pub use provider::{
    Geodesy, GroundSpeedSource, SharedGroundSpeed, SharedLink, SphericalEarth, VehicleLink,
};
pub use state::{ConnectionEvent, FixQuality, FixType, TrackerEvent, TrackerStatus};
pub use ticker::{InterpolationTicker, DEFAULT_INTERPOLATION_PERIOD};
pub use tracker::{PositionTracker, PositionTrackerBuilder, TrackerConfig};

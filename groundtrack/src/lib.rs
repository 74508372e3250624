//! groundtrack - Dead-reckoned vehicle position tracking
//!
//! This library tracks a vehicle's last reported positioning fix and
//! continuously estimates its current position between reports by
//! projecting along the last heading at the current ground speed.
//!
//! # High-Level API
//!
//! ```ignore
//! use groundtrack::coord::Coordinate;
//! use groundtrack::position::{ConnectionEvent, PositionTracker, SharedGroundSpeed, SharedLink};
//! use tokio::sync::broadcast;
//!
//! let link = SharedLink::new(true);
//! let speed = SharedGroundSpeed::new(4.0);
//! let (events, _) = broadcast::channel(64);
//! let tracker = PositionTracker::builder(link, speed, events).build();
//!
//! tracker.on_connection_event(ConnectionEvent::Established);
//! tracker.update_position(Coordinate::new(53.63, 9.99));
//! let estimate = tracker.interpolated_position();
//! ```

pub mod config;
pub mod coord;
pub mod logging;
pub mod position;

/// Version of the groundtrack library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

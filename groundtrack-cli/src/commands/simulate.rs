//! Simulated vehicle run.
//!
//! Drives a [`PositionTracker`] with a synthetic vehicle moving in a straight
//! line: raw fixes arrive at a fixed interval, the link can drop out for a
//! while, and the dead-reckoned estimate is printed against the true
//! position so drift between fixes is visible.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use groundtrack::config::ConfigFile;
use groundtrack::coord::{distance_m, project_position, Coordinate};
use groundtrack::position::{
    spawn_connection_listener, spawn_status_logger, ConnectionEvent, PositionTracker,
    SharedGroundSpeed, SharedLink, TrackerEvent,
};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Fix type reported by the simulated sensor (3D lock).
const SIMULATED_FIX_TYPE: i32 = 3;

/// Longest run accepted, in seconds (one week).
const MAX_DURATION_SECS: f64 = 7.0 * 24.0 * 3600.0;

/// Arguments for `groundtrack simulate`.
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Start latitude in decimal degrees
    #[arg(long, default_value = "53.630278", allow_hyphen_values = true)]
    pub lat: f64,

    /// Start longitude in decimal degrees
    #[arg(long, default_value = "9.988333", allow_hyphen_values = true)]
    pub lon: f64,

    /// Course over ground in degrees true
    #[arg(long, default_value = "90", allow_hyphen_values = true)]
    pub heading: f64,

    /// Ground speed in meters per second
    #[arg(long, default_value = "10")]
    pub speed: f64,

    /// Total run time in seconds
    #[arg(long, default_value = "10")]
    pub duration: f64,

    /// Interval between raw fixes in milliseconds
    #[arg(long, default_value = "1000")]
    pub fix_interval_ms: u64,

    /// Interval between printed estimates in milliseconds
    #[arg(long, default_value = "250")]
    pub print_interval_ms: u64,

    /// Drop the link this many seconds into the run
    #[arg(long)]
    pub dropout_at: Option<f64>,

    /// How long the link stays down, in seconds
    #[arg(long, default_value = "2")]
    pub dropout_secs: f64,

    /// Satellites reported with each fix
    #[arg(long, default_value = "10")]
    pub satellites: i32,

    /// Horizontal error reported with each fix, in centimeters
    #[arg(long, default_value = "150")]
    pub eph_cm: u32,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Mirror log output to stdout
    #[arg(long)]
    pub log_stdout: bool,
}

impl SimulateArgs {
    /// Reject arguments that cannot describe a run.
    pub fn validate(&self) -> Result<(), CliError> {
        if !Coordinate::new(self.lat, self.lon).is_valid() {
            return Err(CliError::InvalidArgument(format!(
                "start position ({}, {}) is outside valid latitude/longitude ranges",
                self.lat, self.lon
            )));
        }
        if !self.heading.is_finite() {
            return Err(CliError::InvalidArgument(
                "heading must be a finite number of degrees".to_string(),
            ));
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(CliError::InvalidArgument(
                "speed must be zero or positive".to_string(),
            ));
        }
        if !(self.duration > 0.0 && self.duration <= MAX_DURATION_SECS)
            || Duration::try_from_secs_f64(self.duration).is_err()
        {
            return Err(CliError::InvalidArgument(format!(
                "duration must be between 0 and {} seconds",
                MAX_DURATION_SECS
            )));
        }
        if self.fix_interval_ms == 0 || self.print_interval_ms == 0 {
            return Err(CliError::InvalidArgument(
                "intervals must be at least 1ms".to_string(),
            ));
        }
        if self.dropout_at.is_some_and(|at| !at.is_finite()) {
            return Err(CliError::InvalidArgument(
                "dropout-at must be a finite number of seconds".to_string(),
            ));
        }
        if !(self.dropout_secs.is_finite() && self.dropout_secs >= 0.0) {
            return Err(CliError::InvalidArgument(
                "dropout-secs must be zero or positive".to_string(),
            ));
        }
        Ok(())
    }

    fn start(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// True position `elapsed` seconds into the run.
    fn truth_at(&self, elapsed: f64) -> Coordinate {
        project_position(self.start(), self.heading, self.speed * elapsed)
    }

    /// Whether the link is down `elapsed` seconds into the run.
    fn in_dropout(&self, elapsed: f64) -> bool {
        match self.dropout_at {
            Some(at) => elapsed >= at && elapsed < at + self.dropout_secs,
            None => false,
        }
    }
}

/// Run the `simulate` command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    args.validate()?;

    let runner = CliRunner::new(args.debug, args.log_stdout)?;
    runner.log_startup("simulate");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let summary = runtime.block_on(simulate(&args, runner.config()));
    summary.print();
    Ok(())
}

/// Accumulated results of a run.
#[derive(Debug, Default)]
struct Summary {
    fixes_sent: u64,
    samples: u64,
    total_error_m: f64,
    max_error_m: f64,
    interpolation_ticks: u64,
    position_events: u64,
}

impl Summary {
    fn record_error(&mut self, error_m: f64) {
        self.samples += 1;
        self.total_error_m += error_m;
        self.max_error_m = self.max_error_m.max(error_m);
    }

    fn record_events(&mut self, rx: &mut broadcast::Receiver<TrackerEvent>) {
        loop {
            match rx.try_recv() {
                Ok(TrackerEvent::InterpolatedPositionAvailable) => self.interpolation_ticks += 1,
                Ok(TrackerEvent::PositionChanged) => self.position_events += 1,
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event receiver lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn mean_error_m(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_error_m / self.samples as f64
        }
    }

    fn print(&self) {
        println!();
        println!("Fixes sent:            {}", self.fixes_sent);
        println!("Position events:       {}", self.position_events);
        println!("Interpolation ticks:   {}", self.interpolation_ticks);
        println!("Mean estimate error:   {:.2} m", self.mean_error_m());
        println!("Max estimate error:    {:.2} m", self.max_error_m);
    }
}

async fn simulate(args: &SimulateArgs, config: &ConfigFile) -> Summary {
    let link = SharedLink::new(false);
    let speed = SharedGroundSpeed::new(args.speed);
    let (events_tx, mut events_rx) = broadcast::channel(config.tracker.event_channel_capacity);
    let (connection_tx, connection_rx) = broadcast::channel(8);
    let cancellation = CancellationToken::new();

    let tracker = Arc::new(
        PositionTracker::builder(link.clone(), speed, events_tx)
            .config(config.tracker_config())
            .build(),
    );

    let listener = spawn_connection_listener(
        Arc::clone(&tracker),
        connection_rx,
        cancellation.clone(),
    );
    let status_logger = config
        .status_log_interval()
        .filter(|_| tracing::enabled!(tracing::Level::DEBUG))
        .map(|every| spawn_status_logger(Arc::clone(&tracker), cancellation.clone(), every));

    link.set_alive(true);
    let _ = connection_tx.send(ConnectionEvent::Established);
    info!(start = %args.start(), heading = args.heading, speed = args.speed, "Simulation started");

    println!(
        "{:>7}  {:>22}  {:>22}  {:>8}  {:>4}",
        "t (s)", "raw fix", "estimate", "err (m)", "link"
    );

    let started = Instant::now();
    let deadline = started + Duration::from_secs_f64(args.duration);
    let mut fix_timer = interval(Duration::from_millis(args.fix_interval_ms));
    let mut print_timer = interval(Duration::from_millis(args.print_interval_ms));
    fix_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    print_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut summary = Summary::default();
    let mut link_down = false;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            _ = fix_timer.tick() => {
                let elapsed = started.elapsed().as_secs_f64();
                let dropout = args.in_dropout(elapsed);

                if dropout != link_down {
                    link_down = dropout;
                    link.set_alive(!dropout);
                    let event = if dropout {
                        ConnectionEvent::TimedOut
                    } else {
                        ConnectionEvent::Restored
                    };
                    info!(%event, elapsed = format!("{:.2}", elapsed), "Simulated link change");
                    let _ = connection_tx.send(event);
                }

                if !dropout {
                    tracker.update_fix_quality(SIMULATED_FIX_TYPE, args.satellites, args.eph_cm);
                    tracker.update_position(args.truth_at(elapsed));
                    summary.fixes_sent += 1;
                }
            }
            _ = print_timer.tick() => {
                let elapsed = started.elapsed().as_secs_f64();
                summary.record_events(&mut events_rx);
                print_row(&tracker, args.truth_at(elapsed), elapsed, &mut summary);
            }
        }
    }

    let _ = connection_tx.send(ConnectionEvent::Disconnected);
    summary.record_events(&mut events_rx);
    cancellation.cancel();

    let _ = listener.await;
    if let Some(handle) = status_logger {
        let _ = handle.await;
    }

    info!(fixes = summary.fixes_sent, "Simulation finished");
    summary
}

fn print_row(tracker: &PositionTracker, truth: Coordinate, elapsed: f64, summary: &mut Summary) {
    let status = tracker.status();

    let (Some(fix), Some(estimate)) = (status.position, status.interpolated) else {
        println!("{:>7.2}  {:>22}  {:>22}  {:>8}  {:>4}", elapsed, "-", "-", "-", "-");
        return;
    };

    let error_m = distance_m(estimate, truth);
    summary.record_error(error_m);

    println!(
        "{:>7.2}  {:>22}  {:>22}  {:>8.2}  {:>4}",
        elapsed,
        fix.to_string(),
        estimate.to_string(),
        error_m,
        if status.link_alive { "up" } else { "down" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SimulateArgs,
    }

    fn parse(argv: &[&str]) -> SimulateArgs {
        let mut full = vec!["test"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = parse(&[]);
        assert!(args.validate().is_ok());
        assert_eq!(args.fix_interval_ms, 1000);
        assert!(args.dropout_at.is_none());
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let args = parse(&["--lat", "-33.9", "--lon", "-151.2"]);
        assert_eq!(args.lat, -33.9);
        assert_eq!(args.lon, -151.2);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        assert!(parse(&["--lat", "95"]).validate().is_err());
        assert!(parse(&["--speed", "-1"]).validate().is_err());
        assert!(parse(&["--duration", "0"]).validate().is_err());
        assert!(parse(&["--fix-interval-ms", "0"]).validate().is_err());
    }

    #[test]
    fn test_non_finite_arguments_rejected() {
        assert!(parse(&["--heading", "NaN"]).validate().is_err());
        assert!(parse(&["--heading", "inf"]).validate().is_err());
        assert!(parse(&["--duration", "inf"]).validate().is_err());
        assert!(parse(&["--duration", "1e30"]).validate().is_err());
        assert!(parse(&["--duration", "NaN"]).validate().is_err());
        assert!(parse(&["--duration", "1e15"]).validate().is_err());
        assert!(parse(&["--speed", "inf"]).validate().is_err());
        assert!(parse(&["--dropout-at", "NaN"]).validate().is_err());
    }

    #[test]
    fn test_long_finite_duration_accepted() {
        let args = parse(&["--duration", "86400", "--heading", "-45"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_truth_moves_along_heading() {
        let args = parse(&["--heading", "0", "--speed", "5"]);
        let truth = args.truth_at(2.0);

        assert!((distance_m(args.start(), truth) - 10.0).abs() < 1e-6);
        assert!(truth.latitude > args.lat);
    }

    #[test]
    fn test_dropout_window() {
        let args = parse(&["--dropout-at", "3", "--dropout-secs", "2"]);

        assert!(!args.in_dropout(2.9));
        assert!(args.in_dropout(3.0));
        assert!(args.in_dropout(4.9));
        assert!(!args.in_dropout(5.0));
    }

    #[test]
    fn test_summary_mean_error() {
        let mut summary = Summary::default();
        assert_eq!(summary.mean_error_m(), 0.0);

        summary.record_error(1.0);
        summary.record_error(3.0);
        assert_eq!(summary.mean_error_m(), 2.0);
        assert_eq!(summary.max_error_m, 3.0);
    }
}

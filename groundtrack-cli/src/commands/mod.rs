//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, path, show)
//! - [`simulate`] - Drive the tracker with a synthetic vehicle

pub mod config;
pub mod simulate;

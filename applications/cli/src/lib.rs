//! Tempo command-line front end
//!
//! Library half of the `tempo` binary: configuration loading, logging setup
//! and the dry-run player engine.

pub mod config;
pub mod dry_run;
pub mod logging;

//! # Orrery
//!
//! Command-line front end for `orrery-core`: inspect, check, convert and
//! merge graph files. The library target exposes the command layer so it
//! can be driven from tests.

pub mod cli;
pub mod error;

pub use error::CliError;

//! `school-disruption` library crate.
//!
//! The binary (`sdb`) is a thin wrapper around this library so that:
//!
//! - the fetch / normalize / fallback pipeline is testable without spawning processes
//! - loaders and analysis helpers are reusable by other front ends
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;

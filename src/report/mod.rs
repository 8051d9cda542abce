//! Reporting utilities: formatted terminal output for both views.

pub mod format;

pub use format::*;

//! Input/output helpers.
//!
//! - CSV artifacts for series and sites, plus series re-import (`export`)

pub mod export;

pub use export::*;

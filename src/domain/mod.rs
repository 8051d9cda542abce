//! Domain types shared by the loader, analysis, and export code.
//!
//! This module defines:
//!
//! - date-or-year values with loose parsing (`RecordDate`)
//! - the normalized `(date, value, group?, note?)` table (`NormalizedSeries`)
//! - named map points for the damage map (`SiteTable`)

pub mod date;
pub mod types;

pub use date::*;
pub use types::*;

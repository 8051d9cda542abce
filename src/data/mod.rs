//! Dataset acquisition.
//!
//! - `transport`: the HTTP seam (`reqwest` blocking client, offline stub)
//! - `normalize`: response body → normalized tables
//! - `cutoff`: the UTC+9 "no future data" filter
//! - `cache`: caller-owned TTL memoization
//! - `loader`: fetch → normalize → fallback
//! - `catalog`: known sources, fallback tables, and the user-report rows

pub mod cache;
pub mod catalog;
pub mod cutoff;
pub mod loader;
pub mod normalize;
pub mod transport;

pub use cache::{DatasetCache, SourceKey};
pub use catalog::{Endpoints, PublicBundle, PublicCaches, load_public_bundle};
pub use cutoff::{Cutoff, reference_offset};
pub use loader::{Dataset, DatasetLoader, LoadOutcome, Loaded, LoaderConfig, SourceDescriptor};
pub use normalize::{GeoRule, SeriesRule};
pub use transport::{HttpResponse, HttpTransport, OfflineTransport, Transport};

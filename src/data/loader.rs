//! Fetch → normalize → fallback.
//!
//! `DatasetLoader::load` never fails: whatever goes wrong with the remote
//! source, the caller gets a usable table and a `LoadOutcome` saying which
//! path was taken. Exactly one request is made per uncached load.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::data::cache::{DatasetCache, SourceKey};
use crate::data::cutoff::{Cutoff, reference_offset};
use crate::data::normalize::{GeoRule, SeriesRule, parse_series, parse_sites};
use crate::data::transport::Transport;
use crate::domain::{NormalizedSeries, SiteTable};
use crate::error::FailureReason;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A table shape the loader can produce.
pub trait Dataset: Clone + Debug {
    /// Per-source description of the response layout.
    type Rule: Clone + Debug;

    fn normalize(body: &str, rule: &Self::Rule, offset: FixedOffset) -> Result<Self, FailureReason>;

    fn apply_cutoff(self, cutoff: &Cutoff) -> Self;

    fn row_count(&self) -> usize;
}

impl Dataset for NormalizedSeries {
    type Rule = SeriesRule;

    fn normalize(body: &str, rule: &SeriesRule, offset: FixedOffset) -> Result<Self, FailureReason> {
        parse_series(body, rule, offset)
    }

    fn apply_cutoff(self, cutoff: &Cutoff) -> Self {
        cutoff.apply(self)
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

impl Dataset for SiteTable {
    type Rule = GeoRule;

    fn normalize(body: &str, rule: &GeoRule, _offset: FixedOffset) -> Result<Self, FailureReason> {
        parse_sites(body, rule)
    }

    // Sites carry no date.
    fn apply_cutoff(self, _cutoff: &Cutoff) -> Self {
        self
    }

    fn row_count(&self) -> usize {
        self.len()
    }
}

/// One remote source plus the literal table that replaces it on failure.
#[derive(Debug, Clone)]
pub struct SourceDescriptor<D: Dataset> {
    /// Stable identifier (cache key component).
    pub id: String,
    /// Display name used in status messages.
    pub label: String,
    pub url: String,
    pub rule: D::Rule,
    pub fallback: D,
}

impl<D: Dataset> SourceDescriptor<D> {
    pub fn key(&self) -> SourceKey {
        SourceKey::new(&self.id, &self.url)
    }
}

/// Loader-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub timeout: Duration,
    /// Offset whose midnight defines the "future data" cutoff.
    pub reference_offset: FixedOffset,
    /// Memoization window for loaded datasets; `None` keeps entries forever.
    pub cache_ttl: Option<Duration>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            reference_offset: reference_offset(),
            cache_ttl: Some(DEFAULT_CACHE_TTL),
        }
    }
}

/// Which path a load took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Success { source: String },
    FallbackSubstituted { source: String, reason: FailureReason },
}

impl LoadOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, LoadOutcome::FallbackSubstituted { .. })
    }

    /// Banner text shown to the user.
    pub fn message(&self) -> String {
        match self {
            LoadOutcome::Success { source } => format!("{source} 데이터 로드 성공"),
            LoadOutcome::FallbackSubstituted { source, reason } => {
                format!("{source} 호출 실패: 내부 예시 데이터로 대체 ({reason})")
            }
        }
    }
}

/// A loaded table and how it was obtained.
#[derive(Debug, Clone)]
pub struct Loaded<D> {
    pub data: D,
    pub outcome: LoadOutcome,
}

pub struct DatasetLoader<T> {
    transport: T,
    config: LoaderConfig,
}

impl<T: Transport> DatasetLoader<T> {
    pub fn new(transport: T, config: LoaderConfig) -> Self {
        Self { transport, config }
    }

    /// Load `source`, reusing `cache` when it holds a live entry.
    pub fn load<D: Dataset>(&self, source: &SourceDescriptor<D>, cache: &mut DatasetCache<D>) -> Loaded<D> {
        self.load_at(source, cache, Utc::now(), Instant::now())
    }

    /// `load` with explicit clocks: `now` drives the cutoff, `at` drives cache expiry.
    pub fn load_at<D: Dataset>(
        &self,
        source: &SourceDescriptor<D>,
        cache: &mut DatasetCache<D>,
        now: DateTime<Utc>,
        at: Instant,
    ) -> Loaded<D> {
        let key = source.key();
        if let Some(hit) = cache.get(&key, at) {
            debug!(source = %source.id, "dataset cache hit");
            return hit.clone();
        }

        let purged = cache.purge_expired(at);
        if purged > 0 {
            debug!(purged, "expired dataset cache entries dropped");
        }

        let loaded = self.load_uncached(source, now);
        cache.insert(key, loaded.clone(), at);
        loaded
    }

    /// One fetch attempt, no cache involvement.
    pub fn load_uncached<D: Dataset>(&self, source: &SourceDescriptor<D>, now: DateTime<Utc>) -> Loaded<D> {
        let cutoff = Cutoff::at(now, self.config.reference_offset);

        let (data, outcome) = match self.fetch(source) {
            Ok(data) => {
                info!(source = %source.id, rows = data.row_count(), "remote dataset loaded");
                (
                    data,
                    LoadOutcome::Success {
                        source: source.label.clone(),
                    },
                )
            }
            Err(reason) => {
                warn!(source = %source.id, url = %source.url, %reason, "remote dataset unavailable, using fallback");
                (
                    source.fallback.clone(),
                    LoadOutcome::FallbackSubstituted {
                        source: source.label.clone(),
                        reason,
                    },
                )
            }
        };

        Loaded {
            data: data.apply_cutoff(&cutoff),
            outcome,
        }
    }

    fn fetch<D: Dataset>(&self, source: &SourceDescriptor<D>) -> Result<D, FailureReason> {
        let resp = self.transport.get(&source.url, self.config.timeout)?;
        if !resp.is_success() {
            return Err(FailureReason::Status(resp.status));
        }
        D::normalize(&resp.body, &source.rule, self.config.reference_offset)
    }
}

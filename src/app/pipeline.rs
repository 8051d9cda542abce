//! Shared view-building logic for the two dashboards.
//!
//! Loading and shaping live here; `app` and `report` only present the
//! results.
//!
//! public: load sources → range filter → optional smoothing → period totals
//! user:   hardcoded reports → cutoff → group/range filter → totals → region map

use chrono::{DateTime, NaiveDate, Utc};

use crate::analysis::{
    GroupTotal, Period, aggregate, distinct_groups, filter_series, region_sites, smooth, sort_by_date, sum_by_date, totals_by_group,
};
use crate::data::catalog::{REGION_COORDINATES, user_reports};
use crate::data::{Cutoff, DatasetLoader, Endpoints, PublicBundle, PublicCaches, Transport, load_public_bundle};
use crate::domain::{NormalizedSeries, SiteTable};

#[derive(Debug, Clone)]
pub struct PublicViewOptions {
    pub period: Period,
    /// Moving-average window for the precipitation series; 1 disables smoothing.
    pub window: usize,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Default for PublicViewOptions {
    fn default() -> Self {
        Self {
            period: Period::Month,
            window: 1,
            from: None,
            to: None,
        }
    }
}

/// Computed outputs of the public-data view.
#[derive(Debug, Clone)]
pub struct PublicView {
    pub bundle: PublicBundle,
    /// Precipitation rows inside the requested range, sorted by date.
    pub precip: NormalizedSeries,
    pub precip_smoothed: Option<NormalizedSeries>,
    pub period: Period,
    pub school_totals: NormalizedSeries,
}

pub fn build_public_view<T: Transport>(
    loader: &DatasetLoader<T>,
    endpoints: &Endpoints,
    caches: &mut PublicCaches,
    options: &PublicViewOptions,
    now: DateTime<Utc>,
) -> PublicView {
    let bundle = load_public_bundle(loader, endpoints, caches, now);

    let precip = sort_by_date(&filter_series(&bundle.precip.data, options.from, options.to, &[]));
    let precip_smoothed = (options.window > 1).then(|| smooth(&precip, options.window));
    let school_totals = aggregate(&bundle.school_actions.data, options.period);

    PublicView {
        bundle,
        precip,
        precip_smoothed,
        period: options.period,
        school_totals,
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserViewOptions {
    /// Groups to keep; empty keeps all.
    pub groups: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Computed outputs of the user-data view.
#[derive(Debug, Clone)]
pub struct UserView {
    pub reports: NormalizedSeries,
    /// Sorted group labels present in the reports.
    pub groups: Vec<String>,
    /// Requested groups that match no report.
    pub unknown_groups: Vec<String>,
    pub filtered: NormalizedSeries,
    pub by_date: NormalizedSeries,
    pub by_group: Vec<GroupTotal>,
    /// Region map points, built from the unfiltered reports.
    pub regions: SiteTable,
}

pub fn build_user_view(cutoff: &Cutoff, options: &UserViewOptions) -> UserView {
    let reports = user_reports(cutoff);
    let groups = distinct_groups(&reports);
    let unknown_groups: Vec<String> = options
        .groups
        .iter()
        .filter(|want| !groups.contains(*want))
        .cloned()
        .collect();
    let filtered = filter_series(&reports, options.from, options.to, &options.groups);
    let by_date = sum_by_date(&filtered);
    let by_group = totals_by_group(&filtered);
    let regions = region_sites(&reports, &REGION_COORDINATES);

    UserView {
        reports,
        groups,
        unknown_groups,
        filtered,
        by_date,
        by_group,
        regions,
    }
}

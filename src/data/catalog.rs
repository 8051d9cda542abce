//! Known sources and their literal fallback tables.
//!
//! Public sources (sample endpoints; swap in real dataset URLs via config):
//!   NASA GPM precipitation: https://gpm.nasa.gov/
//!   NOAA: https://www.ncei.noaa.gov/  KMA: https://www.kma.go.kr/
//! User-report rows are transcribed from news coverage:
//!   https://www.hani.co.kr/arti/society/schooling/1208715.html
//!   https://www.newsis.com/view/?id=NISX20230716_0002378455
//!   https://www.kado.net/news/articleView.html?idxno=1198111

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::cache::DatasetCache;
use crate::data::cutoff::Cutoff;
use crate::data::loader::{DatasetLoader, Loaded, SourceDescriptor};
use crate::data::normalize::{GeoRule, SeriesRule};
use crate::data::transport::Transport;
use crate::domain::{NormalizedSeries, Record, RecordDate, Site, SiteTable};

pub const PRECIP_URL: &str = "https://data.nasa.gov/resource/example_gpm_monthly_precip.json";
pub const SCHOOL_ACTIONS_URL: &str = "https://api.moe.go.kr/school-actions/example_school_actions.csv";
pub const GEO_URL: &str = "https://data.kostat.go.kr/example/school_damage_geo.geojson";

/// Seed for the precipitation fallback so the "random" table is a fixed literal.
const PRECIP_FALLBACK_SEED: u64 = 2015;

/// Endpoint URLs for the public sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub precip: String,
    pub school_actions: String,
    pub geo: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            precip: PRECIP_URL.to_string(),
            school_actions: SCHOOL_ACTIONS_URL.to_string(),
            geo: GEO_URL.to_string(),
        }
    }
}

pub fn precip_source(url: &str) -> SourceDescriptor<NormalizedSeries> {
    SourceDescriptor {
        id: "precip_ts".to_string(),
        label: "NASA GPM 강수".to_string(),
        url: url.to_string(),
        rule: SeriesRule::json("date", &["precip", "value"]),
        fallback: precip_fallback(),
    }
}

pub fn school_actions_source(url: &str) -> SourceDescriptor<NormalizedSeries> {
    SourceDescriptor {
        id: "school_actions".to_string(),
        label: "교육부 학교조치".to_string(),
        url: url.to_string(),
        rule: SeriesRule::Csv,
        fallback: school_actions_fallback(),
    }
}

pub fn damage_sites_source(url: &str) -> SourceDescriptor<SiteTable> {
    SourceDescriptor {
        id: "school_damage_geo".to_string(),
        label: "학교 피해 지리".to_string(),
        url: url.to_string(),
        rule: GeoRule::default(),
        fallback: damage_sites_fallback(),
    }
}

/// Yearly precipitation index 2015–2025 with a built-in upward drift.
pub fn precip_fallback() -> NormalizedSeries {
    let mut rng = StdRng::seed_from_u64(PRECIP_FALLBACK_SEED);
    (2015..=2025)
        .enumerate()
        .map(|(i, year)| {
            let base: f64 = rng.gen_range(20.0..80.0);
            Record::new(RecordDate::Year(year), base + 3.0 * i as f64)
        })
        .collect()
}

pub fn school_actions_fallback() -> NormalizedSeries {
    [
        ((2023, 7, 16), 24.0),
        ((2023, 8, 10), 5.0),
        ((2024, 7, 20), 40.0),
        ((2025, 7, 18), 247.0),
        ((2025, 3, 19), 12.0),
    ]
    .into_iter()
    .filter_map(|((y, m, d), value)| NaiveDate::from_ymd_opt(y, m, d).map(|day| Record::new(day, value)))
    .collect()
}

pub fn damage_sites_fallback() -> SiteTable {
    [
        ("청주 지역학교", 36.642, 127.489, 11.0),
        ("진천 학교", 36.873, 127.327, 3.0),
        ("옥천 학교", 36.305, 127.654, 2.0),
        ("영동 학교", 36.118, 127.761, 2.0),
        ("괴산 학교", 36.606, 127.957, 2.0),
    ]
    .into_iter()
    .map(|(name, lat, lon, value)| Site {
        name: name.to_string(),
        lat,
        lon,
        value,
    })
    .collect()
}

const ACTION_GROUP: &str = "휴업/원격/조치";

/// News-derived rows for the user-data view, before the cutoff is applied.
pub fn user_reports_table() -> NormalizedSeries {
    let rows: [((i32, u32, u32), f64, &str, &str); 11] = [
        ((2023, 7, 16), 24.0, ACTION_GROUP, "2023년 7월 집중호우(뉴스)"),
        ((2023, 8, 9), 5.0, ACTION_GROUP, "태풍 카눈(강원도)"),
        ((2025, 7, 18), 247.0, "학사일정 조정", "2025-07 전국 폭우(한겨레 기사)"),
        ((2025, 3, 19), 12.0, ACTION_GROUP, "2025-03 강원도 폭설(EBS)"),
        ((2023, 7, 16), 11.0, "청주 피해 학교", "충북 청주 피해 학교수"),
        ((2023, 7, 16), 3.0, "진천 피해 학교", "충북 진천"),
        ((2023, 7, 16), 2.0, "옥천 피해 학교", "충북 옥천"),
        ((2023, 7, 16), 2.0, "영동 피해 학교", "충북 영동"),
        ((2023, 7, 16), 2.0, "괴산 피해 학교", "충북 괴산"),
        ((2023, 7, 16), 1.0, "제천 피해 학교", "충북 제천"),
        ((2023, 7, 16), 1.0, "보은 피해 학교", "충북 보은"),
    ];

    rows.into_iter()
        .filter_map(|((y, m, d), value, group, note)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|day| Record::new(day, value).with_group(group).with_note(note))
        })
        .collect()
}

/// User-data view rows with future records removed.
pub fn user_reports(cutoff: &Cutoff) -> NormalizedSeries {
    cutoff.apply(user_reports_table())
}

/// Approximate coordinates for the region groups in the user reports.
pub const REGION_COORDINATES: [(&str, f64, f64); 7] = [
    ("청주 피해 학교", 36.642, 127.489),
    ("진천 피해 학교", 36.873, 127.327),
    ("옥천 피해 학교", 36.305, 127.654),
    ("영동 피해 학교", 36.118, 127.761),
    ("괴산 피해 학교", 36.606, 127.957),
    ("제천 피해 학교", 37.128, 128.194),
    ("보은 피해 학교", 36.487, 127.721),
];

/// Caches for the public view, one per table shape.
#[derive(Debug)]
pub struct PublicCaches {
    pub series: DatasetCache<NormalizedSeries>,
    pub sites: DatasetCache<SiteTable>,
}

impl PublicCaches {
    pub fn new(ttl: Option<std::time::Duration>) -> Self {
        Self {
            series: DatasetCache::new(ttl),
            sites: DatasetCache::new(ttl),
        }
    }
}

/// Everything the public view shows.
#[derive(Debug, Clone)]
pub struct PublicBundle {
    pub precip: Loaded<NormalizedSeries>,
    pub school_actions: Loaded<NormalizedSeries>,
    pub sites: Loaded<SiteTable>,
}

impl PublicBundle {
    /// Status banners in load order.
    pub fn messages(&self) -> Vec<String> {
        vec![
            self.precip.outcome.message(),
            self.school_actions.outcome.message(),
            self.sites.outcome.message(),
        ]
    }

    pub fn fallback_count(&self) -> usize {
        [
            self.precip.outcome.is_fallback(),
            self.school_actions.outcome.is_fallback(),
            self.sites.outcome.is_fallback(),
        ]
        .into_iter()
        .filter(|&fell_back| fell_back)
        .count()
    }
}

/// Load the three public datasets; `now` drives the cutoff.
pub fn load_public_bundle<T: Transport>(
    loader: &DatasetLoader<T>,
    endpoints: &Endpoints,
    caches: &mut PublicCaches,
    now: DateTime<Utc>,
) -> PublicBundle {
    let at = Instant::now();
    PublicBundle {
        precip: loader.load_at(&precip_source(&endpoints.precip), &mut caches.series, now, at),
        school_actions: loader.load_at(
            &school_actions_source(&endpoints.school_actions),
            &mut caches.series,
            now,
            at,
        ),
        sites: loader.load_at(&damage_sites_source(&endpoints.geo), &mut caches.sites, now, at),
    }
}

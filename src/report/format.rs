//! Terminal output for the two views.
//!
//! Formatting lives here so the pipeline stays free of presentation and
//! output changes stay local.

use crate::analysis::{GroupTotal, date_bounds};
use crate::app::pipeline::{PublicView, UserView};
use crate::domain::{NormalizedSeries, SiteTable};

/// Integral values print without decimals (counts); others with two.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// One `[안내]` line per status message.
pub fn format_banners(messages: &[String]) -> String {
    let mut out = String::new();
    for m in messages {
        out.push_str(&format!("[안내] {m}\n"));
    }
    out
}

/// Up to `limit` rows of a series as an aligned table.
pub fn format_series_table(series: &NormalizedSeries, limit: usize) -> String {
    if series.is_empty() {
        return "  (데이터 없음)\n".to_string();
    }

    let with_group = series.has_groups();
    let with_note = series.has_notes();

    let mut out = String::new();
    out.push_str(&format!("  {:<19} {:>10}", "날짜", "값"));
    if with_group {
        out.push_str("  그룹");
    }
    out.push('\n');

    for r in series.iter().take(limit) {
        out.push_str(&format!("  {:<19} {:>10}", r.date.to_string(), format_value(r.value)));
        if with_group {
            out.push_str(&format!("  {}", r.group.as_deref().unwrap_or("-")));
        }
        if with_note {
            if let Some(note) = &r.note {
                out.push_str(&format!("  ({note})"));
            }
        }
        out.push('\n');
    }
    if series.len() > limit {
        out.push_str(&format!("  ... {} more rows\n", series.len() - limit));
    }
    out
}

pub fn format_group_totals(totals: &[GroupTotal]) -> String {
    if totals.is_empty() {
        return "  그룹별 데이터 없음\n".to_string();
    }
    let sum: f64 = totals.iter().map(|t| t.value).sum();
    let mut out = String::new();
    for t in totals {
        let share = if sum > 0.0 { t.value / sum * 100.0 } else { 0.0 };
        out.push_str(&format!("  {:<16} {:>8}  {:>5.1}%\n", t.group, format_value(t.value), share));
    }
    out
}

pub fn format_sites(table: &SiteTable) -> String {
    if table.is_empty() {
        return "  지역 좌표 매핑 가능한 항목이 없습니다.\n".to_string();
    }
    let mut out = String::new();
    for s in table.sites() {
        out.push_str(&format!(
            "  {:<16} lat={:>8.3} lon={:>8.3}  {}\n",
            s.name,
            s.lat,
            s.lon,
            format_value(s.value)
        ));
    }
    if let Some((lat, lon)) = table.midpoint() {
        out.push_str(&format!("  center: {lat:.3}, {lon:.3}\n"));
    }
    out
}

pub fn format_public_view(view: &PublicView, preview: usize) -> String {
    let mut out = String::new();
    out.push_str("=== 공개 데이터 대시보드 ===\n");
    out.push_str(&format_banners(&view.bundle.messages()));

    out.push_str("\n강수 지표");
    if let Some((min, max)) = date_bounds(&view.precip) {
        out.push_str(&format!(" ({min} ~ {max})"));
    }
    out.push('\n');
    match &view.precip_smoothed {
        Some(smoothed) => {
            out.push_str("  이동평균 적용\n");
            out.push_str(&format_series_table(smoothed, preview));
        }
        None => out.push_str(&format_series_table(&view.precip, preview)),
    }

    out.push_str(&format!("\n학교 조치 건수 ({})\n", view.period.label()));
    out.push_str(&format_series_table(&view.school_totals, preview));

    out.push_str("\n학교 피해 위치\n");
    out.push_str(&format_sites(&view.bundle.sites.data));
    out
}

pub fn format_user_view(view: &UserView, preview: usize) -> String {
    let mut out = String::new();
    out.push_str("=== 사용자 입력 대시보드 ===\n");
    out.push_str(&format!("그룹 목록: {}\n", view.groups.join(", ")));
    if !view.unknown_groups.is_empty() {
        out.push_str(&format!("[안내] 데이터에 없는 그룹: {}\n", view.unknown_groups.join(", ")));
    }
    out.push_str(&format!("표준화 데이터: {} rows\n", view.reports.len()));
    out.push_str(&format_series_table(&view.filtered, preview));

    out.push_str("\n날짜별 합계\n");
    if view.by_date.is_empty() {
        out.push_str("  선택된 조건의 데이터가 없습니다.\n");
    } else {
        out.push_str(&format_series_table(&view.by_date, preview));
    }

    out.push_str("\n그룹별 합계\n");
    out.push_str(&format_group_totals(&view.by_group));

    out.push_str("\n지역별 피해\n");
    out.push_str(&format_sites(&view.regions));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::analysis::totals_by_group;
    use crate::data::catalog::{damage_sites_fallback, user_reports_table};
    use crate::domain::Record;

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(247.0), "247");
        assert_eq!(format_value(41.256), "41.26");
    }

    #[test]
    fn banners_one_per_line() {
        let text = format_banners(&["a 데이터 로드 성공".to_string(), "b 호출 실패".to_string()]);
        assert_eq!(text, "[안내] a 데이터 로드 성공\n[안내] b 호출 실패\n");
    }

    #[test]
    fn series_table_truncates() {
        let day = NaiveDate::from_ymd_opt(2023, 7, 16).unwrap();
        let series: NormalizedSeries = (0..5).map(|i| Record::new(day, i as f64)).collect();
        let text = format_series_table(&series, 2);
        assert_eq!(text.lines().count(), 4);
        assert!(text.ends_with("... 3 more rows\n"));
    }

    #[test]
    fn group_totals_lead_with_largest() {
        let text = format_group_totals(&totals_by_group(&user_reports_table()));
        assert!(text.starts_with("  학사일정 조정"));
        assert!(text.contains("247"));
    }

    #[test]
    fn user_view_lists_groups_and_flags_unknown_ones() {
        use crate::app::pipeline::{UserViewOptions, build_user_view};
        use crate::data::Cutoff;

        let options = UserViewOptions {
            groups: vec!["없는 그룹".to_string()],
            ..UserViewOptions::default()
        };
        let view = build_user_view(&Cutoff::from_day(NaiveDate::from_ymd_opt(2025, 7, 18).unwrap()), &options);
        let text = format_user_view(&view, 5);

        assert!(text.contains("그룹 목록: "));
        assert!(text.contains("진천 피해 학교"));
        assert!(text.contains("[안내] 데이터에 없는 그룹: 없는 그룹"));
    }

    #[test]
    fn sites_include_center() {
        let text = format_sites(&damage_sites_fallback());
        assert!(text.contains("청주 지역학교"));
        assert!(text.contains("center:"));
    }
}

use std::collections::HashMap;

use crate::health;
use crate::models::{DashboardCompanyView, DisplayPeriod, MetricCell, MonthlyRecord, MISSING_CODE};
use crate::periods::{previous_month, trailing_months};

/// Months shown before the selected one in the dashboard grid.
pub const DISPLAY_LOOKBACK: u32 = 2;

/// One company's records, ordered by (year, month).
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyHistory {
    pub name: String,
    pub code: String,
    pub records: Vec<MonthlyRecord>,
}

impl CompanyHistory {
    pub fn record_at(&self, year: i32, month: u32) -> Option<&MonthlyRecord> {
        self.records.iter().find(|r| r.is_at(year, month))
    }

    /// Like [`record_at`](Self::record_at) but falls back to a zero record.
    pub fn record_or_empty(&self, year: i32, month: u32) -> MonthlyRecord {
        self.record_at(year, month)
            .cloned()
            .unwrap_or_else(|| MonthlyRecord::empty(&self.name, year, month))
    }
}

/// Groups records by company name in first-seen order.
///
/// The code comes from the company's first record only; if that record has
/// no code the company shows the placeholder.
pub fn group_by_company(records: &[MonthlyRecord]) -> Vec<CompanyHistory> {
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut companies: Vec<CompanyHistory> = Vec::new();

    for record in records {
        let idx = *order.entry(record.company_name.as_str()).or_insert_with(|| {
            companies.push(CompanyHistory {
                name: record.company_name.clone(),
                code: record
                    .company_code
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| MISSING_CODE.to_string()),
                records: Vec::new(),
            });
            companies.len() - 1
        });

        companies[idx].records.push(record.clone());
    }

    for company in &mut companies {
        company.records.sort_by_key(MonthlyRecord::period_key);
    }

    companies
}

/// Months of the trailing window ending at (year, month) that have at least
/// one record from any company.
pub fn populated_window(records: &[MonthlyRecord], year: i32, month: u32) -> Vec<DisplayPeriod> {
    trailing_months(year, month, DISPLAY_LOOKBACK)
        .into_iter()
        .filter(|p| records.iter().any(|r| r.is_at(p.year, p.month)))
        .map(|p| p.to_display())
        .collect()
}

fn build_cell(history: &CompanyHistory, period: &DisplayPeriod) -> MetricCell {
    let (prev_year, prev_month) = previous_month(period.year, period.month);
    let current = history.record_or_empty(period.year, period.month);
    let previous = history.record_or_empty(prev_year, prev_month);

    let current_score = health::score(&history.records, period.year, period.month);
    let previous_score = health::score(&history.records, prev_year, prev_month);

    MetricCell {
        period: period.clone(),
        scale: [previous.total_schedule_changes, current.total_schedule_changes],
        trips: [previous.total_trips, current.total_trips],
        crew: [previous.total_crew, current.total_crew],
        vehicles: [previous.total_vehicles, current.total_vehicles],
        usage: [previous_score, current_score],
    }
}

/// Builds the per-company dashboard grid for the selected month.
///
/// Returns an empty list when no month of the window has data.
pub fn build_view(records: &[MonthlyRecord], year: i32, month: u32) -> Vec<DashboardCompanyView> {
    if records.is_empty() {
        return Vec::new();
    }

    let display_periods = populated_window(records, year, month);
    if display_periods.is_empty() {
        return Vec::new();
    }

    group_by_company(records)
        .into_iter()
        .map(|history| {
            let metrics = display_periods
                .iter()
                .map(|period| build_cell(&history, period))
                .collect();

            DashboardCompanyView {
                name: history.name,
                code: history.code,
                history: history.records,
                display_periods: display_periods.clone(),
                metrics,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthScore;

    fn rec(company: &str, code: Option<&str>, year: i32, month: u32, trips: u64) -> MonthlyRecord {
        MonthlyRecord {
            company_name: company.to_string(),
            company_code: code.map(str::to_string),
            year,
            month,
            total_trips: trips,
            total_vehicles: trips / 10,
            total_crew: trips / 5,
            total_schedule_changes: 0,
        }
    }

    fn sample() -> Vec<MonthlyRecord> {
        vec![
            rec("VIOP", Some("1"), 2025, 10, 100),
            rec("UNESUL", None, 2025, 10, 0),
            rec("VIOP", Some("1"), 2025, 11, 120),
            rec("UNESUL", Some("3"), 2025, 11, 0),
            rec("VIOP", Some("1"), 2025, 12, 90),
            rec("UNESUL", Some("3"), 2025, 12, 40),
        ]
    }

    #[test]
    fn empty_records_yield_empty_view() {
        assert!(build_view(&[], 2025, 12).is_empty());
    }

    #[test]
    fn window_without_data_yields_empty_view() {
        assert!(build_view(&sample(), 2024, 3).is_empty());
    }

    #[test]
    fn window_keeps_only_populated_months() {
        let records = vec![rec("VIOP", None, 2025, 10, 10), rec("VIOP", None, 2025, 12, 10)];
        let periods = populated_window(&records, 2025, 12);
        let keys: Vec<(i32, u32)> = periods.iter().map(|p| (p.year, p.month)).collect();
        assert_eq!(keys, vec![(2025, 10), (2025, 12)]);
    }

    #[test]
    fn window_wraps_into_previous_year() {
        let records = vec![rec("VIOP", None, 2025, 11, 10), rec("VIOP", None, 2026, 1, 10)];
        let labels: Vec<String> = populated_window(&records, 2026, 1)
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(labels, vec!["Nov", "Jan"]);
    }

    #[test]
    fn groups_in_first_seen_order_with_first_code() {
        let companies = group_by_company(&sample());
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].name, "VIOP");
        assert_eq!(companies[0].code, "1");
        // later rows never replace the code decided by the first one
        assert_eq!(companies[1].code, MISSING_CODE);
        assert_eq!(companies[1].records.len(), 3);
    }

    #[test]
    fn code_from_later_row_is_ignored_in_view() {
        let records = vec![
            rec("UNESUL", None, 2025, 10, 5),
            rec("UNESUL", Some("3"), 2025, 11, 5),
        ];
        let view = build_view(&records, 2025, 11);
        assert_eq!(view[0].code, MISSING_CODE);
    }

    #[test]
    fn missing_code_uses_placeholder() {
        let companies = group_by_company(&[rec("PLANALTO", None, 2025, 1, 1)]);
        assert_eq!(companies[0].code, MISSING_CODE);
    }

    #[test]
    fn history_is_sorted_chronologically() {
        let records = vec![
            rec("VIOP", None, 2026, 1, 1),
            rec("VIOP", None, 2025, 3, 1),
            rec("VIOP", None, 2025, 12, 1),
        ];
        let companies = group_by_company(&records);
        let keys: Vec<(i32, u32)> = companies[0].records.iter().map(|r| r.period_key()).collect();
        assert_eq!(keys, vec![(2025, 3), (2025, 12), (2026, 1)]);
    }

    #[test]
    fn cells_pair_previous_and_current_months() {
        let view = build_view(&sample(), 2025, 12);
        let viop = &view[0];
        assert_eq!(viop.display_periods.len(), 3);
        assert_eq!(viop.metrics.len(), 3);

        let first = &viop.metrics[0];
        assert_eq!(first.period.label, "Out");
        // September has no record, so the previous side is zero
        assert_eq!(first.trips, [0, 100]);
        assert_eq!(first.usage[0], HealthScore::NotStarted);
        assert!(first.usage[1].is_started());

        let last = &viop.metrics[2];
        assert_eq!(last.trips, [120, 90]);
        assert_eq!(last.crew, [24, 18]);
        assert_eq!(last.vehicles, [12, 9]);
        assert_eq!(last.usage[1], health::score(&viop.history, 2025, 12));
    }

    #[test]
    fn onboarding_company_keeps_not_started_scores() {
        let view = build_view(&sample(), 2025, 12);
        let unesul = &view[1];
        assert_eq!(unesul.metrics[0].usage, [HealthScore::NotStarted, HealthScore::NotStarted]);
        assert_eq!(unesul.metrics[1].usage, [HealthScore::NotStarted, HealthScore::NotStarted]);
        assert_eq!(unesul.metrics[2].usage[0], HealthScore::NotStarted);
        assert!(unesul.metrics[2].usage[1].is_started());
    }

    #[test]
    fn company_outside_window_gets_zero_cells() {
        let mut records = sample();
        records.push(rec("PASSARO VERDE", Some("9"), 2025, 6, 300));
        let view = build_view(&records, 2025, 12);
        let late = view.iter().find(|v| v.name == "PASSARO VERDE").unwrap();
        assert_eq!(late.display_periods.len(), 3);
        assert!(late.metrics.iter().all(|m| m.trips == [0, 0]));
        assert!(late.metrics.iter().all(|m| m.usage[1] == HealthScore::Score(0.0)));
    }

    #[test]
    fn repeated_builds_are_identical() {
        let records = sample();
        assert_eq!(build_view(&records, 2025, 12), build_view(&records, 2025, 12));
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{DisplayPeriod, MonthlyRecord};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEntry {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 0-11
    pub index: u32,
    pub label: String,
}

impl PeriodEntry {
    pub fn to_display(&self) -> DisplayPeriod {
        DisplayPeriod {
            year: self.year,
            month: self.month,
            label: self.label.clone(),
        }
    }
}

/// Short month label; out-of-range months yield an empty label.
pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_LABELS.get(idx as usize))
        .copied()
        .unwrap_or("")
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// `count + 1` chronological months ending at (year, month) inclusive.
pub fn trailing_months(year: i32, month: u32, count: u32) -> Vec<PeriodEntry> {
    let target = i64::from(year) * 12 + i64::from(month.clamp(1, 12)) - 1;

    (0..=i64::from(count))
        .rev()
        .map(|back| {
            let absolute = target - back;
            let y = absolute.div_euclid(12) as i32;
            let index = absolute.rem_euclid(12) as u32;
            PeriodEntry {
                year: y,
                month: index + 1,
                index,
                label: month_label(index + 1).to_string(),
            }
        })
        .collect()
}

/// Unique periods present in `records`, newest first, labelled "Mon YYYY".
pub fn available_periods(records: &[MonthlyRecord]) -> Vec<DisplayPeriod> {
    let unique: BTreeSet<(i32, u32)> = records.iter().map(MonthlyRecord::period_key).collect();

    unique
        .into_iter()
        .rev()
        .map(|(year, month)| DisplayPeriod {
            year,
            month,
            label: format!("{} {}", month_label(month), year),
        })
        .collect()
}

pub fn months_by_year(records: &[MonthlyRecord]) -> BTreeMap<i32, BTreeSet<u32>> {
    let mut map: BTreeMap<i32, BTreeSet<u32>> = BTreeMap::new();
    for record in records {
        map.entry(record.year).or_default().insert(record.month);
    }
    map
}

pub fn latest_period(records: &[MonthlyRecord]) -> Option<(i32, u32)> {
    records.iter().map(MonthlyRecord::period_key).max()
}

/// Snaps a requested selection onto a month that actually has data.
///
/// Falls back to the last populated month of the requested year, then to the
/// latest populated period overall. With no records the request is returned
/// as-is.
pub fn resolve_selection(records: &[MonthlyRecord], year: i32, month: u32) -> (i32, u32) {
    let by_year = months_by_year(records);

    match by_year.get(&year) {
        Some(months) if months.contains(&month) => (year, month),
        Some(months) => match months.iter().next_back() {
            Some(last) => (year, *last),
            None => (year, month),
        },
        None => latest_period(records).unwrap_or((year, month)),
    }
}

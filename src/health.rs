use crate::models::{HealthScore, MonthlyRecord};
use crate::periods::previous_month;

/// Months scanned before the target when building the benchmark.
pub const LOOKBACK_MONTHS: usize = 3;
/// Benchmark floor so tiny operations cannot max out the activity component.
pub const BENCHMARK_FLOOR: f64 = 100.0;

const ACTIVITY_WEIGHT: f64 = 50.0;
const CONSISTENCY_WEIGHT: f64 = 30.0;
const FIRST_MONTH_CONSISTENCY: f64 = 20.0;
const CONSISTENCY_DECAY: f64 = 1.5;
const DEPTH_STEP: f64 = 10.0;

/// Every intermediate of a health score, for charts and audits.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub current_activity: u64,
    /// Non-zero volumes of the lookback months, most recent first.
    pub previous_activities: Vec<u64>,
    pub benchmark: f64,
    pub activity: f64,
    pub consistency: f64,
    pub depth: f64,
    /// 1.0 unless activity fell below the reference month.
    pub retention_factor: f64,
}

impl ScoreBreakdown {
    pub fn raw_total(&self) -> f64 {
        self.activity + self.consistency + self.depth
    }

    pub fn final_score(&self) -> f64 {
        (self.raw_total() * self.retention_factor).clamp(0.0, 100.0)
    }
}

fn record_at(history: &[MonthlyRecord], year: i32, month: u32) -> Option<&MonthlyRecord> {
    history.iter().find(|r| r.is_at(year, month))
}

/// True once the company reported any trips or schedule changes at or
/// before the given month, whether or not that month has a record.
pub fn has_started(history: &[MonthlyRecord], year: i32, month: u32) -> bool {
    history
        .iter()
        .any(|r| r.is_at_or_before(year, month) && r.activity() > 0)
}

/// Health score (0-100) for one company at one month.
pub fn score(history: &[MonthlyRecord], year: i32, month: u32) -> HealthScore {
    match breakdown(history, year, month) {
        Some(parts) => HealthScore::Score(parts.final_score()),
        None => HealthScore::NotStarted,
    }
}

/// Component view of [`score`]; `None` while the company is onboarding.
pub fn breakdown(history: &[MonthlyRecord], year: i32, month: u32) -> Option<ScoreBreakdown> {
    if !has_started(history, year, month) {
        return None;
    }

    let (trips, changes) = record_at(history, year, month)
        .map(|r| (r.total_trips, r.total_schedule_changes))
        .unwrap_or((0, 0));
    let current = trips.saturating_add(changes);

    let mut previous_activities = Vec::with_capacity(LOOKBACK_MONTHS);
    let (mut y, mut m) = (year, month);
    for _ in 0..LOOKBACK_MONTHS {
        (y, m) = previous_month(y, m);
        let volume = record_at(history, y, m).map(MonthlyRecord::activity).unwrap_or(0);
        if volume > 0 {
            previous_activities.push(volume);
        }
    }

    // Head of the filtered list: the most recent active lookback month,
    // which is not always the calendar month right before the target.
    let reference = previous_activities.first().copied().unwrap_or(0);

    let peak = previous_activities.iter().copied().max().unwrap_or(0);
    let benchmark = (peak.max(current) as f64).max(BENCHMARK_FLOOR);

    let activity = ACTIVITY_WEIGHT * current as f64 / benchmark;
    let consistency = consistency(current, &previous_activities);

    let mut depth = 0.0;
    if trips > 0 {
        depth += DEPTH_STEP;
    }
    if changes > 0 {
        depth += DEPTH_STEP;
    }

    let retention_factor = if reference > 0 && current < reference {
        current as f64 / reference as f64
    } else {
        1.0
    };

    Some(ScoreBreakdown {
        current_activity: current,
        previous_activities,
        benchmark,
        activity,
        consistency,
        depth,
        retention_factor,
    })
}

fn consistency(current: u64, previous: &[u64]) -> f64 {
    if current == 0 {
        return 0.0;
    }
    if previous.is_empty() {
        return FIRST_MONTH_CONSISTENCY;
    }

    let window: Vec<f64> = previous
        .iter()
        .chain(std::iter::once(&current))
        .map(|v| *v as f64)
        .collect();
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let divisor = if mean == 0.0 { 1.0 } else { mean };
    let cv = variance.sqrt() / divisor;

    CONSISTENCY_WEIGHT * (-CONSISTENCY_DECAY * cv).exp()
}

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dashboard::{group_by_company, CompanyHistory};
use crate::health;
use crate::models::{DashboardCompanyView, DisplayPeriod, HealthScore, MonthlyRecord};
use crate::periods::{month_label, months_by_year, previous_month};
use crate::trend::{count_trend, Trend};

/// Company selection; an empty filter selects everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    names: BTreeSet<String>,
}

impl CompanyFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    AlphaAsc,
    AlphaDesc,
    #[default]
    Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Trips,
    Vehicles,
    Crew,
    Scale,
}

impl Metric {
    pub fn value_of(&self, record: &MonthlyRecord) -> u64 {
        match self {
            Metric::Trips => record.total_trips,
            Metric::Vehicles => record.total_vehicles,
            Metric::Crew => record.total_crew,
            Metric::Scale => record.total_schedule_changes,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trips" | "servicos" => Ok(Metric::Trips),
            "vehicles" | "veiculos" => Ok(Metric::Vehicles),
            "crew" | "tripulantes" => Ok(Metric::Crew),
            "scale" | "schedule-changes" | "alteracoes" => Ok(Metric::Scale),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// Portfolio-wide KPIs for the latest displayed month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub companies: usize,
    pub total_crew: u64,
    pub total_vehicles: u64,
    pub total_trips: u64,
    pub previous_trips: u64,
    pub trips_per_vehicle: u64,
    pub trips_per_crew: u64,
    /// `None` when both months carried no trips.
    pub trips_trend: Option<Trend>,
}

fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        0
    } else {
        (numerator as f64 / denominator as f64).round() as u64
    }
}

pub fn consolidate(views: &[DashboardCompanyView], filter: &CompanyFilter) -> PortfolioSummary {
    let mut companies = 0;
    let (mut crew, mut vehicles, mut trips, mut previous_trips) = (0u64, 0u64, 0u64, 0u64);

    for view in views.iter().filter(|v| filter.matches(&v.name)) {
        companies += 1;
        if let Some(latest) = view.latest() {
            crew = crew.saturating_add(latest.crew[1]);
            vehicles = vehicles.saturating_add(latest.vehicles[1]);
            trips = trips.saturating_add(latest.trips[1]);
            previous_trips = previous_trips.saturating_add(latest.trips[0]);
        }
    }

    let trips_trend = if trips == 0 && previous_trips == 0 {
        None
    } else {
        Some(count_trend(trips, previous_trips))
    };

    PortfolioSummary {
        companies,
        total_crew: crew,
        total_vehicles: vehicles,
        total_trips: trips,
        previous_trips,
        trips_per_vehicle: rounded_ratio(trips, vehicles),
        trips_per_crew: rounded_ratio(trips, crew),
        trips_trend,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPoint {
    pub period: DisplayPeriod,
    /// Rounded mean of started companies; `None` if none had started.
    pub average: Option<f64>,
    pub scored_companies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePoint {
    pub period: DisplayPeriod,
    pub score: HealthScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySeries {
    pub name: String,
    pub points: Vec<ScorePoint>,
}

fn year_periods(records: &[MonthlyRecord], year: i32) -> Vec<DisplayPeriod> {
    months_by_year(records)
        .remove(&year)
        .unwrap_or_default()
        .into_iter()
        .map(|month| DisplayPeriod {
            year,
            month,
            label: month_label(month).to_string(),
        })
        .collect()
}

fn selected_histories(records: &[MonthlyRecord], filter: &CompanyFilter) -> Vec<CompanyHistory> {
    group_by_company(records)
        .into_iter()
        .filter(|h| filter.matches(&h.name))
        .collect()
}

/// Average health of the selected companies for each populated month of `year`.
pub fn portfolio_health(
    records: &[MonthlyRecord],
    year: i32,
    filter: &CompanyFilter,
) -> Vec<PortfolioPoint> {
    let histories = selected_histories(records, filter);

    year_periods(records, year)
        .into_iter()
        .map(|period| {
            let scores: Vec<f64> = histories
                .iter()
                .filter_map(|h| health::score(&h.records, period.year, period.month).value())
                .collect();
            let average = if scores.is_empty() {
                None
            } else {
                Some((scores.iter().sum::<f64>() / scores.len() as f64).round())
            };

            PortfolioPoint {
                period,
                average,
                scored_companies: scores.len(),
            }
        })
        .collect()
}

/// One score series per selected company over the populated months of `year`.
pub fn company_breakdown(
    records: &[MonthlyRecord],
    year: i32,
    filter: &CompanyFilter,
) -> Vec<CompanySeries> {
    let periods = year_periods(records, year);

    selected_histories(records, filter)
        .into_iter()
        .map(|history| CompanySeries {
            points: periods
                .iter()
                .map(|period| ScorePoint {
                    period: period.clone(),
                    score: health::score(&history.records, period.year, period.month),
                })
                .collect(),
            name: history.name,
        })
        .collect()
}

/// Score for every recorded month of one company, labelled "Mon/YYYY".
pub fn score_series(history: &[MonthlyRecord]) -> Vec<ScorePoint> {
    let mut ordered: Vec<&MonthlyRecord> = history.iter().collect();
    ordered.sort_by_key(|r| r.period_key());

    ordered
        .into_iter()
        .map(|record| ScorePoint {
            period: DisplayPeriod {
                year: record.year,
                month: record.month,
                label: format!("{}/{}", month_label(record.month), record.year),
            },
            score: health::score(history, record.year, record.month),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Mid-month date, "YYYY-MM-15".
    pub date: String,
    pub value: u64,
    pub year: i32,
    pub month: u32,
}

/// Raw metric values over a company's history, oldest first.
///
/// Records with an impossible month are skipped.
pub fn metric_series(history: &[MonthlyRecord], metric: Metric) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = history
        .iter()
        .filter_map(|record| {
            let date = NaiveDate::from_ymd_opt(record.year, record.month, 15)?;
            Some(SeriesPoint {
                date: date.format("%Y-%m-%d").to_string(),
                value: metric.value_of(record),
                year: record.year,
                month: record.month,
            })
        })
        .collect();
    points.sort_by_key(|p| (p.year, p.month));
    points
}

fn latest_score(view: &DashboardCompanyView) -> HealthScore {
    view.latest()
        .map(|cell| cell.current_score())
        .unwrap_or(HealthScore::NotStarted)
}

/// Highest score first; onboarding companies after every numeric score.
fn compare_usage(a: HealthScore, b: HealthScore) -> Ordering {
    match (a.value(), b.value()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn apply_sorting(
    views: &[DashboardCompanyView],
    filter: &CompanyFilter,
    order: SortOrder,
) -> Vec<DashboardCompanyView> {
    let mut selected: Vec<DashboardCompanyView> = views
        .iter()
        .filter(|v| filter.matches(&v.name))
        .cloned()
        .collect();

    match order {
        SortOrder::AlphaAsc => selected.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::AlphaDesc => selected.sort_by(|a, b| b.name.cmp(&a.name)),
        SortOrder::Usage => {
            selected.sort_by(|a, b| compare_usage(latest_score(a), latest_score(b)))
        }
    }

    selected
}

/// Detail card data for one company and month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetail {
    pub current: MonthlyRecord,
    pub previous: MonthlyRecord,
    pub scale_trend: Trend,
    pub trips_trend: Trend,
    pub crew_trend: Trend,
    pub vehicles_trend: Trend,
    pub score: HealthScore,
}

pub fn company_detail(history: &CompanyHistory, year: i32, month: u32) -> CompanyDetail {
    let (prev_year, prev_month) = previous_month(year, month);
    let current = history.record_or_empty(year, month);
    let previous = history.record_or_empty(prev_year, prev_month);

    CompanyDetail {
        scale_trend: count_trend(current.total_schedule_changes, previous.total_schedule_changes),
        trips_trend: count_trend(current.total_trips, previous.total_trips),
        crew_trend: count_trend(current.total_crew, previous.total_crew),
        vehicles_trend: count_trend(current.total_vehicles, previous.total_vehicles),
        score: health::score(&history.records, year, month),
        current,
        previous,
    }
}

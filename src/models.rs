use serde::{Deserialize, Serialize, Serializer};

use crate::de;

/// Placeholder shown when a company never carried a code.
pub const MISSING_CODE: &str = "---";

/// One row of the monthly usage table, one per (company, year, month).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    #[serde(alias = "nome_empresa", alias = "company_name")]
    pub company_name: String,
    #[serde(
        default,
        alias = "codigo_empresa",
        alias = "company_code",
        deserialize_with = "de::opt_code"
    )]
    pub company_code: Option<String>,
    #[serde(alias = "ano")]
    pub year: i32,
    #[serde(alias = "mes")]
    pub month: u32,
    #[serde(
        default,
        alias = "total_servicos",
        alias = "total_trips",
        deserialize_with = "de::lenient_count"
    )]
    pub total_trips: u64,
    #[serde(
        default,
        alias = "total_veiculos",
        alias = "total_vehicles",
        deserialize_with = "de::lenient_count"
    )]
    pub total_vehicles: u64,
    #[serde(
        default,
        alias = "total_tripulantes",
        alias = "total_crew",
        deserialize_with = "de::lenient_count"
    )]
    pub total_crew: u64,
    #[serde(
        default,
        alias = "total_alteracoes_escala",
        alias = "total_schedule_changes",
        deserialize_with = "de::lenient_count"
    )]
    pub total_schedule_changes: u64,
}

impl MonthlyRecord {
    /// Zero-activity stand-in used whenever a (company, month) lookup misses.
    pub fn empty(company_name: &str, year: i32, month: u32) -> Self {
        Self {
            company_name: company_name.to_string(),
            year,
            month,
            ..Self::default()
        }
    }

    /// Trips plus schedule changes, the volume the health score is built on.
    /// Saturates at `u64::MAX`.
    pub fn activity(&self) -> u64 {
        self.total_trips.saturating_add(self.total_schedule_changes)
    }

    pub fn is_at(&self, year: i32, month: u32) -> bool {
        self.year == year && self.month == month
    }

    pub fn is_at_or_before(&self, year: i32, month: u32) -> bool {
        self.year < year || (self.year == year && self.month <= month)
    }

    pub fn period_key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

/// Health of one company in one month.
///
/// `NotStarted` marks a company still in onboarding: it has never reported
/// trips or schedule changes up to the evaluated month. It is kept apart from
/// a numeric zero everywhere and serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthScore {
    NotStarted,
    Score(f64),
}

impl HealthScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            HealthScore::NotStarted => None,
            HealthScore::Score(value) => Some(*value),
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, HealthScore::Score(_))
    }
}

impl Serialize for HealthScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            HealthScore::NotStarted => serializer.serialize_none(),
            HealthScore::Score(value) => serializer.serialize_some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPeriod {
    pub year: i32,
    pub month: u32,
    pub label: String,
}

/// `[previous, current]` pairs for one display month of one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCell {
    pub period: DisplayPeriod,
    pub scale: [u64; 2],
    pub trips: [u64; 2],
    pub crew: [u64; 2],
    pub vehicles: [u64; 2],
    pub usage: [HealthScore; 2],
}

impl MetricCell {
    pub fn current_score(&self) -> HealthScore {
        self.usage[1]
    }

    pub fn previous_score(&self) -> HealthScore {
        self.usage[0]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCompanyView {
    pub name: String,
    pub code: String,
    pub history: Vec<MonthlyRecord>,
    pub display_periods: Vec<DisplayPeriod>,
    pub metrics: Vec<MetricCell>,
}

impl DashboardCompanyView {
    pub fn latest(&self) -> Option<&MetricCell> {
        self.metrics.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_has_zero_activity() {
        let record = MonthlyRecord::empty("UNESUL", 2025, 7);
        assert_eq!(record.activity(), 0);
        assert_eq!(record.company_code, None);
        assert!(record.is_at(2025, 7));
    }

    #[test]
    fn ordering_helpers_cross_year_boundaries() {
        let record = MonthlyRecord::empty("UNESUL", 2025, 12);
        assert!(record.is_at_or_before(2026, 1));
        assert!(record.is_at_or_before(2025, 12));
        assert!(!record.is_at_or_before(2025, 11));
    }

    #[test]
    fn activity_saturates_on_huge_counts() {
        let record = MonthlyRecord {
            total_trips: u64::MAX,
            total_schedule_changes: 1,
            ..MonthlyRecord::empty("UNESUL", 2025, 1)
        };
        assert_eq!(record.activity(), u64::MAX);
    }

    #[test]
    fn not_started_serializes_as_null() {
        let scores = [HealthScore::NotStarted, HealthScore::Score(42.5)];
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, "[null,42.5]");
    }

    #[test]
    fn zero_score_is_not_not_started() {
        assert_ne!(HealthScore::Score(0.0), HealthScore::NotStarted);
        assert_eq!(HealthScore::Score(0.0).value(), Some(0.0));
        assert_eq!(HealthScore::NotStarted.value(), None);
    }
}

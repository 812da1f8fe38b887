use serde::Serialize;

use crate::models::HealthScore;

/// Growth above this percentage is flagged as strong.
pub const HIGH_GROWTH_THRESHOLD: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Flat => "→",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Positive,
    Strong,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub percent: i64,
    pub direction: Direction,
    pub tone: Tone,
}

impl Trend {
    pub fn flat() -> Self {
        Self {
            percent: 0,
            direction: Direction::Flat,
            tone: Tone::Neutral,
        }
    }

    /// "+12%", "-3%", "0%"
    pub fn signed_percent(&self) -> String {
        if self.percent > 0 {
            format!("+{}%", self.percent)
        } else {
            format!("{}%", self.percent)
        }
    }
}

/// Rounds halves towards positive infinity (-2.5 → -2, 2.5 → 3).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn calculate_trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        return Trend::flat();
    }

    let percent = round_half_up((current - previous) / previous * 100.0);

    match percent {
        0 => Trend::flat(),
        p if p > 0 => Trend {
            percent: p,
            direction: Direction::Up,
            tone: if p > HIGH_GROWTH_THRESHOLD {
                Tone::Strong
            } else {
                Tone::Positive
            },
        },
        p => Trend {
            percent: p,
            direction: Direction::Down,
            tone: Tone::Negative,
        },
    }
}

pub fn count_trend(current: u64, previous: u64) -> Trend {
    calculate_trend(current as f64, previous as f64)
}

/// Trend between two health scores.
///
/// `None` while the current month is still onboarding. A previous month
/// without a score has no baseline and reads as flat.
pub fn score_trend(current: HealthScore, previous: HealthScore) -> Option<Trend> {
    match (current, previous) {
        (HealthScore::NotStarted, _) => None,
        (HealthScore::Score(_), HealthScore::NotStarted) => Some(Trend::flat()),
        (HealthScore::Score(now), HealthScore::Score(before)) => Some(calculate_trend(now, before)),
    }
}

/// Dashboard band a score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Onboarding,
    Healthy,
    Operational,
    Low,
    Inactive,
}

impl HealthStatus {
    pub fn classify(score: HealthScore) -> Self {
        match score {
            HealthScore::NotStarted => HealthStatus::Onboarding,
            HealthScore::Score(s) if s > 70.0 => HealthStatus::Healthy,
            HealthScore::Score(s) if s > 40.0 => HealthStatus::Operational,
            HealthScore::Score(s) if s > 20.0 => HealthStatus::Low,
            HealthScore::Score(_) => HealthStatus::Inactive,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Onboarding => "ONBOARDING",
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Operational => "OPERATIONAL",
            HealthStatus::Low => "LOW",
            HealthStatus::Inactive => "INACTIVE",
        }
    }
}

use std::fmt::Write;

use crate::models::{DashboardCompanyView, HealthScore};
use crate::periods::month_label;
use crate::portfolio::{self, CompanyFilter, SortOrder};
use crate::trend::{count_trend, score_trend, HealthStatus, Trend};

fn format_score(score: HealthScore) -> String {
    match score {
        HealthScore::NotStarted => "-".to_string(),
        HealthScore::Score(value) => format!("{value:.0}"),
    }
}

fn format_trend(trend: Option<Trend>) -> String {
    match trend {
        Some(t) => format!("{} {}", t.direction.arrow(), t.signed_percent()),
        None => "--".to_string(),
    }
}

pub fn build_report(
    year: i32,
    month: u32,
    views: &[DashboardCompanyView],
    filter: &CompanyFilter,
    order: SortOrder,
    limit: usize,
) -> String {
    let summary = portfolio::consolidate(views, filter);
    let rows = portfolio::apply_sorting(views, filter, order);

    let mut output = String::new();
    let scope = if filter.is_empty() {
        "all companies"
    } else {
        "selected companies"
    };

    let _ = writeln!(output, "# Fleet Usage Report");
    let _ = writeln!(
        output,
        "Generated for {} {} ({}, {} in view)",
        month_label(month),
        year,
        scope,
        summary.companies
    );
    let _ = writeln!(output);

    if rows.is_empty() {
        let _ = writeln!(output, "No usage data recorded for this window.");
        return output;
    }

    let _ = writeln!(output, "## Portfolio");
    let _ = writeln!(
        output,
        "- Trips: {} ({} vs previous month)",
        summary.total_trips,
        format_trend(summary.trips_trend)
    );
    let _ = writeln!(output, "- Crew: {}", summary.total_crew);
    let _ = writeln!(output, "- Vehicles: {}", summary.total_vehicles);
    let _ = writeln!(output, "- Trips per vehicle: {}", summary.trips_per_vehicle);
    let _ = writeln!(output, "- Trips per crew member: {}", summary.trips_per_crew);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Company Health");
    let _ = writeln!(
        output,
        "| Company | Code | Score | Status | Score trend | Trips | Trips trend | Crew | Vehicles |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|");

    for view in rows.iter().take(limit) {
        let Some(cell) = view.latest() else {
            continue;
        };
        let status = HealthStatus::classify(cell.current_score());
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            view.name,
            view.code,
            format_score(cell.current_score()),
            status.label(),
            format_trend(score_trend(cell.current_score(), cell.previous_score())),
            cell.trips[1],
            format_trend(Some(count_trend(cell.trips[1], cell.trips[0]))),
            cell.crew[1],
            cell.vehicles[1]
        );
    }

    if rows.len() > limit {
        let _ = writeln!(output);
        let _ = writeln!(output, "_{} more companies not shown._", rows.len() - limit);
    }

    let onboarding: Vec<&DashboardCompanyView> = rows
        .iter()
        .filter(|v| v.latest().map(|c| !c.current_score().is_started()).unwrap_or(true))
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Onboarding");
    if onboarding.is_empty() {
        let _ = writeln!(output, "Every company in view is operating.");
    } else {
        for view in onboarding {
            let _ = writeln!(output, "- {} ({})", view.name, view.code);
        }
    }

    output
}

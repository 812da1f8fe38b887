use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand};

use fleet_usage_dashboard::config::DashboardConfig;
use fleet_usage_dashboard::dashboard::{build_view, group_by_company};
use fleet_usage_dashboard::models::MonthlyRecord;
use fleet_usage_dashboard::periods::{available_periods, latest_period, resolve_selection};
use fleet_usage_dashboard::portfolio::{self, CompanyFilter, SortOrder};
use fleet_usage_dashboard::source::{FileSource, RecordSource};
use fleet_usage_dashboard::{health, report};

#[derive(Parser)]
#[command(name = "usage-dashboard")]
#[command(about = "Monthly fleet usage dashboard with per-company health scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// CSV or JSON export of the monthly usage table
    #[arg(long)]
    data: Option<PathBuf>,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
    /// Restrict to these companies (repeatable)
    #[arg(long = "company")]
    companies: Vec<String>,
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dashboard grid as JSON
    View {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Score one company for one month
    Score {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        company: String,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Print the health score for every recorded month of a company
    History {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        company: String,
    },
    /// List the months that have data
    Periods {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn load(args: &DataArgs) -> anyhow::Result<(DashboardConfig, Vec<MonthlyRecord>)> {
    let config = DashboardConfig::load(args.config.as_deref())?;
    let path = args
        .data
        .clone()
        .or_else(|| config.data_path.clone())
        .context("no data file given: pass --data or set USAGE_DASHBOARD_DATA")?;

    let records = FileSource::new(path).fetch_all_records();
    Ok((config, records))
}

/// Requested month snapped onto data, defaulting to the latest period.
fn selection(records: &[MonthlyRecord], year: Option<i32>, month: Option<u32>) -> (i32, u32) {
    let today = Utc::now().date_naive();
    let fallback = latest_period(records).unwrap_or((today.year(), today.month()));
    let requested = (year.unwrap_or(fallback.0), month.unwrap_or(fallback.1));
    resolve_selection(records, requested.0, requested.1)
}

fn filter_for(config: &DashboardConfig, selection: &SelectionArgs) -> CompanyFilter {
    if selection.companies.is_empty() {
        config.company_filter()
    } else {
        CompanyFilter::only(selection.companies.iter().cloned())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::View { data, selection: args } => {
            let (config, records) = load(&data)?;
            let (year, month) = selection(&records, args.year, args.month);
            let views = build_view(&records, year, month);
            let filter = filter_for(&config, &args);
            let sorted = portfolio::apply_sorting(&views, &filter, args.sort.unwrap_or(config.sort));

            log::info!("Built dashboard for {year}-{month:02} with {} companies", sorted.len());
            println!("{}", serde_json::to_string_pretty(&sorted)?);
        }
        Commands::Score {
            data,
            company,
            year,
            month,
        } => {
            let (_, records) = load(&data)?;
            let (year, month) = selection(&records, year, month);
            let history = group_by_company(&records)
                .into_iter()
                .find(|h| h.name == company)
                .with_context(|| format!("no records for company {company}"))?;

            match health::score(&history.records, year, month).value() {
                Some(value) => println!("{company} {year}-{month:02}: {value:.2}"),
                None => println!("{company} {year}-{month:02}: onboarding (not started)"),
            }
        }
        Commands::History { data, company } => {
            let (_, records) = load(&data)?;
            let history: Vec<MonthlyRecord> = records
                .into_iter()
                .filter(|r| r.company_name == company)
                .collect();

            if history.is_empty() {
                println!("No records found for {company}.");
                return Ok(());
            }

            for point in portfolio::score_series(&history) {
                match point.score.value() {
                    Some(value) => println!("{} {value:.2}", point.period.label),
                    None => println!("{} onboarding", point.period.label),
                }
            }
        }
        Commands::Periods { data } => {
            let (_, records) = load(&data)?;
            let periods = available_periods(&records);
            if periods.is_empty() {
                println!("No periods with data.");
            }
            for period in periods {
                println!("{}-{:02} {}", period.year, period.month, period.label);
            }
        }
        Commands::Report {
            data,
            selection: args,
            limit,
            out,
        } => {
            let (config, records) = load(&data)?;
            let (year, month) = selection(&records, args.year, args.month);
            let views = build_view(&records, year, month);
            let filter = filter_for(&config, &args);
            let report = report::build_report(
                year,
                month,
                &views,
                &filter,
                args.sort.unwrap_or(config.sort),
                limit.unwrap_or(config.limit),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::MonthlyRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid month {month} for {company} in {year}")]
    InvalidMonth {
        company: String,
        year: i32,
        month: u32,
    },
}

/// Supplies the full set of monthly records to the dashboard.
pub trait RecordSource {
    /// Every record, sorted by (year, month). Empty on failure.
    ///
    /// The sort is stable: rows within one month keep their input order,
    /// which decides each company's first-seen code.
    fn fetch_all_records(&self) -> Vec<MonthlyRecord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(SourceError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads a CSV or JSON export of the monthly usage table.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_records(&self) -> Result<Vec<MonthlyRecord>, SourceError> {
        let records = match ExportFormat::from_path(&self.path)? {
            ExportFormat::Csv => read_csv(&self.path)?,
            ExportFormat::Json => read_json(&self.path)?,
        };
        finalize(records)
    }
}

impl RecordSource for FileSource {
    fn fetch_all_records(&self) -> Vec<MonthlyRecord> {
        match self.load_records() {
            Ok(records) => {
                log::info!(
                    "Loaded {} monthly records from {}",
                    records.len(),
                    self.path.display()
                );
                records
            }
            Err(err) => {
                log::error!("Failed to load records from {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }
}

/// Records already held in memory.
impl RecordSource for Vec<MonthlyRecord> {
    fn fetch_all_records(&self) -> Vec<MonthlyRecord> {
        let mut records = self.clone();
        records.sort_by_key(MonthlyRecord::period_key);
        records
    }
}

fn read_csv(path: &Path) -> Result<Vec<MonthlyRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut records = Vec::new();

    for result in reader.deserialize::<MonthlyRecord>() {
        records.push(result?);
    }

    Ok(records)
}

fn read_json(path: &Path) -> Result<Vec<MonthlyRecord>, SourceError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn finalize(mut records: Vec<MonthlyRecord>) -> Result<Vec<MonthlyRecord>, SourceError> {
    if let Some(bad) = records.iter().find(|r| !(1..=12).contains(&r.month)) {
        return Err(SourceError::InvalidMonth {
            company: bad.company_name.clone(),
            year: bad.year,
            month: bad.month,
        });
    }

    records.sort_by_key(MonthlyRecord::period_key);

    let mut seen = BTreeSet::new();
    for record in &records {
        if !seen.insert((record.company_name.as_str(), record.year, record.month)) {
            log::warn!(
                "Duplicate record for {} {}-{:02}; the first one is used",
                record.company_name,
                record.year,
                record.month
            );
        }
    }

    Ok(records)
}

/// Unique company names in ascending order.
pub fn company_names(records: &[MonthlyRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.company_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

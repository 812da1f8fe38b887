//! Monthly usage dashboard core: health scores and the trailing-window
//! aggregation that turns raw monthly records into per-company metric series.

pub mod config;
pub mod dashboard;
mod de;
pub mod health;
pub mod models;
pub mod periods;
pub mod portfolio;
pub mod report;
pub mod source;
pub mod trend;

pub use dashboard::{build_view, CompanyHistory};
pub use health::score;
pub use models::{DashboardCompanyView, HealthScore, MetricCell, MonthlyRecord};
pub use periods::trailing_months;
pub use source::{FileSource, RecordSource};

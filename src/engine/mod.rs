pub mod filter;
pub mod pace;
pub mod report;
pub mod summary;

pub use filter::FilterCriteria;
pub use pace::{LiveBetView, LiveMetrics, LiveStatus, MetricsError, StatusThresholds};
pub use report::{AggregateRow, ReportMode, SortDirection, SortField, SortState};
pub use summary::BetSummary;

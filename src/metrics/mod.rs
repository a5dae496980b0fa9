//! Dashboard metrics: KPI counts, window-over-window deltas, and the daily and
//! monthly chart series, computed on demand from read-only queries.

mod libsql_source;
mod series;
mod snapshot;
mod source;
mod window;

use thiserror::Error;

pub use libsql_source::LibsqlMetricsSource;
pub use snapshot::{build_snapshot, DashboardSnapshot};

/// Any failed read while aggregating. There is no partial snapshot.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("metrics query failed: {0}")]
    Query(String),
}

impl From<libsql::Error> for MetricsError {
    fn from(err: libsql::Error) -> Self {
        MetricsError::Query(err.to_string())
    }
}

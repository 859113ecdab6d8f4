//! Site-scoped counters persisted in a shared hash store.
//
//! Each site owns one hash in the `metrics` namespace; every metric is a field
//! of that hash holding a non-negative 64-bit count.

pub mod counters;
pub mod error;
pub mod site;
pub mod stats;

#[cfg(test)]
mod counters_test;

pub use counters::Counters;
pub use error::MetricsError;
pub use site::SiteRegistry;
pub use stats::Stats;

/// Store namespace reserved for counters.
pub const NAMESPACE: &str = "metrics";

/// Metric name carrying the site name in snapshots. Never a real counter.
pub const RESERVED_TAG: &str = "tag";

/// Largest value the store can hold in a counter.
pub const MAX_COUNTER: i64 = i64::MAX;

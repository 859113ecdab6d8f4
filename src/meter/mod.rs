//! Process-local counters describing how the client itself behaves.
//
//! These go through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

// Metric name constants
pub const INCREMENTS: &str = "sitemetrics_increments_total";
pub const OVERFLOW_RESETS: &str = "sitemetrics_overflow_resets_total";
pub const REMOVALS: &str = "sitemetrics_removals_total";
pub const STATS_READS: &str = "sitemetrics_stats_reads_total";
pub const STORE_ERRORS: &str = "sitemetrics_store_errors_total";

/// Adds successful increments.
pub fn add_increments(value: u64) {
    ::metrics::counter!(INCREMENTS).increment(value);
}

/// Adds counters reset to zero after a store overflow.
pub fn add_overflow_resets(value: u64) {
    ::metrics::counter!(OVERFLOW_RESETS).increment(value);
}

/// Adds removed counter fields.
pub fn add_removals(value: u64) {
    ::metrics::counter!(REMOVALS).increment(value);
}

/// Adds snapshot reads.
pub fn add_stats_reads(value: u64) {
    ::metrics::counter!(STATS_READS).increment(value);
}

/// Adds store errors handed back to callers, labelled by operation.
pub fn add_store_errors(op: &'static str, value: u64) {
    ::metrics::counter!(STORE_ERRORS, "op" => op).increment(value);
}

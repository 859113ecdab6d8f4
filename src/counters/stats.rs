//! Snapshot of every counter of one site.
//

use serde::Serialize;
use std::collections::BTreeMap;

/// All counters of a site plus the site name itself.
///
/// Serializes as one flat object where the site name sits under the
/// reserved `tag` key next to the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub tag: String,
    #[serde(flatten)]
    pub counters: BTreeMap<String, i64>,
}

impl Stats {
    /// Value of a single counter, if present.
    pub fn get(&self, metric_name: &str) -> Option<i64> {
        self.counters.get(metric_name).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

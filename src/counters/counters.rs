//! Counter operations against the shared hash store.
//

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::error::{MetricsError, Result};
use super::site::SiteRegistry;
use super::stats::Stats;
use super::{MAX_COUNTER, NAMESPACE, RESERVED_TAG};
use crate::meter;
use crate::store::{HashStore, StoreError};

/// Counters client bound to one store and one site.
pub struct Counters<S: HashStore> {
    store: S,
    site: SiteRegistry,
}

impl<S: HashStore> Counters<S> {
    /// Creates a client whose site is set later through [`Counters::init`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            site: SiteRegistry::new(),
        }
    }

    /// Creates a client with the site name already set.
    pub fn with_site(store: S, site: impl Into<String>) -> Self {
        let counters = Self::new(store);
        counters.init(site);
        counters
    }

    /// Sets the site every following operation is keyed by.
    pub fn init(&self, site: impl Into<String>) {
        self.site.init(site);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current site name, if initialized.
    pub fn site(&self) -> Option<Arc<String>> {
        self.site.get()
    }

    /// Both the store connection and the site must be ready before any store access.
    fn guard(&self) -> Result<Arc<String>> {
        if !self.store.is_initialized() {
            return Err(MetricsError::StoreNotInitialized);
        }
        self.site.get().ok_or(MetricsError::NotInitialized)
    }

    /// Increments `metric_name` by one.
    pub fn increment(&self, metric_name: &str) -> Result<i64> {
        self.increment_by(metric_name, 1)
    }

    /// Increments `metric_name` by `amount` and returns the new value.
    ///
    /// When the store refuses the increment because the counter would pass
    /// 2^63-1, the counter is reset to 0 and the increment applied once more.
    /// The reset and the retry are separate store calls, so an increment from
    /// another client landing between them is lost.
    pub fn increment_by(&self, metric_name: &str, amount: i128) -> Result<i64> {
        let site = self.guard()?;

        if amount < 0 {
            return Err(MetricsError::InvalidArgument("amount must be positive"));
        }
        if amount > i128::from(MAX_COUNTER) {
            return Err(MetricsError::InvalidArgument("amount is too large"));
        }
        let amount = amount as i64;
        if metric_name == RESERVED_TAG {
            return Err(MetricsError::InvalidArgument("the name 'tag' is reserved"));
        }

        let value = match self.store.hincrby(&site, metric_name, amount, NAMESPACE) {
            Ok(value) => value,
            Err(err) if err.is_overflow() => self.reset_and_retry(&site, metric_name, amount)?,
            Err(err) => return Err(self.store_failure("increment", metric_name, err)),
        };

        meter::add_increments(1);
        debug!(
            component = "counters",
            event = "incremented",
            site = %site,
            metric = metric_name,
            amount,
            value,
            "counter incremented"
        );
        Ok(value)
    }

    fn reset_and_retry(&self, site: &str, metric_name: &str, amount: i64) -> Result<i64> {
        warn!(
            component = "counters",
            event = "overflow_reset",
            site = %site,
            metric = metric_name,
            amount,
            "counter would overflow, resetting to 0"
        );
        meter::add_overflow_resets(1);

        self.store
            .hset(site, metric_name, 0, NAMESPACE)
            .map_err(|err| self.store_failure("increment", metric_name, err))?;
        self.store
            .hincrby(site, metric_name, amount, NAMESPACE)
            .map_err(|err| self.store_failure("increment", metric_name, err))
    }

    /// Deletes `metric_name`, returning how many fields were removed (0 or 1).
    pub fn remove(&self, metric_name: &str) -> Result<u64> {
        let site = self.guard()?;

        let removed = self
            .store
            .hdel(&site, &[metric_name], NAMESPACE)
            .map_err(|err| self.store_failure("remove", metric_name, err))?;

        meter::add_removals(removed);
        debug!(
            component = "counters",
            event = "removed",
            site = %site,
            metric = metric_name,
            removed,
            "counter removed"
        );
        Ok(removed)
    }

    /// Reads every counter of the configured site.
    pub fn stats(&self) -> Result<Stats> {
        let site = self.guard()?;

        let raw = self
            .store
            .hgetall(&site, NAMESPACE)
            .map_err(|err| self.store_failure("stats", "*", err))?;

        let mut counters = BTreeMap::new();
        for (field, value) in raw {
            // The site name takes the reserved slot in the snapshot.
            if field == RESERVED_TAG {
                continue;
            }
            let value = parse_counter(&field, &value)?;
            counters.insert(field, value);
        }

        meter::add_stats_reads(1);
        Ok(Stats {
            tag: site.to_string(),
            counters,
        })
    }

    fn store_failure(&self, op: &'static str, metric_name: &str, err: StoreError) -> MetricsError {
        meter::add_store_errors(op, 1);
        error!(
            component = "counters",
            event = "store_failed",
            op,
            metric = metric_name,
            error = %err,
            "store call failed"
        );
        MetricsError::Store(err)
    }
}

fn parse_counter(field: &str, raw: &[u8]) -> Result<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            MetricsError::Store(StoreError::InvalidValue {
                field: field.to_string(),
                value: String::from_utf8_lossy(raw).into_owned(),
            })
        })
}

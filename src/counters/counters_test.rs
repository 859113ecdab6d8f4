#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::config::ConfigTrait;
    use crate::counters::{Counters, MetricsError, MAX_COUNTER, NAMESPACE};
    use crate::store::{HashStore, InMemoryStore, StoreError, StoreResult};

    // Store wrapper that can refuse to be ready and inject increment failures.
    #[derive(Default)]
    struct FakeStore {
        inner: InMemoryStore,
        uninitialized: bool,
        // Reports overflow the way a client without typed codes does.
        overflow_as_text: bool,
        incr_failures: Mutex<Vec<StoreError>>,
        incr_calls: AtomicUsize,
        set_calls: AtomicUsize,
    }

    impl FakeStore {
        fn failing_increments(errors: Vec<StoreError>) -> Self {
            Self {
                incr_failures: Mutex::new(errors),
                ..Self::default()
            }
        }
    }

    impl HashStore for FakeStore {
        fn is_initialized(&self) -> bool {
            !self.uninitialized
        }

        fn hincrby(&self, key: &str, field: &str, delta: i64, namespace: &str) -> StoreResult<i64> {
            self.incr_calls.fetch_add(1, Ordering::Relaxed);
            if let Some(err) = self.incr_failures.lock().pop() {
                return Err(err);
            }
            match self.inner.hincrby(key, field, delta, namespace) {
                Err(StoreError::Overflow) if self.overflow_as_text => Err(StoreError::Response(
                    "ERR increment or decrement would overflow".to_string(),
                )),
                other => other,
            }
        }

        fn hset(&self, key: &str, field: &str, value: i64, namespace: &str) -> StoreResult<()> {
            self.set_calls.fetch_add(1, Ordering::Relaxed);
            self.inner.hset(key, field, value, namespace)
        }

        fn hdel(&self, key: &str, fields: &[&str], namespace: &str) -> StoreResult<u64> {
            self.inner.hdel(key, fields, namespace)
        }

        fn hgetall(&self, key: &str, namespace: &str) -> StoreResult<HashMap<String, Vec<u8>>> {
            self.inner.hgetall(key, namespace)
        }
    }

    fn counters() -> Counters<InMemoryStore> {
        Counters::with_site(InMemoryStore::new(), "site1")
    }

    #[test]
    fn test_increment_new_metric_returns_amount_then_doubles() {
        let c = counters();
        for (i, amount) in [0_i128, 1, 42, 1 << 40, (MAX_COUNTER / 2) as i128]
            .into_iter()
            .enumerate()
        {
            let name = format!("metric_{i}");
            assert_eq!(c.increment_by(&name, amount).unwrap(), amount as i64);
            assert_eq!(c.increment_by(&name, amount).unwrap(), 2 * amount as i64);
        }
    }

    #[test]
    fn test_increment_defaults_to_one() {
        let c = counters();
        assert_eq!(c.increment("hits").unwrap(), 1);
        assert_eq!(c.increment("hits").unwrap(), 2);
    }

    #[test]
    fn test_increment_accepts_max_amount() {
        let c = counters();
        assert_eq!(c.increment_by("big", MAX_COUNTER as i128).unwrap(), MAX_COUNTER);
    }

    #[test]
    fn test_increment_rejects_negative_amount() {
        let c = counters();
        assert_eq!(
            c.increment_by("hits", -1),
            Err(MetricsError::InvalidArgument("amount must be positive"))
        );
        assert!(c.stats().unwrap().is_empty());
    }

    #[test]
    fn test_increment_rejects_too_large_amount() {
        let c = counters();
        assert_eq!(
            c.increment_by("hits", 1_i128 << 63),
            Err(MetricsError::InvalidArgument("amount is too large"))
        );
    }

    #[test]
    fn test_increment_rejects_reserved_tag() {
        let c = counters();
        c.increment("hits").unwrap();
        assert_eq!(
            c.increment("tag"),
            Err(MetricsError::InvalidArgument("the name 'tag' is reserved"))
        );
    }

    #[test]
    fn test_argument_checks_run_in_order() {
        let c = counters();
        // Negative wins over the reserved name.
        assert_eq!(
            c.increment_by("tag", -5),
            Err(MetricsError::InvalidArgument("amount must be positive"))
        );
        // Size wins over the reserved name.
        assert_eq!(
            c.increment_by("tag", i128::MAX),
            Err(MetricsError::InvalidArgument("amount is too large"))
        );
    }

    #[test]
    fn test_operations_before_init_fail() {
        let c = Counters::new(InMemoryStore::new());
        assert_eq!(c.increment("hits"), Err(MetricsError::NotInitialized));
        assert_eq!(c.remove("hits"), Err(MetricsError::NotInitialized));
        assert_eq!(c.stats(), Err(MetricsError::NotInitialized));

        c.init("site1");
        assert_eq!(c.increment("hits").unwrap(), 1);
    }

    #[test]
    fn test_operations_fail_when_store_not_initialized() {
        let store = FakeStore {
            uninitialized: true,
            ..FakeStore::default()
        };
        let c = Counters::with_site(store, "site1");
        assert_eq!(c.increment("hits"), Err(MetricsError::StoreNotInitialized));
        assert_eq!(c.remove("hits"), Err(MetricsError::StoreNotInitialized));
        assert_eq!(c.stats(), Err(MetricsError::StoreNotInitialized));
        assert_eq!(c.store().incr_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_invalid_argument_never_touches_store() {
        let c = Counters::with_site(FakeStore::default(), "site1");
        let _ = c.increment_by("hits", -1);
        let _ = c.increment("tag");
        assert_eq!(c.store().incr_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_overflow_resets_and_reapplies_amount() {
        let c = Counters::with_site(FakeStore::default(), "site1");
        c.store().hset("site1", "x", MAX_COUNTER, NAMESPACE).unwrap();

        assert_eq!(c.increment_by("x", 5).unwrap(), 5);
        assert_eq!(c.store().incr_calls.load(Ordering::Relaxed), 2);
        assert_eq!(c.store().set_calls.load(Ordering::Relaxed), 2);
        assert_eq!(c.stats().unwrap().get("x"), Some(5));
    }

    #[test]
    fn test_overflow_detected_from_reply_text() {
        let store = FakeStore {
            overflow_as_text: true,
            ..FakeStore::default()
        };
        let c = Counters::with_site(store, "site1");
        c.store().hset("site1", "x", MAX_COUNTER - 1, NAMESPACE).unwrap();

        assert_eq!(c.increment_by("x", 2).unwrap(), 2);
    }

    #[test]
    fn test_other_store_errors_propagate_without_retry() {
        let failure = StoreError::Transport("connection reset".to_string());
        let c = Counters::with_site(FakeStore::failing_increments(vec![failure.clone()]), "site1");

        assert_eq!(c.increment("hits"), Err(MetricsError::Store(failure)));
        assert_eq!(c.store().incr_calls.load(Ordering::Relaxed), 1);
        assert_eq!(c.store().set_calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_retry_failure_propagates() {
        // Failures pop from the back: overflow first, then the retry fails.
        let retry_failure = StoreError::Transport("timed out".to_string());
        let store = FakeStore::failing_increments(vec![retry_failure.clone(), StoreError::Overflow]);
        let c = Counters::with_site(store, "site1");

        assert_eq!(c.increment("hits"), Err(MetricsError::Store(retry_failure)));
        assert_eq!(c.store().incr_calls.load(Ordering::Relaxed), 2);
        assert_eq!(c.store().set_calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_remove_missing_metric_returns_zero() {
        let c = counters();
        assert_eq!(c.remove("missing_metric").unwrap(), 0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let c = counters();
        c.increment_by("m", 3).unwrap();
        assert_eq!(c.remove("m").unwrap(), 1);
        assert_eq!(c.remove("m").unwrap(), 0);
        assert_eq!(c.stats().unwrap().get("m"), None);
    }

    #[test]
    fn test_stats_snapshot_includes_tag() {
        let c = counters();
        c.increment_by("a", 3).unwrap();
        c.increment_by("b", 7).unwrap();

        let stats = c.stats().unwrap();
        assert_eq!(stats.tag, "site1");
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({"a": 3, "b": 7, "tag": "site1"})
        );
    }

    #[test]
    fn test_stats_of_empty_site_only_has_tag() {
        let c = counters();
        assert_eq!(serde_json::to_value(c.stats().unwrap()).unwrap(), json!({"tag": "site1"}));
    }

    #[test]
    fn test_stats_overrides_stored_tag_field() {
        let store = InMemoryStore::new();
        store.hset("site1", "tag", 99, NAMESPACE).unwrap();
        store.hset("site1", "a", 1, NAMESPACE).unwrap();
        let c = Counters::with_site(store, "site1");

        assert_eq!(
            serde_json::to_value(c.stats().unwrap()).unwrap(),
            json!({"a": 1, "tag": "site1"})
        );
    }

    #[test]
    fn test_stats_rejects_non_integer_value() {
        let store = InMemoryStore::new();
        store
            .hashes
            .write()
            .entry("metrics:site1".to_string())
            .or_default()
            .insert("broken".to_string(), b"not-a-number".to_vec());
        let c = Counters::with_site(store, "site1");

        assert!(matches!(
            c.stats(),
            Err(MetricsError::Store(StoreError::InvalidValue { ref field, .. })) if field == "broken"
        ));
    }

    #[test]
    fn test_sites_are_isolated() {
        let store = Arc::new(InMemoryStore::new());
        let first = Counters::with_site(Arc::clone(&store), "first");
        let second = Counters::with_site(Arc::clone(&store), "second");

        first.increment_by("hits", 2).unwrap();
        second.increment_by("hits", 9).unwrap();

        assert_eq!(first.stats().unwrap().get("hits"), Some(2));
        assert_eq!(second.stats().unwrap().get("hits"), Some(9));
    }

    #[test]
    fn test_reinit_switches_site() {
        let c = counters();
        c.increment("hits").unwrap();
        c.init("site2");
        assert_eq!(c.stats().unwrap().tag, "site2");
        assert_eq!(c.stats().unwrap().get("hits"), None);
    }

    #[test]
    fn test_client_from_test_config() {
        let cfg = crate::config::new_test_config();
        let store = InMemoryStore::with_prefix(cfg.store().namespace());
        let site = cfg.site().unwrap();
        let c = Counters::with_site(store, site);

        assert_eq!(c.increment_by("hits", 3).unwrap(), 3);
        assert!(c.store().hashes.read().contains_key("test:metrics:test-site"));
    }

    #[test]
    fn test_concurrent_increments_are_counted() {
        let c = Arc::new(counters());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        c.increment("hits").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(c.stats().unwrap().get("hits"), Some(800));
    }
}

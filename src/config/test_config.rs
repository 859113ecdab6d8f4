use super::{Backend, Config, Logs, MetricsBox, Store};
use std::time::Duration;

/// Creates a new test configuration backed by the in-memory store.
pub fn new_test_config() -> Config {
    Config {
        metrics: MetricsBox {
            env: super::TEST.to_string(),
            site: Some("test-site".to_string()),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            store: Some(Store {
                backend: Backend::Memory,
                url: None,
                namespace: Some("test".to_string()),
                timeout: Some(Duration::from_millis(100)),
            }),
        },
    }
}

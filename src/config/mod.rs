// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const PROD: &str = "prod";
#[allow(dead_code)]
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const TEST: &str = "test";

const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379/0";
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metrics {
    #[serde(rename = "metrics")]
    pub metrics: MetricsBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsBox {
    pub env: String,
    pub site: Option<String>,
    pub logs: Option<Logs>,
    pub store: Option<Store>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Store {
    #[serde(default)]
    pub backend: Backend,
    pub url: Option<String>,
    /// Global prefix put in front of every namespaced key.
    pub namespace: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Store {
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_STORE_URL)
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_STORE_TIMEOUT)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self {
            backend: Backend::Redis,
            url: None,
            namespace: None,
            timeout: None,
        }
    }
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_dev(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn site(&self) -> Option<&str>;
    fn store(&self) -> Store;
}

// Config type alias for convenience
pub type Config = Metrics;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.metrics.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.metrics.env == PROD
    }

    fn is_dev(&self) -> bool {
        self.metrics.env == DEV
    }

    fn is_test(&self) -> bool {
        self.metrics.env == TEST
    }

    fn site(&self) -> Option<&str> {
        self.metrics.site.as_deref().filter(|s| !s.is_empty())
    }

    fn store(&self) -> Store {
        self.metrics.store.clone().unwrap_or_default()
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::parse(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))
    }

    /// Parses configuration from YAML text.
    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Metrics = serde_yaml::from_str(data)?;

        if let Some(ref store) = cfg.metrics.store {
            if store.backend == Backend::Redis && store.url().is_empty() {
                anyhow::bail!("store.url must not be empty for the redis backend");
            }
        }

        Ok(cfg)
    }
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;

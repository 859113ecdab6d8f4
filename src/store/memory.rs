//! In-process hash store with Redis counter semantics.
//

use parking_lot::RwLock;
use std::collections::HashMap;

use super::key::prep_key;
use super::{HashStore, StoreError, StoreResult};

const NOT_AN_INTEGER: &str = "ERR hash value is not an integer";

type Hash = HashMap<String, Vec<u8>>;

/// Hash store kept entirely in memory.
///
/// Values are stored as decimal text, the same representation Redis uses for
/// `HINCRBY` fields, so callers see identical bytes from both backends.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    prefix: String,
    pub(crate) hashes: RwLock<HashMap<String, Hash>>,
}

impl InMemoryStore {
    /// Creates an empty store without a global key prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose keys are all scoped under `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            hashes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of top-level hashes currently held.
    pub fn len(&self) -> usize {
        self.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every hash, as a store flush would.
    pub fn clear(&self) {
        self.hashes.write().clear();
    }

    fn parse_integer(raw: &[u8]) -> StoreResult<i64> {
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| StoreError::Response(NOT_AN_INTEGER.to_string()))
    }
}

impl HashStore for InMemoryStore {
    fn is_initialized(&self) -> bool {
        true
    }

    fn hincrby(&self, key: &str, field: &str, delta: i64, namespace: &str) -> StoreResult<i64> {
        let key = prep_key(&self.prefix, namespace, key);
        let mut hashes = self.hashes.write();
        let hash = hashes.entry(key).or_default();

        let current = match hash.get(field) {
            Some(raw) => Self::parse_integer(raw)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or(StoreError::Overflow)?;
        hash.insert(field.to_string(), next.to_string().into_bytes());
        Ok(next)
    }

    fn hset(&self, key: &str, field: &str, value: i64, namespace: &str) -> StoreResult<()> {
        let key = prep_key(&self.prefix, namespace, key);
        self.hashes
            .write()
            .entry(key)
            .or_default()
            .insert(field.to_string(), value.to_string().into_bytes());
        Ok(())
    }

    fn hdel(&self, key: &str, fields: &[&str], namespace: &str) -> StoreResult<u64> {
        let key = prep_key(&self.prefix, namespace, key);
        let mut hashes = self.hashes.write();
        let Some(hash) = hashes.get_mut(&key) else {
            return Ok(0);
        };

        let removed = fields
            .iter()
            .filter(|field| hash.remove(**field).is_some())
            .count() as u64;

        // Redis drops a hash once its last field is gone.
        if hash.is_empty() {
            hashes.remove(&key);
        }
        Ok(removed)
    }

    fn hgetall(&self, key: &str, namespace: &str) -> StoreResult<HashMap<String, Vec<u8>>> {
        let key = prep_key(&self.prefix, namespace, key);
        Ok(self.hashes.read().get(&key).cloned().unwrap_or_default())
    }
}

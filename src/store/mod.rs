//! Hash-backed key-value store used as the counters backend.
//
//! The store is an external collaborator: counters only talk to it through
//! [`HashStore`], so a remote Redis and the in-process map are interchangeable.

use std::collections::HashMap;

pub mod key;
pub mod memory;
pub mod redis_store;


pub use memory::InMemoryStore;
pub use redis_store::RedisStore;

/// Message the store attaches to a rejected counter increment.
pub const OVERFLOW_MESSAGE: &str = "increment or decrement would overflow";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store connection is not initialized")]
    NotInitialized,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("{0}")]
    Response(String),
    #[error("store transport failure: {0}")]
    Transport(String),
    #[error("hash field {field:?} holds a non-integer value {value:?}")]
    InvalidValue { field: String, value: String },
}

impl StoreError {
    /// Reports whether the store refused an increment because the result
    /// would leave the signed 64-bit range.
    pub fn is_overflow(&self) -> bool {
        match self {
            StoreError::Overflow => true,
            // Clients without a typed overflow code only hand back the reply text.
            StoreError::Response(msg) => msg.contains(OVERFLOW_MESSAGE),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Hash-field operations the counters need from a store.
///
/// Every call is a blocking request/response exchange. `namespace` scopes the
/// top-level `key` so unrelated users of the same store never collide.
pub trait HashStore: Send + Sync {
    /// Returns false until the connection to the store has been set up.
    fn is_initialized(&self) -> bool;

    /// Atomically adds `delta` to `field`, treating an absent field as 0.
    fn hincrby(&self, key: &str, field: &str, delta: i64, namespace: &str) -> StoreResult<i64>;

    /// Overwrites `field` with `value`.
    fn hset(&self, key: &str, field: &str, value: i64, namespace: &str) -> StoreResult<()>;

    /// Deletes `fields`, returning how many of them existed.
    fn hdel(&self, key: &str, fields: &[&str], namespace: &str) -> StoreResult<u64>;

    /// Reads every field of the hash. An absent hash is an empty map.
    fn hgetall(&self, key: &str, namespace: &str) -> StoreResult<HashMap<String, Vec<u8>>>;
}

impl<S: HashStore + ?Sized> HashStore for std::sync::Arc<S> {
    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn hincrby(&self, key: &str, field: &str, delta: i64, namespace: &str) -> StoreResult<i64> {
        (**self).hincrby(key, field, delta, namespace)
    }

    fn hset(&self, key: &str, field: &str, value: i64, namespace: &str) -> StoreResult<()> {
        (**self).hset(key, field, value, namespace)
    }

    fn hdel(&self, key: &str, fields: &[&str], namespace: &str) -> StoreResult<u64> {
        (**self).hdel(key, fields, namespace)
    }

    fn hgetall(&self, key: &str, namespace: &str) -> StoreResult<HashMap<String, Vec<u8>>> {
        (**self).hgetall(key, namespace)
    }
}

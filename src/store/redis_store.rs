//! Redis-backed hash store.
//

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::key::prep_key;
use super::{HashStore, StoreError, StoreResult, OVERFLOW_MESSAGE};
use crate::config;

/// Hash store talking to a Redis server over one synchronous connection.
///
/// Construction only validates the URL. Nothing reaches the server until
/// [`RedisStore::init`] succeeds, and every call before that fails with
/// [`StoreError::NotInitialized`].
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
    timeout: Duration,
    initialized: AtomicBool,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisStore {
    /// Creates a store from configuration without connecting.
    pub fn new(cfg: &config::Store) -> StoreResult<Self> {
        let client = redis::Client::open(cfg.url()).map_err(classify)?;
        Ok(Self {
            client,
            prefix: cfg.namespace().to_string(),
            timeout: cfg.timeout(),
            initialized: AtomicBool::new(false),
            conn: Mutex::new(None),
        })
    }

    /// Opens the connection. Calling it again replaces the connection.
    pub fn init(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        *self.conn.lock() = Some(conn);
        self.initialized.store(true, Ordering::Release);
        info!(
            component = "store",
            event = "connected",
            timeout = ?self.timeout,
            "redis connection initialized"
        );
        Ok(())
    }

    fn connect(&self) -> StoreResult<redis::Connection> {
        let conn = self
            .client
            .get_connection_with_timeout(self.timeout)
            .map_err(classify)?;
        conn.set_read_timeout(Some(self.timeout)).map_err(classify)?;
        conn.set_write_timeout(Some(self.timeout)).map_err(classify)?;
        Ok(conn)
    }

    fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> StoreResult<T> {
        if !self.is_initialized() {
            return Err(StoreError::NotInitialized);
        }

        let mut guard = self.conn.lock();
        if guard.is_none() {
            debug!(component = "store", event = "reconnect", "re-opening dropped redis connection");
            *guard = Some(self.connect()?);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(StoreError::NotInitialized);
        };

        match cmd.query::<T>(conn) {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_connection_dropped() || err.is_io_error() {
                    warn!(
                        component = "store",
                        event = "connection_lost",
                        error = %err,
                        "dropping broken redis connection"
                    );
                    *guard = None;
                }
                Err(classify(err))
            }
        }
    }
}

/// Maps a client error onto the store error kinds.
pub(crate) fn classify(err: redis::RedisError) -> StoreError {
    if err.is_io_error() || err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal() {
        return StoreError::Transport(err.to_string());
    }
    if err.detail().is_some_and(|detail| detail.contains(OVERFLOW_MESSAGE)) {
        return StoreError::Overflow;
    }
    StoreError::Response(err.to_string())
}

impl HashStore for RedisStore {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn hincrby(&self, key: &str, field: &str, delta: i64, namespace: &str) -> StoreResult<i64> {
        let key = prep_key(&self.prefix, namespace, key);
        self.query(redis::cmd("HINCRBY").arg(key).arg(field).arg(delta))
    }

    fn hset(&self, key: &str, field: &str, value: i64, namespace: &str) -> StoreResult<()> {
        let key = prep_key(&self.prefix, namespace, key);
        self.query::<i64>(redis::cmd("HSET").arg(key).arg(field).arg(value))
            .map(|_| ())
    }

    fn hdel(&self, key: &str, fields: &[&str], namespace: &str) -> StoreResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        let key = prep_key(&self.prefix, namespace, key);
        self.query(redis::cmd("HDEL").arg(key).arg(fields))
    }

    fn hgetall(&self, key: &str, namespace: &str) -> StoreResult<HashMap<String, Vec<u8>>> {
        let key = prep_key(&self.prefix, namespace, key);
        self.query(redis::cmd("HGETALL").arg(key))
    }
}

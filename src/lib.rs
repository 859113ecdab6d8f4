pub mod config;
pub mod counters;
pub mod meter;
pub mod store;

pub use counters::{Counters, MetricsError, Stats};
pub use store::{HashStore, InMemoryStore, RedisStore, StoreError};

// Error definitions for counter operations

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics module needs to be initialized before use")]
    NotInitialized,
    #[error("store connection needs to be initialized before use")]
    StoreNotInitialized,
    #[error("{0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

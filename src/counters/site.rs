//! Holder for the site name all counters are keyed by.
//

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Site name shared by every operation of a [`super::Counters`] client.
///
/// Meant to be set once at startup; a later `init` overwrites the name for
/// all subsequent calls.
#[derive(Debug, Default)]
pub struct SiteRegistry {
    name: ArcSwapOption<String>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `site` as the current site name.
    pub fn init(&self, site: impl Into<String>) {
        self.name.store(Some(Arc::new(site.into())));
    }

    /// Returns the site name, or `None` while it is unset or empty.
    pub fn get(&self) -> Option<Arc<String>> {
        self.name.load_full().filter(|name| !name.is_empty())
    }

    pub fn is_initialized(&self) -> bool {
        self.get().is_some()
    }
}

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::{DataSources, RecordStore};

static GLOBAL: OnceLock<StoreCache> = OnceLock::new();

/// Loaded stores keyed by their source paths.
///
/// Initialize once, read many: a store is loaded on first request and shared
/// afterwards. There is no invalidation; a changed file on disk is only seen by
/// a new cache.
#[derive(Debug, Default)]
pub struct StoreCache {
    stores: Mutex<HashMap<DataSources, Arc<RecordStore>>>,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache.
    pub fn global() -> &'static StoreCache {
        GLOBAL.get_or_init(StoreCache::new)
    }

    pub fn get_or_load(&self, sources: &DataSources) -> Arc<RecordStore> {
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(sources) {
            log::debug!("Record store cache hit for {}", sources.operations.display());
            return Arc::clone(store);
        }

        let store = Arc::new(RecordStore::load(sources));
        stores.insert(sources.clone(), Arc::clone(&store));
        store
    }

    pub fn len(&self) -> usize {
        self.stores.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_shares_the_loaded_store() {
        let cache = StoreCache::new();
        let sources = DataSources::in_dir("/nonexistent/practice");

        let first = cache.get_or_load(&sources);
        let second = cache.get_or_load(&sources);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_sources_load_separately() {
        let cache = StoreCache::new();
        cache.get_or_load(&DataSources::in_dir("/nonexistent/a"));
        cache.get_or_load(&DataSources::in_dir("/nonexistent/b"));
        assert_eq!(cache.len(), 2);
    }
}

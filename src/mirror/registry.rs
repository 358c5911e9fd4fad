//! Mirror lifecycle.
//!
//! An application-owned registry replacing a process-global singleton. The
//! first `get_or_create` call performs the blocking initial load and starts
//! the watch supervisor; concurrent first callers converge on that single
//! construction. The initial load is a deliberate one-time synchronous call
//! and must not run on a latency-sensitive scheduling context.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::trace;

use crate::mirror::watch::WatchSupervisor;
use crate::store::strip_namespace;
use crate::MirrorConfig;
use crate::RemoteStore;
use crate::Result;
use crate::SyncMap;

#[derive(Default)]
pub struct MirrorRegistry {
    instance: OnceCell<Arc<SyncMap>>,
}

impl MirrorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared mirror, constructing it on first call.
    ///
    /// Construction loads the full namespace from the remote store and
    /// registers the watch before the instance is published; a failed load
    /// is fatal and publishes nothing. Later calls return the existing
    /// instance and ignore their `store`/`config` arguments.
    pub async fn get_or_create(
        &self,
        store: Arc<dyn RemoteStore>,
        config: MirrorConfig,
    ) -> Result<Arc<SyncMap>> {
        self.instance
            .get_or_try_init(|| Self::build(store, config))
            .await
            .cloned()
    }

    /// The already-constructed mirror, if any.
    pub fn get(&self) -> Option<Arc<SyncMap>> {
        self.instance.get().cloned()
    }

    async fn build(
        store: Arc<dyn RemoteStore>,
        config: MirrorConfig,
    ) -> Result<Arc<SyncMap>> {
        debug!("initializing mirror for namespace '{}'", config.map_name);

        let cache = Arc::new(DashMap::new());
        let snapshot = store.get_all(&config.map_name).await?;
        if let Some(entries) = snapshot.entries {
            for kv in entries {
                cache.insert(strip_namespace(&config.map_name, &kv.key), kv.value);
            }
        }
        trace!("initial load complete: {} entries", cache.len());

        let watch_task =
            WatchSupervisor::spawn(Arc::clone(&store), Arc::clone(&cache), config.clone());

        Ok(Arc::new(SyncMap::new(cache, store, config, Some(watch_task))))
    }
}

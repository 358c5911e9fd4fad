//! Watch supervision.
//!
//! One long-lived task per mirror: registers the watch on the namespace
//! prefix, feeds every snapshot pair to the reconciler under an explicit
//! reconcile lock, and recovers from subscription termination with a full
//! reload followed by a fresh registration. Reconciliation is serialized
//! against itself and against reloads, but not against facade writes; those
//! rely on the cache's per-key concurrency, last write observed wins.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::mirror::reconciler;
use crate::store::strip_namespace;
use crate::utils::async_task::retry_with_backoff;
use crate::MirrorConfig;
use crate::RemoteStore;
use crate::StoreError;
use crate::WatchEvent;

pub(crate) struct WatchSupervisor {
    store: Arc<dyn RemoteStore>,
    cache: Arc<DashMap<String, String>>,
    config: MirrorConfig,
    reconcile_lock: Mutex<()>,
}

impl WatchSupervisor {
    pub(crate) fn spawn(
        store: Arc<dyn RemoteStore>,
        cache: Arc<DashMap<String, String>>,
        config: MirrorConfig,
    ) -> JoinHandle<()> {
        let supervisor = Self {
            store,
            cache,
            config,
            reconcile_lock: Mutex::new(()),
        };
        tokio::spawn(async move { supervisor.run().await })
    }

    async fn run(self) {
        let prefix = self.config.map_name.clone();
        loop {
            let mut events = match self.register(&prefix).await {
                Ok(rx) => {
                    debug!("watch registered on '{}'", prefix);
                    rx
                }
                Err(e) => {
                    // The mirror keeps serving reads, but stops converging.
                    error!("failed to register watch on '{}': {}", prefix, e);
                    return;
                }
            };

            while let Some(event) = events.recv().await {
                self.reconcile(event).await;
            }

            warn!("watch on '{}' terminated, reloading before re-subscribing", prefix);
            if let Err(e) = self.reload(&prefix).await {
                error!("reload of '{}' after watch loss failed: {}", prefix, e);
                return;
            }
        }
    }

    async fn register(
        &self,
        prefix: &str,
    ) -> std::result::Result<tokio::sync::mpsc::Receiver<WatchEvent>, StoreError> {
        retry_with_backoff(|| self.store.watch(prefix), self.config.watch_backoff).await
    }

    /// Apply one snapshot pair to the mirror. Two in-flight events never
    /// interleave their multi-key mutation sequences.
    async fn reconcile(
        &self,
        event: WatchEvent,
    ) {
        let _guard = self.reconcile_lock.lock().await;
        let mutations = reconciler::diff(
            event.prev.as_ref(),
            event.next.as_ref(),
            self.config.diff_strategy,
            &self.config.map_name,
        );
        if mutations.is_empty() {
            debug!("snapshot pair produced no mutations");
            return;
        }
        reconciler::apply(&self.cache, &mutations);
    }

    /// Replace the mirror's contents with a fresh full load. Covers events
    /// missed while the subscription was down.
    async fn reload(
        &self,
        prefix: &str,
    ) -> std::result::Result<(), StoreError> {
        let snapshot =
            retry_with_backoff(|| self.store.get_all(prefix), self.config.watch_backoff).await?;

        let _guard = self.reconcile_lock.lock().await;
        self.cache.clear();
        if let Some(entries) = snapshot.entries {
            for kv in entries {
                self.cache
                    .insert(strip_namespace(&self.config.map_name, &kv.key), kv.value);
            }
        }
        debug!("reloaded '{}': {} entries", prefix, self.cache.len());
        Ok(())
    }
}

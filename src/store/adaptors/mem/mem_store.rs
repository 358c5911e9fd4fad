use std::collections::BTreeMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::trace;

use crate::constants::WATCH_CHANNEL_CAPACITY;
use crate::KeyValue;
use crate::RemoteStore;
use crate::Snapshot;
use crate::StoreError;
use crate::WatchEvent;

/// In-memory [`RemoteStore`] with watch fan-out.
///
/// Intended for tests and single-process embedding. Each registered watcher
/// receives one initial event carrying the current state (previous snapshot
/// absent), then a (previous, next) snapshot pair for every mutation that
/// changes its prefix, in mutation order.
#[derive(Default)]
pub struct MemStore {
    // Held across watch delivery so events stay ordered per subscription.
    data: Mutex<BTreeMap<String, String>>,

    watchers: RwLock<Vec<Watcher>>,
}

#[derive(Clone)]
struct Watcher {
    prefix: String,
    tx: mpsc::Sender<WatchEvent>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one mutation to the store and deliver snapshot pairs to every
    /// watcher whose prefix view changed.
    async fn mutate<F>(
        &self,
        f: F,
    ) where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut data = self.data.lock().await;
        let watchers: Vec<Watcher> = self.watchers.read().clone();
        let prev_views: Vec<Snapshot> = watchers
            .iter()
            .map(|w| snapshot_under(&data, &w.prefix))
            .collect();

        f(&mut data);

        let mut any_closed = false;
        for (watcher, prev) in watchers.iter().zip(prev_views) {
            let next = snapshot_under(&data, &watcher.prefix);
            if prev == next {
                continue;
            }
            let event = WatchEvent {
                prev: Some(prev),
                next: Some(next),
            };
            if watcher.tx.send(event).await.is_err() {
                any_closed = true;
            }
        }
        if any_closed {
            self.watchers.write().retain(|w| !w.tx.is_closed());
        }
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemStore {
    async fn get_all(
        &self,
        prefix: &str,
    ) -> std::result::Result<Snapshot, StoreError> {
        let data = self.data.lock().await;
        Ok(snapshot_under(&data, prefix))
    }

    async fn put(
        &self,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), StoreError> {
        trace!("MemStore put: '{}' -> '{}'", key, value);
        let (key, value) = (key.to_string(), value.to_string());
        self.mutate(|data| {
            data.insert(key, value);
        })
        .await;
        Ok(())
    }

    async fn delete(
        &self,
        key: &str,
    ) -> std::result::Result<(), StoreError> {
        trace!("MemStore delete: '{}'", key);
        let key = key.to_string();
        self.mutate(|data| {
            data.remove(&key);
        })
        .await;
        Ok(())
    }

    async fn delete_by_prefix(
        &self,
        prefix: &str,
    ) -> std::result::Result<(), StoreError> {
        trace!("MemStore delete_by_prefix: '{}'", prefix);
        let prefix = prefix.to_string();
        self.mutate(|data| {
            data.retain(|key, _| !key.starts_with(&prefix));
        })
        .await;
        Ok(())
    }

    async fn watch(
        &self,
        prefix: &str,
    ) -> std::result::Result<mpsc::Receiver<WatchEvent>, StoreError> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

        // Deliver the current state as the first event, before any mutation
        // can race with registration.
        let data = self.data.lock().await;
        let initial = WatchEvent {
            prev: None,
            next: Some(snapshot_under(&data, prefix)),
        };
        tx.send(initial)
            .await
            .map_err(|e| StoreError::WatchRegistration(e.to_string()))?;
        self.watchers.write().push(Watcher {
            prefix: prefix.to_string(),
            tx,
        });

        Ok(rx)
    }
}

/// Listing of all entries under `prefix`. A namespace with no entries is
/// reported as absent, matching remote stores that delete empty namespaces.
fn snapshot_under(
    data: &BTreeMap<String, String>,
    prefix: &str,
) -> Snapshot {
    let entries: Vec<KeyValue> = data
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
        .collect();

    if entries.is_empty() {
        Snapshot::absent()
    } else {
        Snapshot::of(entries)
    }
}

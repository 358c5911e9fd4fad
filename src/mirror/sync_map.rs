//! Mirrored map facade.
//!
//! A map-like contract whose reads are served exclusively from the local
//! mirror and whose writes are applied locally first, then pushed to the
//! remote store according to the configured [`WriteConcern`]. Reads never
//! contact the remote store.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::trace;
use tracing::warn;

use crate::store::prefixed_key;
use crate::MirrorConfig;
use crate::RemoteStore;
use crate::Result;
use crate::WriteConcern;

pub struct SyncMap {
    cache: Arc<DashMap<String, String>>,
    store: Arc<dyn RemoteStore>,
    config: MirrorConfig,

    // Owned so the watch stops when the last handle to the map is dropped.
    watch_task: Option<JoinHandle<()>>,
}

impl SyncMap {
    pub(crate) fn new(
        cache: Arc<DashMap<String, String>>,
        store: Arc<dyn RemoteStore>,
        config: MirrorConfig,
        watch_task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            cache,
            store,
            config,
            watch_task,
        }
    }

    /// Namespace prefix this mirror is bound to.
    pub fn name(&self) -> &str {
        &self.config.map_name
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.cache.contains_key(key)
    }

    pub fn contains_value(
        &self,
        value: &str,
    ) -> bool {
        self.cache.iter().any(|entry| entry.value() == value)
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        self.cache.get(key).map(|entry| entry.value().clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.cache.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn values(&self) -> Vec<String> {
        self.cache.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Insert a key locally and push it to the remote store.
    ///
    /// Returns the previous local value. The local mutation is visible to
    /// subsequent reads before the remote write completes; under
    /// [`WriteConcern::LocalOnly`] a remote failure is logged only.
    pub async fn put(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>> {
        trace!("putting KV: '{}' -> '{}'", key, value);
        let previous = self.cache.insert(key.to_string(), value.to_string());

        let full_key = prefixed_key(&self.config.map_name, key);
        match self.config.write_concern {
            WriteConcern::LocalOnly => {
                let store = Arc::clone(&self.store);
                let value = value.to_string();
                tokio::spawn(async move {
                    if let Err(e) = store.put(&full_key, &value).await {
                        warn!("remote put of '{}' failed: {}", full_key, e);
                    }
                });
            }
            WriteConcern::LocalThenConfirm => {
                self.store.put(&full_key, value).await?;
            }
        }
        Ok(previous)
    }

    /// Remove a key locally and delete it from the remote store.
    pub async fn remove(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        trace!("removing key: '{}'", key);
        let previous = self.cache.remove(key).map(|(_, value)| value);

        let full_key = prefixed_key(&self.config.map_name, key);
        match self.config.write_concern {
            WriteConcern::LocalOnly => {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    if let Err(e) = store.delete(&full_key).await {
                        warn!("remote delete of '{}' failed: {}", full_key, e);
                    }
                });
            }
            WriteConcern::LocalThenConfirm => {
                self.store.delete(&full_key).await?;
            }
        }
        Ok(previous)
    }

    /// Insert a batch locally and push one remote put per entry, unordered.
    ///
    /// Not atomic as a whole: a concurrent reader may observe a
    /// partially-applied batch.
    pub async fn put_all(
        &self,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<()> {
        for (key, value) in entries {
            let full_key = prefixed_key(&self.config.map_name, &key);
            self.cache.insert(key, value.clone());

            match self.config.write_concern {
                WriteConcern::LocalOnly => {
                    let store = Arc::clone(&self.store);
                    tokio::spawn(async move {
                        if let Err(e) = store.put(&full_key, &value).await {
                            warn!("remote put of '{}' failed: {}", full_key, e);
                        }
                    });
                }
                WriteConcern::LocalThenConfirm => {
                    self.store.put(&full_key, &value).await?;
                }
            }
        }
        Ok(())
    }

    /// Empty the local mirror and delete the whole namespace remotely.
    pub async fn clear(&self) -> Result<()> {
        trace!("clearing namespace: '{}'", self.config.map_name);
        self.cache.clear();

        let prefix = self.config.map_name.clone();
        match self.config.write_concern {
            WriteConcern::LocalOnly => {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    if let Err(e) = store.delete_by_prefix(&prefix).await {
                        warn!("remote delete_by_prefix of '{}' failed: {}", prefix, e);
                    }
                });
            }
            WriteConcern::LocalThenConfirm => {
                self.store.delete_by_prefix(&prefix).await?;
            }
        }
        Ok(())
    }
}

impl Drop for SyncMap {
    fn drop(&mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
        }
    }
}

//! Remote key-value store contract.
//!
//! The mirror treats the remote store as an opaque collaborator offering
//! prefix-scoped reads, writes, and a long-lived watch that delivers
//! (previous, next) full-snapshot pairs for every observed change.

mod adaptors;

pub use adaptors::*;

#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::constants::NAMESPACE_SEPARATOR;
use crate::StoreError;

/// One remote entry, keyed by its full (prefixed) remote key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Complete point-in-time listing of a namespace.
///
/// `entries` is `None` when the namespace itself is absent from the remote
/// store, `Some(vec![])` when it exists but holds no entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Option<Vec<KeyValue>>,
}

impl Snapshot {
    pub fn absent() -> Self {
        Self { entries: None }
    }

    pub fn of(entries: Vec<KeyValue>) -> Self {
        Self {
            entries: Some(entries),
        }
    }
}

/// State of the namespace immediately before and after one observed change.
#[derive(Debug, Clone, Default)]
pub struct WatchEvent {
    pub prev: Option<Snapshot>,
    pub next: Option<Snapshot>,
}

/// Remote store seam. All keys passed in are full (prefixed) remote keys.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// Fetch every entry under `prefix`. An absent namespace yields
    /// `Snapshot::absent()`, not an error.
    async fn get_all(
        &self,
        prefix: &str,
    ) -> std::result::Result<Snapshot, StoreError>;

    async fn put(
        &self,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), StoreError>;

    async fn delete(
        &self,
        key: &str,
    ) -> std::result::Result<(), StoreError>;

    async fn delete_by_prefix(
        &self,
        prefix: &str,
    ) -> std::result::Result<(), StoreError>;

    /// Register a long-lived watch on `prefix`. Snapshot pairs arrive in the
    /// order changes occurred and keep flowing until the subscription ends,
    /// signalled by the channel closing.
    async fn watch(
        &self,
        prefix: &str,
    ) -> std::result::Result<mpsc::Receiver<WatchEvent>, StoreError>;
}

/// Remote key for a logical key: `{map_name}/{key}`.
pub(crate) fn prefixed_key(
    map_name: &str,
    key: &str,
) -> String {
    format!("{map_name}{NAMESPACE_SEPARATOR}{key}")
}

/// Logical key for a remote key. Keys outside the namespace pass through
/// unchanged.
pub(crate) fn strip_namespace(
    map_name: &str,
    full_key: &str,
) -> String {
    let prefix = format!("{map_name}{NAMESPACE_SEPARATOR}");
    full_key
        .strip_prefix(&prefix)
        .unwrap_or(full_key)
        .to_string()
}

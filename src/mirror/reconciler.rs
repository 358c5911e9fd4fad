//! Snapshot reconciliation.
//!
//! Turns a (previous, next) snapshot pair into the cache mutations needed to
//! converge the local mirror to the remote state. The diff is a pure function
//! so it can be tested and replayed in isolation; applying the mutations to a
//! cache is a separate step.

use std::collections::HashMap;
use std::collections::HashSet;

use dashmap::DashMap;
use tracing::trace;

use crate::store::strip_namespace;
use crate::DiffStrategy;
use crate::KeyValue;
use crate::Snapshot;

/// One local-cache mutation. Keys are logical (unprefixed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Upsert { key: String, value: String },
    Remove { key: String },
    ClearAll,
}

/// Compute the mutations that converge the mirror from `prev` to `next`.
///
/// An outer `None` means the snapshot itself was absent from the event; a
/// snapshot whose entry list is `None` means the namespace is absent from the
/// remote store. Any (prev, next) shape not covered by the chosen strategy's
/// decision table yields no mutations.
pub fn diff(
    prev: Option<&Snapshot>,
    next: Option<&Snapshot>,
    strategy: DiffStrategy,
    map_name: &str,
) -> Vec<Mutation> {
    match strategy {
        DiffStrategy::SizeHeuristic => size_heuristic_diff(prev, next, map_name),
        DiffStrategy::SymmetricDiff => symmetric_diff(prev, next, map_name),
    }
}

/// Apply mutations to the mirror. Not atomic as a whole: a concurrent reader
/// may observe a partially-applied batch.
pub fn apply(
    cache: &DashMap<String, String>,
    mutations: &[Mutation],
) {
    for mutation in mutations {
        match mutation {
            Mutation::Upsert { key, value } => {
                trace!("reconcile: upsert '{}' -> '{}'", key, value);
                cache.insert(key.clone(), value.clone());
            }
            Mutation::Remove { key } => {
                trace!("reconcile: remove '{}'", key);
                cache.remove(key);
            }
            Mutation::ClearAll => {
                trace!("reconcile: clearing local mirror");
                cache.clear();
            }
        }
    }
}

/// Legacy decision table, branch-selected on snapshot cardinality.
///
/// Equal cardinality is treated as an update pass over all of `next`, so a
/// same-size key replacement leaves the replaced key in the mirror until a
/// later size change. Kept selectable as the compatibility baseline.
fn size_heuristic_diff(
    prev: Option<&Snapshot>,
    next: Option<&Snapshot>,
    map_name: &str,
) -> Vec<Mutation> {
    let prev_list = prev.and_then(|s| s.entries.as_deref());
    let next_list = next.and_then(|s| s.entries.as_deref());

    if prev.is_none() && next.is_some() {
        if let Some(next_entries) = next_list {
            // Initial population: first change observed for this namespace.
            return upsert_all(next_entries, map_name);
        }
    }

    if next.is_none() || next_list.is_none() {
        // Namespace became empty or was deleted.
        return vec![Mutation::ClearAll];
    }

    match (prev_list, next_list) {
        (Some(prev_entries), Some(next_entries)) => {
            if next_entries.len() == prev_entries.len() {
                // Update pass; same-key value changes.
                upsert_all(next_entries, map_name)
            } else if next_entries.len() > prev_entries.len() {
                // Pure additions: entries in next missing from prev.
                let prev_set: HashSet<&KeyValue> = prev_entries.iter().collect();
                next_entries
                    .iter()
                    .filter(|kv| !prev_set.contains(*kv))
                    .map(|kv| Mutation::Upsert {
                        key: strip_namespace(map_name, &kv.key),
                        value: kv.value.clone(),
                    })
                    .collect()
            } else {
                // Pure removals: entries in prev missing from next. The
                // upsert-then-remove pair per entry preserves the legacy
                // mutation sequence; final state is removal.
                let next_set: HashSet<&KeyValue> = next_entries.iter().collect();
                prev_entries
                    .iter()
                    .filter(|kv| !next_set.contains(*kv))
                    .flat_map(|kv| {
                        let key = strip_namespace(map_name, &kv.key);
                        vec![
                            Mutation::Upsert {
                                key: key.clone(),
                                value: kv.value.clone(),
                            },
                            Mutation::Remove { key },
                        ]
                    })
                    .collect()
            }
        }
        // prev snapshot present but its list absent: not covered by the
        // table, explicit no-op.
        _ => Vec::new(),
    }
}

/// Per-key symmetric difference: upsert keys added or changed in `next`,
/// remove keys that vanished from `prev`. Converges for every snapshot pair,
/// including same-cardinality key replacement.
fn symmetric_diff(
    prev: Option<&Snapshot>,
    next: Option<&Snapshot>,
    map_name: &str,
) -> Vec<Mutation> {
    let next_list = match next.and_then(|s| s.entries.as_deref()) {
        Some(list) => list,
        // Namespace became empty or was deleted.
        None => return vec![Mutation::ClearAll],
    };
    // An absent previous snapshot diffs as empty: everything in next is new.
    let prev_list = prev.and_then(|s| s.entries.as_deref()).unwrap_or_default();

    let prev_by_key: HashMap<&str, &str> = prev_list
        .iter()
        .map(|kv| (kv.key.as_str(), kv.value.as_str()))
        .collect();
    let next_keys: HashSet<&str> = next_list.iter().map(|kv| kv.key.as_str()).collect();

    let mut mutations = Vec::new();
    for kv in next_list {
        if prev_by_key.get(kv.key.as_str()).copied() != Some(kv.value.as_str()) {
            mutations.push(Mutation::Upsert {
                key: strip_namespace(map_name, &kv.key),
                value: kv.value.clone(),
            });
        }
    }
    for key in prev_by_key.keys() {
        if !next_keys.contains(key) {
            mutations.push(Mutation::Remove {
                key: strip_namespace(map_name, key),
            });
        }
    }
    mutations
}

fn upsert_all(
    entries: &[KeyValue],
    map_name: &str,
) -> Vec<Mutation> {
    entries
        .iter()
        .map(|kv| Mutation::Upsert {
            key: strip_namespace(map_name, &kv.key),
            value: kv.value.clone(),
        })
        .collect()
}

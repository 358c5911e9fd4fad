//! A write-through in-process mirror of a remote key-value namespace.
//!
//! Reads are served from a local concurrent cache; writes are applied locally
//! first and pushed to the remote store in the background. A long-lived watch
//! subscription delivers full-snapshot pairs that a reconciler folds back into
//! the cache, so the mirror converges to the remote state over time.

mod config;
mod constants;
mod errors;
mod mirror;
mod store;
mod utils;

pub use config::*;
pub use errors::*;
pub use mirror::*;
pub use store::*;

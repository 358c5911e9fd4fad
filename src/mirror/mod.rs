mod reconciler;
mod registry;
mod sync_map;
mod watch;

pub use reconciler::*;
pub use registry::*;
pub use sync_map::*;

#[cfg(test)]
mod sync_map_test;

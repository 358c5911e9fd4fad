// -
// Remote key namespaces

/// Separator between the namespace prefix and the logical key.
pub(crate) const NAMESPACE_SEPARATOR: char = '/';

/// Namespace the mirror binds to when none is configured.
pub(crate) const DEFAULT_MAP_NAME: &str = "__vertx.haInfo";

/// Capacity of the watch event channel. A slow reconciler exerts
/// backpressure on the delivering store rather than dropping events.
pub(crate) const WATCH_CHANNEL_CAPACITY: usize = 64;

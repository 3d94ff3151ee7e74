use std::fmt;
use std::sync::Arc;

use super::config::WatchOptions;
use super::element::ElementId;

/// Identifies one registration made through [`RegionWatcher::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// A crossing notification for a watched element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    /// Element that crossed.
    pub element: ElementId,
    /// Whether it is now inside the margin-adjusted root.
    pub is_intersecting: bool,
    /// Visible fraction of the element, `0.0..=1.0`.
    pub intersection_ratio: f32,
}

/// Receiver of crossing notifications.
pub type VisibilityCallback = Arc<dyn Fn(VisibilityEntry) + Send + Sync>;

/// Region-visibility observation primitive.
///
/// Implementations deliver a [`VisibilityEntry`] through the callback every
/// time the element crosses the configured threshold. Callbacks must be
/// invoked without holding any internal lock: trackers call back into the
/// watcher (and into their scheduler) from inside a notification.
pub trait RegionWatcher: Send + Sync {
    /// Start observing `element`; the callback receives every crossing.
    fn watch(
        &self,
        element: ElementId,
        options: &WatchOptions,
        callback: VisibilityCallback,
    ) -> WatchId;

    /// Release a registration. Unknown or already released ids are ignored.
    fn unwatch(&self, watch: WatchId);
}

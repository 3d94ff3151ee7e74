//! Host-driven watcher: the embedding environment (or a test) reports
//! crossings explicitly.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use tracing::trace;

use super::config::WatchOptions;
use super::element::ElementId;
use super::watcher::{RegionWatcher, VisibilityCallback, VisibilityEntry, WatchId};

struct ManualWatch {
    element: ElementId,
    options: WatchOptions,
    callback: VisibilityCallback,
}

#[derive(Default)]
struct ManualRegistry {
    next_id: u64,
    watches: BTreeMap<WatchId, ManualWatch>,
}

/// Watcher whose crossings are reported by hand.
#[derive(Default)]
pub struct ManualWatcher {
    registry: Mutex<ManualRegistry>,
}

impl fmt::Debug for ManualWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualWatcher")
            .field("active_watches", &self.active_watches())
            .finish_non_exhaustive()
    }
}

impl ManualWatcher {
    /// Watcher with no registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a crossing to every live watch on `element`.
    ///
    /// Returns how many callbacks were invoked.
    pub fn notify(&self, element: ElementId, is_intersecting: bool) -> usize {
        let callbacks: Vec<VisibilityCallback> = {
            let registry = self.registry.lock();
            registry
                .watches
                .values()
                .filter(|watch| watch.element == element)
                .map(|watch| watch.callback.clone())
                .collect()
        };

        trace!(%element, is_intersecting, listeners = callbacks.len(), "manual crossing");

        let entry = VisibilityEntry {
            element,
            is_intersecting,
            intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
        };
        for callback in &callbacks {
            callback(entry);
        }
        callbacks.len()
    }

    /// Report `element` entering the root.
    pub fn enter(&self, element: ElementId) -> usize {
        self.notify(element, true)
    }

    /// Report `element` leaving the root.
    pub fn exit(&self, element: ElementId) -> usize {
        self.notify(element, false)
    }

    /// Number of live registrations.
    pub fn active_watches(&self) -> usize {
        self.registry.lock().watches.len()
    }

    /// Whether any live registration targets `element`.
    pub fn is_watching(&self, element: ElementId) -> bool {
        self.registry
            .lock()
            .watches
            .values()
            .any(|watch| watch.element == element)
    }

    /// Options of the most recent live watch on `element`.
    pub fn options_for(&self, element: ElementId) -> Option<WatchOptions> {
        self.registry
            .lock()
            .watches
            .values()
            .rev()
            .find(|watch| watch.element == element)
            .map(|watch| watch.options)
    }
}

impl RegionWatcher for ManualWatcher {
    fn watch(
        &self,
        element: ElementId,
        options: &WatchOptions,
        callback: VisibilityCallback,
    ) -> WatchId {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = WatchId::new(registry.next_id);
        registry.watches.insert(
            id,
            ManualWatch {
                element,
                options: *options,
                callback,
            },
        );
        id
    }

    fn unwatch(&self, watch: WatchId) {
        self.registry.lock().watches.remove(&watch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn notifies_only_live_watches_for_the_element() {
        let watcher = ManualWatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let first = watcher.watch(
            ElementId::new(1),
            &WatchOptions::default(),
            Arc::new(move |entry| {
                assert!(entry.is_intersecting);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        watcher.watch(
            ElementId::new(2),
            &WatchOptions::default(),
            Arc::new(|_| panic!("wrong element notified")),
        );

        assert_eq!(watcher.enter(ElementId::new(1)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        watcher.unwatch(first);
        assert_eq!(watcher.enter(ElementId::new(1)), 0);
        assert!(!watcher.is_watching(ElementId::new(1)));
        assert_eq!(watcher.active_watches(), 1);
    }

    #[test]
    fn callbacks_may_unwatch_reentrantly() {
        let watcher = Arc::new(ManualWatcher::new());
        let id_slot = Arc::new(Mutex::new(None::<WatchId>));

        let inner_watcher = watcher.clone();
        let inner_slot = id_slot.clone();
        let id = watcher.watch(
            ElementId::new(9),
            &WatchOptions::default(),
            Arc::new(move |_| {
                if let Some(id) = *inner_slot.lock() {
                    inner_watcher.unwatch(id);
                }
            }),
        );
        *id_slot.lock() = Some(id);

        watcher.exit(ElementId::new(9));
        assert_eq!(watcher.active_watches(), 0);
    }
}

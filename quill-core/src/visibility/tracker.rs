use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::config::VisibilityConfig;
use super::element::{ElementId, ElementRef};
use super::phase::ElementPhase;
use super::scheduler::{TimerScheduler, deadline_after};
use super::watcher::{RegionWatcher, VisibilityCallback, VisibilityEntry, WatchId};
use crate::error::VisibilityError;

/// Snapshot read by rendering code to pick animation classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityState {
    /// Whether the element should currently render as shown.
    pub is_visible: bool,
    /// Set once a one-shot tracker has revealed its element; never reset.
    pub has_animated: bool,
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    watch: WatchId,
    element: ElementId,
}

#[derive(Debug)]
struct TrackerInner {
    config: VisibilityConfig,
    state: VisibilityState,
    phase: ElementPhase,
    registration: Option<Registration>,
    // Bumped on every (re)registration and teardown; notifications carrying
    // an older generation are dropped.
    generation: u64,
    mounted: bool,
}

impl TrackerInner {
    fn reveal(&mut self, trigger_once: bool) {
        self.state.is_visible = true;
        if trigger_once {
            self.state.has_animated = true;
        }
        self.phase = ElementPhase::Visible;
    }

    fn is_frozen(&self) -> bool {
        self.config.trigger_once && self.state.has_animated
    }

    fn settle(&mut self) {
        if !self.phase.is_pending() {
            self.phase = ElementPhase::settled(self.state.is_visible);
        }
    }
}

/// Tracks whether a single element is inside the (margin-adjusted) viewport.
///
/// Entering reveals the element, immediately or after `delay`; leaving hides
/// it again when `reverse_on_exit` is set. With `trigger_once` the first
/// reveal is final. Delayed reveals are never cancelled: a reveal scheduled
/// before a quick exit still lands when its timer fires.
pub struct VisibilityTracker {
    inner: Arc<Mutex<TrackerInner>>,
    element: ElementRef,
    watcher: Arc<dyn RegionWatcher>,
    scheduler: Arc<dyn TimerScheduler>,
}

impl fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("element", &self.element)
            .field("state", &self.state())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl VisibilityTracker {
    /// Unmounted tracker with an unbound element. Fails on an invalid threshold.
    pub fn new(
        watcher: Arc<dyn RegionWatcher>,
        scheduler: Arc<dyn TimerScheduler>,
        config: VisibilityConfig,
    ) -> Result<Self, VisibilityError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(TrackerInner {
                config,
                state: VisibilityState::default(),
                phase: ElementPhase::Unobserved,
                registration: None,
                generation: 0,
                mounted: false,
            })),
            element: ElementRef::new(),
            watcher,
            scheduler,
        })
    }

    /// Reference the view binds to its element.
    pub fn element_ref(&self) -> &ElementRef {
        &self.element
    }

    /// Current snapshot.
    pub fn state(&self) -> VisibilityState {
        self.inner.lock().state
    }

    /// Shorthand for `state().is_visible`.
    pub fn is_visible(&self) -> bool {
        self.state().is_visible
    }

    /// Shorthand for `state().has_animated`.
    pub fn has_animated(&self) -> bool {
        self.state().has_animated
    }

    /// Lifecycle of the tracked element.
    pub fn phase(&self) -> ElementPhase {
        self.inner.lock().phase
    }

    /// Active configuration.
    pub fn config(&self) -> VisibilityConfig {
        self.inner.lock().config.clone()
    }

    /// Whether `mount` was called without a later `unmount`.
    pub fn is_mounted(&self) -> bool {
        self.inner.lock().mounted
    }

    /// Current registration, if any.
    pub fn watch_id(&self) -> Option<WatchId> {
        self.inner.lock().registration.map(|r| r.watch)
    }

    /// Register the watch for the currently bound element.
    ///
    /// Without a bound element the tracker stays inactive until the next
    /// `mount` or configuration change. Mounting again replaces the previous
    /// registration.
    pub fn mount(&self) {
        self.release_watch();

        let element = self.element.get();
        let (options, generation) = {
            let mut inner = self.inner.lock();
            inner.mounted = true;
            inner.generation += 1;
            inner.phase = if element.is_some() {
                ElementPhase::Watching
            } else {
                ElementPhase::Unobserved
            };
            (inner.config.watch_options(), inner.generation)
        };

        let Some(element) = element else {
            debug!("visibility tracker mounted without a bound element");
            return;
        };

        let shared = Arc::downgrade(&self.inner);
        let scheduler = self.scheduler.clone();
        let callback: VisibilityCallback = Arc::new(move |entry| {
            if let Some(shared) = shared.upgrade() {
                on_crossing(&shared, &scheduler, generation, entry);
            }
        });

        let watch = self.watcher.watch(element, &options, callback);

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.registration = Some(Registration { watch, element });
            debug!(%element, %watch, "visibility watch registered");
        } else {
            drop(inner);
            self.watcher.unwatch(watch);
        }
    }

    /// Release the watch. Timers already scheduled still fire but no longer
    /// touch the state.
    pub fn unmount(&self) {
        self.release_watch();
        let mut inner = self.inner.lock();
        inner.mounted = false;
        inner.phase = ElementPhase::Unobserved;
    }

    /// Swap the configuration, re-registering the watch when it changed.
    ///
    /// Returns whether anything changed.
    pub fn set_config(
        &self,
        config: VisibilityConfig,
    ) -> Result<bool, VisibilityError> {
        config.validate()?;

        let remount = {
            let mut inner = self.inner.lock();
            if inner.config == config {
                return Ok(false);
            }
            inner.config = config;
            inner.mounted
        };

        if remount {
            self.mount();
        }
        Ok(true)
    }

    fn release_watch(&self) {
        let registration = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.registration.take()
        };

        if let Some(Registration { watch, element }) = registration {
            self.watcher.unwatch(watch);
            debug!(%element, %watch, "visibility watch released");
        }
    }
}

impl Drop for VisibilityTracker {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn on_crossing(
    shared: &Arc<Mutex<TrackerInner>>,
    scheduler: &Arc<dyn TimerScheduler>,
    generation: u64,
    entry: VisibilityEntry,
) {
    let now = scheduler.now();
    let mut inner = shared.lock();
    if inner.generation != generation || !inner.mounted {
        return;
    }

    if !entry.is_intersecting {
        if !inner.is_frozen() && inner.config.reverse_on_exit {
            inner.state.is_visible = false;
            inner.phase = ElementPhase::Hidden;
        } else {
            inner.settle();
        }
        return;
    }

    let delay = inner.config.delay;
    let trigger_once = inner.config.trigger_once;
    if delay.is_zero() {
        inner.reveal(trigger_once);
        return;
    }

    inner.phase = ElementPhase::Pending {
        target: true,
        fire_at: deadline_after(now, delay),
    };
    drop(inner);

    let weak = Arc::downgrade(shared);
    scheduler.schedule(
        delay,
        Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.lock();
            if inner.mounted {
                inner.reveal(trigger_once);
            }
        }),
    );
}

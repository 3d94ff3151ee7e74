use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use super::config::StaggerConfig;
use super::element::ElementId;
use super::phase::ElementPhase;
use super::scheduler::{TimerScheduler, deadline_after};
use super::watcher::{RegionWatcher, VisibilityCallback, VisibilityEntry, WatchId};
use crate::error::VisibilityError;

#[derive(Debug, Clone, Copy)]
struct SlotWatch {
    index: usize,
    element: ElementId,
    watch: WatchId,
}

#[derive(Debug)]
struct StaggerInner {
    states: Vec<bool>,
    phases: Vec<ElementPhase>,
    stagger_delay: Duration,
    watches: Vec<SlotWatch>,
    generation: u64,
    mounted: bool,
}

impl StaggerInner {
    fn slot_delay(&self, index: usize) -> Duration {
        let step = u32::try_from(index).unwrap_or(u32::MAX);
        self.stagger_delay.saturating_mul(step)
    }

    fn resize(&mut self, count: usize) {
        self.states.resize(count, false);
        let phase = if self.mounted {
            ElementPhase::Watching
        } else {
            ElementPhase::Unobserved
        };
        self.phases.resize(count, phase);
    }
}

/// Tracks `count` elements and reveals them as a wave.
///
/// Slot `i` applies each crossing `i × stagger_delay` after it happened, in
/// both directions, so entering reveals top to bottom and leaving hides in
/// the same order. Elements bound after a registration pass are picked up
/// by the next [`mount`](Self::mount) or [`reconfigure`](Self::reconfigure).
pub struct StaggeredVisibilityTracker {
    inner: Arc<Mutex<StaggerInner>>,
    slots: Arc<Mutex<Vec<Option<ElementId>>>>,
    config: StaggerConfig,
    watcher: Arc<dyn RegionWatcher>,
    scheduler: Arc<dyn TimerScheduler>,
}

impl fmt::Debug for StaggeredVisibilityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaggeredVisibilityTracker")
            .field("config", &self.config)
            .field("visible", &self.visible_states())
            .finish_non_exhaustive()
    }
}

impl StaggeredVisibilityTracker {
    /// Tracker with `count` unbound slots. Fails on an invalid threshold.
    pub fn new(
        watcher: Arc<dyn RegionWatcher>,
        scheduler: Arc<dyn TimerScheduler>,
        count: usize,
        stagger_delay: Duration,
        config: StaggerConfig,
    ) -> Result<Self, VisibilityError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(StaggerInner {
                states: vec![false; count],
                phases: vec![ElementPhase::Unobserved; count],
                stagger_delay,
                watches: Vec::new(),
                generation: 0,
                mounted: false,
            })),
            slots: Arc::new(Mutex::new(vec![None; count])),
            config,
            watcher,
            scheduler,
        })
    }

    /// Binder for slot `index`. Indices outside the current count are
    /// ignored when the binder is called.
    pub fn ref_setter(
        &self,
        index: usize,
    ) -> impl Fn(Option<ElementId>) + Send + Sync + 'static {
        let slots = self.slots.clone();
        move |element| {
            if let Some(slot) = slots.lock().get_mut(index) {
                *slot = element;
            }
        }
    }

    /// Visibility of every slot, in index order.
    pub fn visible_states(&self) -> Vec<bool> {
        self.inner.lock().states.clone()
    }

    /// Visibility of one slot; `false` when out of range.
    pub fn is_slot_visible(&self, index: usize) -> bool {
        self.inner.lock().states.get(index).copied().unwrap_or(false)
    }

    /// Lifecycle of one slot.
    pub fn phase(&self, index: usize) -> Option<ElementPhase> {
        self.inner.lock().phases.get(index).copied()
    }

    /// Number of slots.
    pub fn count(&self) -> usize {
        self.inner.lock().states.len()
    }

    /// Per-index delay step.
    pub fn stagger_delay(&self) -> Duration {
        self.inner.lock().stagger_delay
    }

    /// Observation settings.
    pub fn config(&self) -> StaggerConfig {
        self.config
    }

    /// Number of slots currently registered with the watcher.
    pub fn active_slots(&self) -> usize {
        self.inner.lock().watches.len()
    }

    /// Register one watch per bound slot, replacing any previous pass.
    pub fn mount(&self) {
        self.release_watches();

        let bound: Vec<(usize, ElementId)> = self
            .slots
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|element| (index, element)))
            .collect();

        let generation = {
            let mut inner = self.inner.lock();
            inner.mounted = true;
            inner.generation += 1;
            for phase in inner.phases.iter_mut() {
                *phase = ElementPhase::Unobserved;
            }
            for &(index, _) in &bound {
                if let Some(phase) = inner.phases.get_mut(index) {
                    *phase = ElementPhase::Watching;
                }
            }
            inner.generation
        };

        let options = self.config.watch_options();
        let mut registered = Vec::with_capacity(bound.len());
        for (index, element) in bound {
            let shared = Arc::downgrade(&self.inner);
            let scheduler = self.scheduler.clone();
            let callback: VisibilityCallback = Arc::new(move |entry| {
                if let Some(shared) = shared.upgrade() {
                    on_slot_crossing(&shared, &scheduler, generation, index, entry);
                }
            });
            let watch = self.watcher.watch(element, &options, callback);
            registered.push(SlotWatch {
                index,
                element,
                watch,
            });
        }

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            debug!(slots = registered.len(), "staggered watches registered");
            inner.watches = registered;
        } else {
            drop(inner);
            for slot in registered {
                self.watcher.unwatch(slot.watch);
            }
        }
    }

    /// Disconnect every watch. Scheduled transitions still fire but no
    /// longer touch the state.
    pub fn unmount(&self) {
        self.release_watches();
        let mut inner = self.inner.lock();
        inner.mounted = false;
        for phase in inner.phases.iter_mut() {
            *phase = ElementPhase::Unobserved;
        }
    }

    /// Change the slot count or stagger step.
    ///
    /// When either differs, the state vector is resized (new slots start
    /// hidden) and, if mounted, every watch is recreated from the elements
    /// bound right now. Returns whether anything changed.
    pub fn reconfigure(&self, count: usize, stagger_delay: Duration) -> bool {
        let remount = {
            let mut inner = self.inner.lock();
            if inner.states.len() == count && inner.stagger_delay == stagger_delay {
                return false;
            }
            inner.stagger_delay = stagger_delay;
            inner.resize(count);
            inner.mounted
        };
        self.slots.lock().resize(count, None);

        debug!(count, ?stagger_delay, "staggered tracker reconfigured");
        if remount {
            self.mount();
        }
        true
    }

    fn release_watches(&self) {
        let watches = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            std::mem::take(&mut inner.watches)
        };

        if watches.is_empty() {
            return;
        }
        for slot in &watches {
            self.watcher.unwatch(slot.watch);
        }
        debug!(slots = watches.len(), "staggered watches released");
    }
}

impl Drop for StaggeredVisibilityTracker {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn on_slot_crossing(
    shared: &Arc<Mutex<StaggerInner>>,
    scheduler: &Arc<dyn TimerScheduler>,
    generation: u64,
    index: usize,
    entry: VisibilityEntry,
) {
    let target = entry.is_intersecting;
    let now = scheduler.now();
    let delay = {
        let mut inner = shared.lock();
        if inner.generation != generation || !inner.mounted {
            return;
        }
        let delay = inner.slot_delay(index);
        let fire_at = deadline_after(now, delay);
        let Some(phase) = inner.phases.get_mut(index) else {
            return;
        };
        *phase = ElementPhase::Pending { target, fire_at };
        delay
    };

    let weak = Arc::downgrade(shared);
    scheduler.schedule(
        delay,
        Box::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.lock();
            if !inner.mounted {
                return;
            }
            if let Some(state) = inner.states.get_mut(index) {
                *state = target;
            }
            if let Some(phase) = inner.phases.get_mut(index) {
                *phase = ElementPhase::settled(target);
            }
        }),
    );
}

//! Geometry-driven watcher.
//!
//! Elements are registered with their layout rectangles and the host moves
//! the viewport on scroll or resize. Crossings are computed the way browsers
//! compute intersection: the root margin is applied to the viewport, the
//! element counts as intersecting when the rectangles touch and the visible
//! fraction reaches the threshold.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use parking_lot::Mutex;
use tracing::trace;

use super::config::{RootMargin, WatchOptions};
use super::element::ElementId;
use super::watcher::{RegionWatcher, VisibilityCallback, VisibilityEntry, WatchId};

/// Axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width; negative is treated as empty.
    pub width: f32,
    /// Height; negative is treated as empty.
    pub height: f32,
}

impl Rect {
    /// Rectangle from origin and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area, clamped at zero.
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlap of two rectangles. Edge-adjacent rectangles yield a
    /// zero-area intersection rather than `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        (left <= right && top <= bottom)
            .then(|| Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow (or, for negative values, shrink) by `margin`. Percentages
    /// resolve against this rectangle's own size.
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        let top = margin.top.resolve(self.height);
        let right = margin.right.resolve(self.width);
        let bottom = margin.bottom.resolve(self.height);
        let left = margin.left.resolve(self.width);

        Rect::new(
            self.x - left,
            self.y - top,
            (self.width + left + right).max(0.0),
            (self.height + top + bottom).max(0.0),
        )
    }

    /// Shifted copy.
    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

fn measure(
    viewport: &Rect,
    target: Option<&Rect>,
    options: &WatchOptions,
) -> (bool, f32) {
    let Some(target) = target else {
        return (false, 0.0);
    };
    let root = viewport.expand(&options.root_margin);
    let Some(overlap) = root.intersection(target) else {
        return (false, 0.0);
    };

    let ratio = match target.area() {
        area if area > 0.0 => (overlap.area() / area).min(1.0),
        _ => 1.0,
    };
    (ratio >= options.threshold, ratio)
}

struct ViewportWatch {
    element: ElementId,
    options: WatchOptions,
    callback: VisibilityCallback,
    last: bool,
}

struct ViewportState {
    viewport: Rect,
    bounds: HashMap<ElementId, Rect>,
    next_id: u64,
    watches: BTreeMap<WatchId, ViewportWatch>,
}

impl ViewportState {
    /// Recompute every watch and collect the ones whose state flipped.
    fn crossings(&mut self) -> Vec<(VisibilityCallback, VisibilityEntry)> {
        let viewport = self.viewport;
        let bounds = &self.bounds;
        self.watches
            .values_mut()
            .filter_map(|watch| {
                let (is_intersecting, ratio) =
                    measure(&viewport, bounds.get(&watch.element), &watch.options);
                if is_intersecting == watch.last {
                    return None;
                }
                watch.last = is_intersecting;
                Some((
                    watch.callback.clone(),
                    VisibilityEntry {
                        element: watch.element,
                        is_intersecting,
                        intersection_ratio: ratio,
                    },
                ))
            })
            .collect()
    }
}

/// Watcher that derives crossings from element and viewport rectangles.
pub struct ViewportWatcher {
    state: Mutex<ViewportState>,
}

impl fmt::Debug for ViewportWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ViewportWatcher")
            .field("viewport", &state.viewport)
            .field("elements", &state.bounds.len())
            .field("watches", &state.watches.len())
            .finish()
    }
}

impl ViewportWatcher {
    /// Watcher over `viewport` with no known elements.
    pub fn new(viewport: Rect) -> Self {
        Self {
            state: Mutex::new(ViewportState {
                viewport,
                bounds: HashMap::new(),
                next_id: 0,
                watches: BTreeMap::new(),
            }),
        }
    }

    /// Current viewport.
    pub fn viewport(&self) -> Rect {
        self.state.lock().viewport
    }

    /// Number of live registrations.
    pub fn active_watches(&self) -> usize {
        self.state.lock().watches.len()
    }

    /// Record an element's layout box. Returns the number of notifications
    /// delivered.
    pub fn set_element_bounds(&self, element: ElementId, bounds: Rect) -> usize {
        self.update(|state| {
            state.bounds.insert(element, bounds);
        })
    }

    /// Forget an element's layout; its watches report it as not intersecting.
    pub fn remove_element(&self, element: ElementId) -> usize {
        self.update(|state| {
            state.bounds.remove(&element);
        })
    }

    /// Replace the viewport. Returns the number of notifications delivered.
    pub fn set_viewport(&self, viewport: Rect) -> usize {
        self.update(|state| state.viewport = viewport)
    }

    /// Move the viewport origin. Returns the number of notifications delivered.
    pub fn scroll_to(&self, x: f32, y: f32) -> usize {
        self.update(|state| {
            state.viewport.x = x;
            state.viewport.y = y;
        })
    }

    /// Shift the viewport. Returns the number of notifications delivered.
    pub fn scroll_by(&self, dx: f32, dy: f32) -> usize {
        self.update(|state| state.viewport = state.viewport.translate(dx, dy))
    }

    fn update(&self, change: impl FnOnce(&mut ViewportState)) -> usize {
        let crossings = {
            let mut state = self.state.lock();
            change(&mut state);
            state.crossings()
        };
        dispatch(crossings)
    }
}

fn dispatch(crossings: Vec<(VisibilityCallback, VisibilityEntry)>) -> usize {
    for (callback, entry) in &crossings {
        trace!(
            element = %entry.element,
            is_intersecting = entry.is_intersecting,
            ratio = entry.intersection_ratio,
            "viewport crossing"
        );
        callback(*entry);
    }
    crossings.len()
}

impl RegionWatcher for ViewportWatcher {
    /// Registers the watch and immediately reports the element's current
    /// state, like a freshly created intersection observer.
    fn watch(
        &self,
        element: ElementId,
        options: &WatchOptions,
        callback: VisibilityCallback,
    ) -> WatchId {
        let (id, initial) = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = WatchId::new(state.next_id);
            let (is_intersecting, ratio) =
                measure(&state.viewport, state.bounds.get(&element), options);
            state.watches.insert(
                id,
                ViewportWatch {
                    element,
                    options: *options,
                    callback: callback.clone(),
                    last: is_intersecting,
                },
            );
            let entry = VisibilityEntry {
                element,
                is_intersecting,
                intersection_ratio: ratio,
            };
            (id, (callback, entry))
        };

        dispatch(vec![initial]);
        id
    }

    fn unwatch(&self, watch: WatchId) {
        self.state.lock().watches.remove(&watch);
    }
}

//! Scroll-triggered visibility tracking.
//!
//! Two trackers turn region-visibility notifications into animation state:
//!
//! - [`VisibilityTracker`] follows one element and exposes `is_visible`
//!   together with a sticky `has_animated` flag.
//! - [`StaggeredVisibilityTracker`] follows N elements, delaying slot `i`'s
//!   transitions by `i × stagger_delay` so sections reveal (and hide) as a
//!   wave.
//!
//! Neither tracker talks to a rendering environment directly. Notifications
//! come from a [`RegionWatcher`] and delays run on a [`TimerScheduler`], so the
//! same state machines run in a browser bridge, a native UI, or a test.

/// Thresholds, root margins and tracker settings.
pub mod config;
/// Element handles.
pub mod element;
pub mod manual;
/// Per-element lifecycle.
pub mod phase;
/// Timer port and its Tokio and virtual-clock adapters.
pub mod scheduler;
/// Multi-element wave tracker.
pub mod staggered;
/// Single-element tracker.
pub mod tracker;
pub mod viewport;
/// Region watcher port.
pub mod watcher;

pub use config::{
    DEFAULT_ROOT_MARGIN, DEFAULT_THRESHOLD, MarginValue, RootMargin,
    StaggerConfig, VisibilityConfig, WatchOptions,
};
pub use element::{ElementId, ElementRef};
pub use manual::ManualWatcher;
pub use phase::ElementPhase;
pub use scheduler::{
    ManualScheduler, TimerScheduler, TimerTask, TokioScheduler, deadline_after,
};
pub use staggered::StaggeredVisibilityTracker;
pub use tracker::{VisibilityState, VisibilityTracker};
pub use viewport::{Rect, ViewportWatcher};
pub use watcher::{RegionWatcher, VisibilityCallback, VisibilityEntry, WatchId};

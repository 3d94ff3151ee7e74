//! # Quill Core
//!
//! Core library for Quill, a small journaling companion. It provides the two
//! feature sets the rest of the workspace builds on:
//!
//! - **Mood reflections**: a [`reflection::MoodReflector`] that forwards a
//!   journal entry to an injected [`reflection::CompletionProvider`] and turns
//!   the answer (or any failure) into a [`reflection::MoodAnalysis`].
//! - **Scroll visibility**: host-independent trackers
//!   ([`visibility::VisibilityTracker`] and
//!   [`visibility::StaggeredVisibilityTracker`]) that drive reveal/hide
//!   animations from region-visibility notifications and timers.
//!
//! ## Architecture
//!
//! Everything that touches the outside world sits behind a trait so it can be
//! swapped for a deterministic fake:
//!
//! - [`reflection::CompletionProvider`]: the upstream chat completion API
//! - [`visibility::RegionWatcher`]: the intersection-observation primitive
//! - [`visibility::TimerScheduler`]: delayed callbacks
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use quill_core::visibility::{
//!     ElementId, ManualScheduler, ManualWatcher, VisibilityConfig,
//!     VisibilityTracker,
//! };
//!
//! let watcher = Arc::new(ManualWatcher::new());
//! let scheduler = Arc::new(ManualScheduler::new());
//! let config = VisibilityConfig::default().with_delay(Duration::from_millis(150));
//!
//! let tracker =
//!     VisibilityTracker::new(watcher.clone(), scheduler.clone(), config)?;
//! tracker.element_ref().bind(ElementId::new(7));
//! tracker.mount();
//!
//! watcher.enter(ElementId::new(7));
//! assert!(!tracker.is_visible());
//!
//! scheduler.advance(Duration::from_millis(150));
//! assert!(tracker.is_visible());
//! # Ok::<(), quill_core::error::VisibilityError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Error types shared by the reflection and visibility modules
pub mod error;

/// Journal mood reflections backed by a chat completion provider
pub mod reflection;

/// Scroll-triggered visibility tracking
pub mod visibility;

pub use error::{ReflectionError, VisibilityError};

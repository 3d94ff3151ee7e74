use std::time::Instant;

/// Lifecycle of one tracked element.
///
/// ```text
/// Unobserved --bind + mount--> Watching
/// Watching | Visible | Hidden --crossing--> Pending --delay--> Visible | Hidden
/// Watching | Visible | Hidden --crossing (no delay)--> Visible | Hidden
/// any --unmount--> Unobserved
/// ```
///
/// `Visible` is final for state purposes once a one-shot tracker has fired;
/// the watch itself stays registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementPhase {
    /// Not registered with a watcher.
    #[default]
    Unobserved,
    /// Registered, no crossing seen yet.
    Watching,
    /// A transition is scheduled.
    Pending {
        /// Visibility the transition applies.
        target: bool,
        /// When the timer is due.
        fire_at: Instant,
    },
    /// Last applied transition revealed the element.
    Visible,
    /// Last applied transition hid the element.
    Hidden,
}

impl ElementPhase {
    /// `Visible` or `Hidden`.
    pub fn settled(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::Hidden }
    }

    /// Anything but `Unobserved`.
    pub fn is_observed(&self) -> bool {
        !matches!(self, Self::Unobserved)
    }

    /// Whether a transition is scheduled.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Opaque handle to a UI node owned by the consuming view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a host-assigned id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The host-assigned id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Late-bound reference to an element.
///
/// Views hand out clones of the same reference and bind it once layout has
/// produced the node. Trackers read it when they register their watch.
#[derive(Clone, Default)]
pub struct ElementRef {
    slot: Arc<Mutex<Option<ElementId>>>,
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.get()).finish()
    }
}

impl ElementRef {
    /// Unbound reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind or clear.
    pub fn set(&self, element: Option<ElementId>) {
        *self.slot.lock() = element;
    }

    /// Bind to `element`.
    pub fn bind(&self, element: ElementId) {
        self.set(Some(element));
    }

    /// Drop the binding.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Currently bound element.
    pub fn get(&self) -> Option<ElementId> {
        *self.slot.lock()
    }

    /// Whether an element is bound.
    pub fn is_bound(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_binding() {
        let reference = ElementRef::new();
        let view_side = reference.clone();
        assert!(!reference.is_bound());

        view_side.bind(ElementId::new(3));
        assert_eq!(reference.get(), Some(ElementId::new(3)));

        reference.clear();
        assert_eq!(view_side.get(), None);
    }
}

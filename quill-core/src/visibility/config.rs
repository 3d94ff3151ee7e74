use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::VisibilityError;

/// Fraction of an element that must be inside the root to count as visible.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Default root inset: trigger 100px before the element reaches the bottom
/// edge of the viewport.
pub const DEFAULT_ROOT_MARGIN: &str = "0px 0px -100px 0px";

/// One side of a [`RootMargin`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    /// Absolute pixels.
    Px(f32),
    /// Percentage of the root's extent on that axis.
    Percent(f32),
}

impl MarginValue {
    /// Absolute inset for a root whose extent on this axis is `extent`.
    pub fn resolve(self, extent: f32) -> f32 {
        match self {
            MarginValue::Px(px) => px,
            MarginValue::Percent(pct) => extent * pct / 100.0,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        if let Some(px) = token.strip_suffix("px") {
            return px.parse().ok().filter(|v: &f32| v.is_finite()).map(Self::Px);
        }
        if let Some(pct) = token.strip_suffix('%') {
            return pct
                .parse()
                .ok()
                .filter(|v: &f32| v.is_finite())
                .map(Self::Percent);
        }
        match token.parse::<f32>() {
            Ok(zero) if zero == 0.0 => Some(Self::Px(0.0)),
            _ => None,
        }
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Px(px) => write!(f, "{px}px"),
            MarginValue::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// CSS-style inset applied to the root before intersection is computed.
///
/// Positive values grow the root, negative values shrink it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    /// Top inset.
    pub top: MarginValue,
    /// Right inset.
    pub right: MarginValue,
    /// Bottom inset.
    pub bottom: MarginValue,
    /// Left inset.
    pub left: MarginValue,
}

impl RootMargin {
    /// No inset.
    pub const ZERO: Self = Self::uniform(MarginValue::Px(0.0));

    /// Same inset on every side.
    pub const fn uniform(value: MarginValue) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Parse the CSS margin shorthand (1 to 4 values, each `px` or `%`).
    pub fn parse(input: &str) -> Result<Self, VisibilityError> {
        let invalid = |reason: &str| VisibilityError::InvalidRootMargin {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let values = input
            .split_whitespace()
            .map(|token| {
                MarginValue::parse(token).ok_or_else(|| {
                    invalid(&format!(
                        "'{token}' is not a pixel or percentage length"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => {
                (*vertical, *horizontal, *vertical, *horizontal)
            }
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            [] => return Err(invalid("expected at least one value")),
            _ => return Err(invalid("expected at most four values")),
        };

        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: MarginValue::Px(0.0),
            right: MarginValue::Px(0.0),
            bottom: MarginValue::Px(-100.0),
            left: MarginValue::Px(0.0),
        }
    }
}

impl FromStr for RootMargin {
    type Err = VisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// What a [`RegionWatcher`](super::RegionWatcher) needs to observe an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Visible fraction that counts as intersecting.
    pub threshold: f32,
    /// Inset applied to the root.
    pub root_margin: RootMargin,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
        }
    }
}

fn validate_threshold(threshold: f32) -> Result<(), VisibilityError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(VisibilityError::InvalidThreshold(threshold))
    }
}

/// Configuration of a single-element [`VisibilityTracker`](super::VisibilityTracker).
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityConfig {
    /// Visible fraction that counts as intersecting.
    pub threshold: f32,
    /// Inset applied to the root.
    pub root_margin: RootMargin,
    /// Freeze `is_visible` once the element has been revealed.
    pub trigger_once: bool,
    /// Delay applied to the reveal; hides are never delayed.
    pub delay: Duration,
    /// Hide again when the element leaves the root.
    pub reverse_on_exit: bool,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
            trigger_once: false,
            delay: Duration::ZERO,
            reverse_on_exit: true,
        }
    }
}

impl VisibilityConfig {
    /// Set the threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the root margin.
    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    /// Set `trigger_once`.
    pub fn with_trigger_once(mut self, trigger_once: bool) -> Self {
        self.trigger_once = trigger_once;
        self
    }

    /// Set the reveal delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set `reverse_on_exit`.
    pub fn with_reverse_on_exit(mut self, reverse_on_exit: bool) -> Self {
        self.reverse_on_exit = reverse_on_exit;
        self
    }

    /// Check the threshold is within `[0, 1]`.
    pub fn validate(&self) -> Result<(), VisibilityError> {
        validate_threshold(self.threshold)
    }

    /// Options handed to the watcher.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            threshold: self.threshold,
            root_margin: self.root_margin,
        }
    }
}

/// Observation settings shared by every slot of a
/// [`StaggeredVisibilityTracker`](super::StaggeredVisibilityTracker).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaggerConfig {
    /// Visible fraction that counts as intersecting.
    pub threshold: f32,
    /// Inset applied to the root.
    pub root_margin: RootMargin,
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
        }
    }
}

impl StaggerConfig {
    /// Check the threshold is within `[0, 1]`.
    pub fn validate(&self) -> Result<(), VisibilityError> {
        validate_threshold(self.threshold)
    }

    /// Options handed to the watcher for every slot.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            threshold: self.threshold,
            root_margin: self.root_margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_margin_matches_the_shorthand() {
        assert_eq!(
            RootMargin::parse(DEFAULT_ROOT_MARGIN).unwrap(),
            RootMargin::default()
        );
        assert_eq!(RootMargin::default().to_string(), "0px 0px -100px 0px");
    }

    #[test]
    fn shorthand_expands_like_css() {
        let one = RootMargin::parse("10px").unwrap();
        assert_eq!(one, RootMargin::uniform(MarginValue::Px(10.0)));

        let two = RootMargin::parse("5px 10%").unwrap();
        assert_eq!(two.top, MarginValue::Px(5.0));
        assert_eq!(two.bottom, MarginValue::Px(5.0));
        assert_eq!(two.left, MarginValue::Percent(10.0));
        assert_eq!(two.right, MarginValue::Percent(10.0));

        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(three.top, MarginValue::Px(1.0));
        assert_eq!(three.right, MarginValue::Px(2.0));
        assert_eq!(three.bottom, MarginValue::Px(3.0));
        assert_eq!(three.left, MarginValue::Px(2.0));

        let bare_zero = RootMargin::parse("0 -20px").unwrap();
        assert_eq!(bare_zero.top, MarginValue::Px(0.0));
        assert_eq!(bare_zero.left, MarginValue::Px(-20.0));
    }

    #[test]
    fn rejects_malformed_margins() {
        for input in ["", "10", "1px 2px 3px 4px 5px", "10em", "px", "NaNpx"] {
            assert!(
                matches!(
                    RootMargin::parse(input),
                    Err(VisibilityError::InvalidRootMargin { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn percent_resolves_against_extent() {
        assert_eq!(MarginValue::Percent(25.0).resolve(800.0), 200.0);
        assert_eq!(MarginValue::Px(-100.0).resolve(800.0), -100.0);
    }

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(VisibilityConfig::default().validate().is_ok());
        assert!(VisibilityConfig::default().with_threshold(1.0).validate().is_ok());
        assert_eq!(
            VisibilityConfig::default().with_threshold(1.5).validate(),
            Err(VisibilityError::InvalidThreshold(1.5))
        );
        assert!(
            StaggerConfig {
                threshold: f32::NAN,
                ..StaggerConfig::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn defaults_follow_the_scroll_animation_conventions() {
        let config = VisibilityConfig::default();
        assert_eq!(config.threshold, 0.1);
        assert!(!config.trigger_once);
        assert_eq!(config.delay, Duration::ZERO);
        assert!(config.reverse_on_exit);
        assert_eq!(config.watch_options(), WatchOptions::default());
    }
}

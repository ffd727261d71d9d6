//! Clamped numeric windows
//!
//! Two models back the console's range widgets:
//! - [`PosRange`] - a window described by a position (lower endpoint) and a
//!   width, each moved independently. Used for trial frame ranges and for
//!   view-dimension windowing.
//! - [`WindowRange`] - a plain two-endpoint window whose width is forced into
//!   `[range_min, range_max]` when either endpoint is dragged.
//!
//! Both keep `total_min <= value_min <= value_max <= total_max` at all times.

use serde::{Deserialize, Serialize};

/// Tolerance used to decide whether a floating step is integral
pub const INT_STEP_TOLERANCE: f64 = 1e-12;

/// Delay before a clamped [`WindowRange`] pushes its corrected values back to
/// the widget, so the widget can finish its own update cycle first.
pub const DEFERRED_RESET_MS: u64 = 200;

/// Whether `step` is numerically integral.
///
/// Integral steps make the upper endpoint inclusive: a window of width 3
/// starting at 1 covers `1..=3`.
pub fn has_int_step(step: f64) -> bool {
    // Distance to the nearest integer, so 0.9999999999999 counts as well
    (step - step.round()).abs() < INT_STEP_TOLERANCE
}

/// Display arrangement of the position and width controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosRangeStyle {
    /// Position and width side by side
    #[default]
    Row,
    /// Width below position
    Stacked,
    /// A single two-handle window
    Integrated,
}

/// Construction parameters for [`PosRange`]
#[derive(Debug, Clone, PartialEq)]
pub struct PosRangeConfig {
    pub total_min: f64,
    pub total_max: f64,
    pub value_min: f64,
    pub value_max: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub step: f64,
    pub label: String,
    pub style: PosRangeStyle,
    /// Move the position in steps of the current width (page-wise)
    pub use_range_step: bool,
}

impl Default for PosRangeConfig {
    fn default() -> Self {
        Self {
            total_min: 0.0,
            total_max: 1.0,
            value_min: 0.0,
            value_max: 1.0,
            range_min: 1.0,
            range_max: 1.0,
            step: 1.0,
            label: "Value".to_string(),
            style: PosRangeStyle::Row,
            use_range_step: false,
        }
    }
}

/// A window `[value_min, value_max]` inside `[total_min, total_max]` steered by
/// a position and a width.
#[derive(Debug, Clone, PartialEq)]
pub struct PosRange {
    total_min: f64,
    total_max: f64,
    value_min: f64,
    value_max: f64,
    width: f64,
    range_min: f64,
    range_max: f64,
    step: f64,
    int_step: bool,
    use_range_step: bool,
    label: String,
    style: PosRangeStyle,
}

impl PosRange {
    pub fn new(config: PosRangeConfig) -> Self {
        let (range_min, range_max) = if config.range_min > config.range_max {
            (config.range_max, config.range_min)
        } else {
            (config.range_min, config.range_max)
        };
        let step = if config.step > 0.0 { config.step } else { 1.0 };
        let (total_min, total_max) = if config.total_min > config.total_max {
            (config.total_max, config.total_min)
        } else {
            (config.total_min, config.total_max)
        };

        let mut range = Self {
            total_min,
            total_max,
            value_min: config.value_min.clamp(total_min, total_max),
            value_max: config.value_max.clamp(total_min, total_max),
            width: 0.0,
            range_min,
            range_max,
            step,
            int_step: has_int_step(step),
            use_range_step: config.use_range_step,
            label: config.label,
            style: config.style,
        };

        let width = range.value_max - range.value_min + range.inclusive_extra();
        range.width = range.clamp_width(width);
        range.value_max = range.value_min + range.width - range.inclusive_extra();
        if range.value_max > range.total_max {
            range.value_max = range.total_max;
            range.value_min = range.total_max - range.width + range.inclusive_extra();
        }
        range
    }

    /// Extra amount added to a width for inclusive (integral) windows
    fn inclusive_extra(&self) -> f64 {
        if self.int_step {
            self.step
        } else {
            0.0
        }
    }

    /// Largest width the total span can hold
    fn max_span(&self) -> f64 {
        self.total_max - self.total_min + self.inclusive_extra()
    }

    fn clamp_width(&self, width: f64) -> f64 {
        let upper = self.range_max.min(self.max_span());
        let lower = self.range_min.min(upper);
        width.clamp(lower, upper)
    }

    fn snap(&self, value: f64) -> f64 {
        self.total_min + ((value - self.total_min) / self.step).round() * self.step
    }

    pub fn value_min(&self) -> f64 {
        self.value_min
    }

    pub fn value_max(&self) -> f64 {
        self.value_max
    }

    /// Position of the window (its lower endpoint)
    pub fn position(&self) -> f64 {
        self.value_min
    }

    /// Width of the window, counted inclusively for integral steps
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn total_min(&self) -> f64 {
        self.total_min
    }

    pub fn total_max(&self) -> f64 {
        self.total_max
    }

    pub fn range_min(&self) -> f64 {
        self.range_min
    }

    pub fn range_max(&self) -> f64 {
        self.range_max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn has_int_step(&self) -> bool {
        self.int_step
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn style(&self) -> PosRangeStyle {
        self.style
    }

    /// Upper limit for the position at the current width
    pub fn position_max(&self) -> f64 {
        let pos_max = self.total_max - self.width + self.inclusive_extra();
        pos_max.min(self.total_max).max(self.total_min)
    }

    /// Step size of the position control
    pub fn position_step(&self) -> f64 {
        if self.use_range_step {
            self.width
        } else {
            self.step
        }
    }

    /// Move the lower endpoint, keeping the width.
    ///
    /// The position is clamped so the upper endpoint never passes
    /// `total_max`; both endpoints shift down together when it would.
    pub fn set_position(&mut self, position: f64) {
        let pos = self.snap(position).clamp(self.total_min, self.position_max());
        self.value_min = pos;
        self.value_max = (pos + self.width - self.inclusive_extra()).min(self.total_max);
    }

    /// Change the width, keeping the lower endpoint where possible.
    ///
    /// If the new upper endpoint would pass `total_max`, the lower endpoint
    /// is pulled back so the width is still honoured exactly.
    pub fn set_width(&mut self, width: f64) {
        self.width = self.clamp_width(width);
        self.value_max = self.value_min + self.width - self.inclusive_extra();
        if self.value_max > self.total_max {
            self.value_max = self.total_max;
            self.value_min = self.total_max - self.width + self.inclusive_extra();
        }
        self.value_min = self.value_min.min(self.position_max());
    }

    /// Set both endpoints at once.
    ///
    /// Endpoints are clamped into the total bounds and truncated to the step
    /// grid; the resulting width is then forced into the width limits.
    pub fn set_values(&mut self, value_min: f64, value_max: f64) {
        let lo = value_min.max(self.total_min);
        let hi = value_max.min(self.total_max);
        let lo = (lo / self.step).trunc() * self.step;
        let hi = (hi / self.step).trunc() * self.step;
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };

        self.value_min = lo.max(self.total_min);
        self.set_width(hi - lo + self.inclusive_extra());
        self.set_position(lo);
    }

    /// Apply a change coming from an integrated two-handle control.
    ///
    /// Returns whether the width changed (as opposed to a pure move).
    pub fn set_window(&mut self, value_min: f64, value_max: f64) -> bool {
        let width_changed = (self.value_min - value_min).abs() < f64::EPSILON;
        let lo = value_min.clamp(self.total_min, self.total_max);
        let hi = value_max.clamp(lo, self.total_max);
        self.value_min = lo;
        self.set_width(hi - lo + self.inclusive_extra());
        width_changed
    }

    /// Badge text for the position control
    pub fn position_text(&self) -> String {
        if self.int_step {
            format!(
                "{}: {} to {} from [{}, {}]",
                self.label,
                self.value_min as i64,
                self.value_max as i64,
                self.total_min as i64,
                self.total_max as i64
            )
        } else {
            format!(
                "{}: {} to {} from [{}, {}]",
                self.label, self.value_min, self.value_max, self.total_min, self.total_max
            )
        }
    }

    /// Badge text for the width control
    pub fn width_text(&self) -> String {
        if self.int_step {
            format!("{} Count: {}", self.label, self.width as i64)
        } else {
            format!("{} Range: {}", self.label, self.width)
        }
    }

    /// Zero-based inclusive index window, for integral 1-based ranges
    pub fn index_window(&self) -> (usize, usize) {
        let lo = (self.value_min - 1.0).max(0.0) as usize;
        let hi = (self.value_max - 1.0).max(0.0) as usize;
        (lo, hi.max(lo))
    }
}

/// Outcome of a [`WindowRange::set`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowUpdate {
    pub value_min: f64,
    pub value_max: f64,
    pub min_changed: bool,
    pub max_changed: bool,
    /// The requested values were corrected; the widget has to be reset to
    /// the stored values after [`DEFERRED_RESET_MS`].
    pub needs_reset: bool,
}

/// Two-endpoint window with optional width limits
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRange {
    total_min: f64,
    total_max: f64,
    value_min: f64,
    value_max: f64,
    step: f64,
    min_width: Option<f64>,
    max_width: Option<f64>,
}

impl WindowRange {
    pub fn new(
        total_min: f64,
        total_max: f64,
        value_min: f64,
        value_max: f64,
        step: f64,
        min_width: Option<f64>,
        max_width: Option<f64>,
    ) -> Self {
        let (min_width, max_width) = match (min_width, max_width) {
            (Some(a), Some(b)) if a > b => (Some(b), Some(a)),
            other => other,
        };
        Self {
            total_min,
            total_max,
            value_min: value_min.clamp(total_min, total_max),
            value_max: value_max.clamp(total_min, total_max),
            step,
            min_width,
            max_width,
        }
    }

    pub fn value_min(&self) -> f64 {
        self.value_min
    }

    pub fn value_max(&self) -> f64 {
        self.value_max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Apply endpoints requested by the user.
    ///
    /// When the width leaves its limits, the endpoint that was moved is kept
    /// and the other one follows; if that pushes past the total bounds the
    /// window is pinned to the bound instead.
    pub fn set(&mut self, value_min: f64, value_max: f64) -> WindowUpdate {
        let mut lo = value_min.clamp(self.total_min, self.total_max);
        let mut hi = value_max.clamp(self.total_min, self.total_max);
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        let min_changed = lo != self.value_min;
        let max_changed = hi != self.value_max;
        let width = hi - lo;

        let limit = match (self.min_width, self.max_width) {
            (Some(min_w), _) if min_w > width => Some(min_w),
            (_, Some(max_w)) if max_w < width => Some(max_w),
            _ => None,
        };

        if let Some(w) = limit {
            if min_changed {
                hi = lo + w;
                if hi > self.total_max {
                    hi = self.total_max;
                    lo = self.total_max - w;
                }
            } else {
                lo = hi - w;
                if lo < self.total_min {
                    lo = self.total_min;
                    hi = self.total_min + w;
                }
            }
        }

        self.value_min = lo;
        self.value_max = hi;

        WindowUpdate {
            value_min: lo,
            value_max: hi,
            min_changed,
            max_changed,
            needs_reset: limit.is_some(),
        }
    }
}

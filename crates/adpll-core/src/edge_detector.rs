//! # Edge Detector
//!
//! Registers one delayed sample of a single-bit input and reports a rising
//! transition when the current sample is high and the registered one is
//! low. No debouncing: every sampled 0 → 1 transition counts.
//!
//! ## Example
//!
//! ```rust
//! use adpll_core::edge_detector::EdgeDetector;
//!
//! let det = EdgeDetector::default();
//! let (det, edge) = det.sample(true);
//! assert!(edge);
//! let (_, edge) = det.sample(true);
//! assert!(!edge);
//! ```

/// Single-bit rising-edge detector.
///
/// The detector is a plain value: [`EdgeDetector::sample`] returns the next
/// state instead of mutating, so a tick can evaluate every component against
/// the previous settled state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    /// Sample the input for one tick.
    ///
    /// Returns the next detector state and whether a rising edge occurred.
    #[inline]
    pub fn sample(self, level: bool) -> (Self, bool) {
        (Self { prev: level }, level && !self.prev)
    }

    /// Level registered on the previous tick.
    pub fn previous(&self) -> bool {
        self.prev
    }
}

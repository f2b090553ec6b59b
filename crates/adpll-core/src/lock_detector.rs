//! # Lock Detector
//!
//! Windowed net-error lock indicator. Over each window of `lock_window`
//! ticks the signed, magnitude-weighted phase error is summed; at the end of the window the
//! loop is declared locked when the absolute net error is within
//! `lock_threshold` and at least one reference edge was seen. At lock a
//! bang-bang loop dithers around the target, so the signed sum stays small
//! while the per-tick error does not.

use crate::config::CoreConfig;
use crate::phase_detector::Comparison;

/// Lock detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockDetector {
    /// Ticks elapsed in the current window
    count: u16,
    /// Signed error sum in the current window
    net: i32,
    /// Reference edges in the current window
    ref_edges: u16,
    /// Verdict from the last completed window
    locked: bool,
}

impl LockDetector {
    /// Accumulate one tick.
    pub fn update(self, config: &CoreConfig, ref_edge: bool, error: impl Into<Comparison>) -> Self {
        let count = self.count + 1;
        let net = self.net + error.into().weight();
        let ref_edges = self.ref_edges.saturating_add(ref_edge as u16);

        if count >= config.lock_window {
            Self {
                count: 0,
                net: 0,
                ref_edges: 0,
                locked: ref_edges > 0 && net.unsigned_abs() <= config.lock_threshold as u32,
            }
        } else {
            Self {
                count,
                net,
                ref_edges,
                locked: self.locked,
            }
        }
    }

    /// Verdict from the last completed window.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Net error accumulated so far in the current window.
    pub fn net_error(&self) -> i32 {
        self.net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase_detector::PhaseError;

    fn cfg(window: u16, threshold: u16) -> CoreConfig {
        CoreConfig {
            lock_window: window,
            lock_threshold: threshold,
            ..Default::default()
        }
    }

    #[test]
    fn test_dithering_error_locks() {
        let cfg = cfg(8, 1);
        let mut det = LockDetector::default();
        for i in 0..8 {
            let err = if i % 2 == 0 { PhaseError::Lag } else { PhaseError::Lead };
            det = det.update(&cfg, i % 2 == 0, err);
        }
        assert!(det.is_locked());
        assert_eq!(det.net_error(), 0);
    }

    #[test]
    fn test_sustained_error_unlocks() {
        let cfg = cfg(8, 1);
        let mut det = LockDetector::default();
        for _ in 0..8 {
            det = det.update(&cfg, true, PhaseError::Lag);
        }
        assert!(!det.is_locked());
    }

    #[test]
    fn test_silent_reference_never_locks() {
        let cfg = cfg(4, 2);
        let mut det = LockDetector::default();
        for _ in 0..16 {
            det = det.update(&cfg, false, PhaseError::InPhase);
        }
        assert!(!det.is_locked());
    }

    #[test]
    fn test_verdict_held_mid_window() {
        let cfg = cfg(4, 0);
        let mut det = LockDetector::default();
        for err in [PhaseError::Lag, PhaseError::Lead, PhaseError::InPhase, PhaseError::InPhase] {
            det = det.update(&cfg, true, err);
        }
        assert!(det.is_locked());
        det = det.update(&cfg, true, PhaseError::Lag);
        assert!(det.is_locked());
        assert_eq!(det.net_error(), 1);
    }

    #[test]
    fn test_magnitude_counts_toward_net() {
        let cfg = cfg(4, 2);
        let mut det = LockDetector::default();
        det = det.update(&cfg, true, Comparison::new(PhaseError::Lag, 3));
        assert_eq!(det.net_error(), 3);
        for _ in 0..3 {
            det = det.update(&cfg, false, Comparison::IN_PHASE);
        }
        assert!(!det.is_locked());
    }
}

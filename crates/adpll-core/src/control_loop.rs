//! # DCO Control Loop
//!
//! First-order integrating loop filter driving the DCO control word:
//!
//! ```text
//!   ControlWord ← clamp(ControlWord + gain × sign(PhaseError) × magnitude)
//! ```
//!
//! The integration saturates at the signed control-word range; it never
//! wraps. The loop only integrates while tracking. Before the first
//! reference edge (and after the reference has been silent for the
//! configured timeout) the loop is free-running and the control word holds.
//!
//! ## States
//!
//! ```text
//!            reset released, enabled          reference edge
//!   RESET ───────────────────────────► FREE_RUN ──────────────► TRACKING
//!     ▲                                   ▲                        │
//!     │ rst_n = 0 (from any state)        └────────────────────────┘
//!                                          reference timeout (holdover)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::phase_detector::Comparison;

/// Control loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopState {
    /// Held in reset, or not yet enabled after reset
    Reset,
    /// Oscillating at the held control word, loop inactive
    FreeRun,
    /// Integrating phase error toward lock
    Tracking,
}

impl Default for LoopState {
    fn default() -> Self {
        LoopState::Reset
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Reset => write!(f, "RESET"),
            LoopState::FreeRun => write!(f, "FREE_RUN"),
            LoopState::Tracking => write!(f, "TRACKING"),
        }
    }
}

/// Loop filter state: control word plus the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlLoop {
    state: LoopState,
    control_word: i32,
    /// Ticks since the last reference edge while tracking
    since_reference: u32,
}

impl ControlLoop {
    /// Saturating integration step, independent of loop state.
    #[inline]
    pub fn integrate(config: &CoreConfig, control_word: i32, gain: u8, error: impl Into<Comparison>) -> i32 {
        let delta = gain as i32 * error.into().weight();
        control_word
            .saturating_add(delta)
            .clamp(config.control_word_min(), config.control_word_max())
    }

    /// Leave reset. The control word keeps its reset value.
    pub fn release(self) -> Self {
        Self {
            state: LoopState::FreeRun,
            since_reference: 0,
            ..self
        }
    }

    /// Run one enabled tick.
    ///
    /// `gain` is the register value settled at the end of the previous tick.
    pub fn advance(self, config: &CoreConfig, gain: u8, ref_edge: bool, error: impl Into<Comparison>) -> Self {
        match self.state {
            LoopState::Reset => self.release(),
            LoopState::FreeRun if !ref_edge => self,
            LoopState::FreeRun | LoopState::Tracking => {
                let since_reference = if ref_edge {
                    0
                } else {
                    self.since_reference.saturating_add(1)
                };
                let timed_out = config
                    .reference_timeout
                    .map_or(false, |limit| since_reference >= limit);
                if timed_out {
                    // Holdover: keep the last control word
                    return Self {
                        state: LoopState::FreeRun,
                        since_reference: 0,
                        ..self
                    };
                }
                Self {
                    state: LoopState::Tracking,
                    control_word: Self::integrate(config, self.control_word, gain, error),
                    since_reference,
                }
            }
        }
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Current control word.
    pub fn control_word(&self) -> i32 {
        self.control_word
    }

    /// Ticks since the last reference edge (tracking only).
    pub fn since_reference(&self) -> u32 {
        self.since_reference
    }
}

//! # Phase/Frequency Comparator
//!
//! Compares reference edges against feedback edges once per tick and emits
//! a ternary [`PhaseError`]. Two flavours are available:
//!
//! - [`ComparatorMode::EdgeCoincidence`] -- memoryless bang-bang detector.
//!   A lone reference edge means the feedback clock is late (`Lag`), a lone
//!   feedback edge means it is early (`Lead`). Both or neither in the same
//!   tick is the dead zone (`InPhase`), so the loop does not chatter at lock.
//!   Integrated over time the output counts edge surplus, which makes it a
//!   frequency detector as well.
//! - [`ComparatorMode::TriState`] -- UP/DOWN tri-state PFD. The first edge
//!   arms the detector silently; the opposite edge closes it and reports the
//!   direction with a magnitude equal to the ticks it was armed (capped at
//!   [`MAX_MAGNITUDE`]). A repeated edge of the same kind reports the armed
//!   interval and stays armed. Ticks with neither or both edges are
//!   `InPhase`, as in the edge-coincidence flavour, so the integrated
//!   correction is still proportional to the edge spacing.
//!
//! ```text
//!   ref edge ──►┌──────────┐
//!               │   PFD    ├──► Lag / Lead / InPhase
//!   fb edge  ──►└──────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Signed comparator output for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseError {
    /// Feedback behind the reference: speed the oscillator up
    Lag,
    /// Feedback ahead of the reference: slow the oscillator down
    Lead,
    /// No correction
    InPhase,
}

impl PhaseError {
    /// Direction of the correction: +1, -1 or 0.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            PhaseError::Lag => 1,
            PhaseError::Lead => -1,
            PhaseError::InPhase => 0,
        }
    }
}

impl Default for PhaseError {
    fn default() -> Self {
        PhaseError::InPhase
    }
}

/// Largest magnitude the tri-state detector reports
pub const MAX_MAGNITUDE: u8 = 63;

/// Comparator output for one tick: direction plus bucketed magnitude.
///
/// `magnitude` is zero exactly when `error` is `InPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Comparison {
    pub error: PhaseError,
    pub magnitude: u8,
}

impl Comparison {
    /// No correction.
    pub const IN_PHASE: Self = Self {
        error: PhaseError::InPhase,
        magnitude: 0,
    };

    /// Direction with a magnitude, clamped to `1..=MAX_MAGNITUDE`.
    pub fn new(error: PhaseError, magnitude: u8) -> Self {
        match error {
            PhaseError::InPhase => Self::IN_PHASE,
            _ => Self {
                error,
                magnitude: magnitude.clamp(1, MAX_MAGNITUDE),
            },
        }
    }

    /// Signed correction in units of the gain.
    #[inline]
    pub fn weight(&self) -> i32 {
        self.error.sign() * self.magnitude as i32
    }
}

impl From<PhaseError> for Comparison {
    /// Unit-magnitude comparison.
    fn from(error: PhaseError) -> Self {
        Self::new(error, 1)
    }
}

/// Comparator flavour, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorMode {
    /// Memoryless per-tick edge comparison
    EdgeCoincidence,
    /// Tri-state UP/DOWN phase/frequency detector
    TriState,
}

impl Default for ComparatorMode {
    fn default() -> Self {
        ComparatorMode::EdgeCoincidence
    }
}

/// Armed state of the tri-state detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PfdState {
    /// Neither edge pending
    Idle,
    /// Reference edge seen, waiting for feedback
    Up,
    /// Feedback edge seen, waiting for reference
    Down,
}

impl Default for PfdState {
    fn default() -> Self {
        PfdState::Idle
    }
}

/// Phase comparator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseComparator {
    mode: ComparatorMode,
    state: PfdState,
    /// Ticks since the detector was armed
    armed_ticks: u8,
}

impl PhaseComparator {
    /// Create an idle comparator of the given flavour.
    pub fn new(mode: ComparatorMode) -> Self {
        Self {
            mode,
            state: PfdState::Idle,
            armed_ticks: 0,
        }
    }

    /// Comparator flavour.
    pub fn mode(&self) -> ComparatorMode {
        self.mode
    }

    /// Armed state (always `Idle` for the edge-coincidence flavour).
    pub fn state(&self) -> PfdState {
        self.state
    }

    /// Ticks the tri-state detector has been armed.
    pub fn armed_ticks(&self) -> u8 {
        self.armed_ticks
    }

    /// Compare the edges observed in one tick.
    ///
    /// Returns the next comparator state and the comparison for this tick.
    /// Neither or both edges in one tick always compare `InPhase`.
    pub fn compare(self, ref_edge: bool, fb_edge: bool) -> (Self, Comparison) {
        match self.mode {
            ComparatorMode::EdgeCoincidence => {
                let error = match (ref_edge, fb_edge) {
                    (true, false) => PhaseError::Lag,
                    (false, true) => PhaseError::Lead,
                    _ => PhaseError::InPhase,
                };
                (self, error.into())
            }
            ComparatorMode::TriState => self.tri_state(ref_edge, fb_edge),
        }
    }

    fn tri_state(self, ref_edge: bool, fb_edge: bool) -> (Self, Comparison) {
        let elapsed = self.armed_ticks.saturating_add(1);
        let armed = |state| Self {
            state,
            armed_ticks: 0,
            ..self
        };

        match (ref_edge, fb_edge, self.state) {
            // Dead zone: the pending edge keeps waiting
            (true, true, PfdState::Idle) | (false, false, PfdState::Idle) => (self, Comparison::IN_PHASE),
            (true, true, _) | (false, false, _) => (
                Self {
                    armed_ticks: elapsed,
                    ..self
                },
                Comparison::IN_PHASE,
            ),
            // Opening edge
            (true, false, PfdState::Idle) => (armed(PfdState::Up), Comparison::IN_PHASE),
            (false, true, PfdState::Idle) => (armed(PfdState::Down), Comparison::IN_PHASE),
            // Closing edge reports how long the other one waited
            (false, true, PfdState::Up) => (armed(PfdState::Idle), Comparison::new(PhaseError::Lag, elapsed)),
            (true, false, PfdState::Down) => (armed(PfdState::Idle), Comparison::new(PhaseError::Lead, elapsed)),
            // Same edge again: report the interval, stay armed
            (true, false, PfdState::Up) => (armed(PfdState::Up), Comparison::new(PhaseError::Lag, elapsed)),
            (false, true, PfdState::Down) => (armed(PfdState::Down), Comparison::new(PhaseError::Lead, elapsed)),
        }
    }
}

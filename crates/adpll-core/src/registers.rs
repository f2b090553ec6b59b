//! # Register Interface
//!
//! Level-triggered programming protocol. Every tick the write strobe is
//! checked; while it is high the value on the programming lines is latched
//! into the register addressed by `param_sel`. There is no edge detection on
//! the strobe: holding it for several ticks rewrites the same value, and
//! releasing it leaves the last latched value in place.
//!
//! | `param_sel` | Register |
//! |---|---|
//! | `1` | loop gain (alpha), 5 bits |
//! | other | reserved, write ignored |
//!
//! A value latched on tick N is visible to the control loop from tick N+1.

use serde::{Deserialize, Serialize};

/// Width of the gain register
pub const GAIN_BITS: u8 = 5;

/// Largest programmable gain
pub const GAIN_MAX: u8 = (1 << GAIN_BITS) - 1;

/// `param_sel` encoding selecting the gain register
pub const SEL_GAIN: u8 = 1;

/// Programmable register targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    /// Loop gain (alpha)
    Gain,
}

impl Register {
    /// Decode a `param_sel` value. Reserved encodings return `None`.
    pub fn decode(sel: u8) -> Option<Self> {
        match sel {
            SEL_GAIN => Some(Register::Gain),
            _ => None,
        }
    }

    /// `param_sel` encoding for this register.
    pub fn select(self) -> u8 {
        match self {
            Register::Gain => SEL_GAIN,
        }
    }
}

/// Result of presenting the programming lines for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Strobe low
    Idle,
    /// Value latched into a register
    Written { register: Register, value: u8 },
    /// Strobe high with a reserved selector
    Ignored { sel: u8 },
}

/// Configuration registers owned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    gain: u8,
}

impl RegisterFile {
    /// Register file holding the given reset gain.
    pub fn new(reset_gain: u8) -> Self {
        Self {
            gain: reset_gain & GAIN_MAX,
        }
    }

    /// Sample the programming lines for one tick.
    ///
    /// `value` is truncated to the register width.
    pub fn write(self, strobe: bool, sel: u8, value: u8) -> (Self, WriteOutcome) {
        if !strobe {
            return (self, WriteOutcome::Idle);
        }
        match Register::decode(sel) {
            Some(Register::Gain) => {
                let value = value & GAIN_MAX;
                (
                    Self { gain: value },
                    WriteOutcome::Written {
                        register: Register::Gain,
                        value,
                    },
                )
            }
            None => (self, WriteOutcome::Ignored { sel }),
        }
    }

    /// Current gain.
    pub fn gain(&self) -> u8 {
        self.gain
    }
}

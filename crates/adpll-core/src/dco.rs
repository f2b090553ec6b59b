//! # Digitally Controlled Oscillator
//!
//! Phase-accumulator oscillator. Each tick the accumulator advances by
//! `center_increment + control_word` modulo `2^accumulator_bits`; `dco_out`
//! is the accumulator MSB. The rate is therefore strictly monotonic in the
//! control word, and a zero control word gives a fixed free-run period of
//! `2^accumulator_bits / center_increment` ticks.
//!
//! The feedback clock is `dco_out` divided by an even integer: a toggle
//! flip-flop that flips every `feedback_divider / 2` rising edges of
//! `dco_out`.
//!
//! ## Example
//!
//! ```rust
//! use adpll_core::{config::CoreConfig, dco::Dco};
//!
//! let cfg = CoreConfig::default();
//! let mut dco = Dco::default();
//! let mut toggles = 0;
//! for _ in 0..64 {
//!     let next = dco.advance(&cfg, 0);
//!     if next.dco_out() != dco.dco_out() {
//!         toggles += 1;
//!     }
//!     dco = next;
//! }
//! // 16-tick period: two toggles per period
//! assert_eq!(toggles, 8);
//! ```

use crate::config::CoreConfig;

/// DCO and feedback divider state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dco {
    /// Phase accumulator
    phase: u32,
    /// Registered accumulator MSB
    dco_out: bool,
    /// Rising edges of `dco_out` counted toward the next feedback toggle
    div_count: u16,
    /// Feedback divider flip-flop
    fb_clk: bool,
}

impl Dco {
    /// Accumulator increment for a control word.
    ///
    /// A validated [`CoreConfig`] guarantees the result lies in
    /// `1..=2^(accumulator_bits-1)`.
    #[inline]
    pub fn increment(config: &CoreConfig, control_word: i32) -> u32 {
        (config.center_increment as i64 + control_word as i64).max(1) as u32
    }

    /// Advance the oscillator by one tick.
    pub fn advance(self, config: &CoreConfig, control_word: i32) -> Self {
        let mask = (config.accumulator_modulus() - 1) as u32;
        let phase = self.phase.wrapping_add(Self::increment(config, control_word)) & mask;
        let dco_out = (phase >> (config.accumulator_bits - 1)) & 1 == 1;
        let rising = dco_out && !self.dco_out;

        let half = config.feedback_divider / 2;
        let (div_count, fb_clk) = if rising {
            let count = self.div_count + 1;
            if count >= half {
                (0, !self.fb_clk)
            } else {
                (count, self.fb_clk)
            }
        } else {
            (self.div_count, self.fb_clk)
        };

        Self {
            phase,
            dco_out,
            div_count,
            fb_clk,
        }
    }

    /// Raw accumulator value.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Synthesized oscillator output (accumulator MSB).
    pub fn dco_out(&self) -> bool {
        self.dco_out
    }

    /// Divided feedback clock.
    pub fn fb_clk(&self) -> bool {
        self.fb_clk
    }
}

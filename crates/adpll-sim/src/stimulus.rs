//! # Reference Stimulus
//!
//! Generators for the reference clock input. All sources except
//! [`ReferenceSource::Ramp`] drive `ui_in[1]` only and leave the other
//! input bits to the testbench. The ramp owns the whole `ui_in` byte, the
//! way a harness incrementing the input bus would, so it also toggles the
//! programming strobe and register select as a side effect.

use adpll_core::pins::ui_in;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Reference clock waveform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceSource {
    /// Held low
    Idle,
    /// 50% duty square wave, high for the first half of each period
    Square { period: u32 },
    /// Square wave for `cycles` cycles, then held low
    Burst { period: u32, cycles: u64 },
    /// `ui_in` counts up by `step` every cycle
    Ramp { step: u8 },
    /// Square wave whose half-periods vary uniformly by up to `jitter`
    Jittered { period: u32, jitter: u32, seed: u64 },
}

impl Default for ReferenceSource {
    fn default() -> Self {
        ReferenceSource::Idle
    }
}

impl ReferenceSource {
    /// Check the parameters describe a usable waveform.
    pub fn validate(&self) -> SimResult<()> {
        match *self {
            ReferenceSource::Idle => Ok(()),
            ReferenceSource::Square { period } | ReferenceSource::Burst { period, .. } => {
                check_period(period)
            }
            ReferenceSource::Ramp { step } => {
                if step == 0 {
                    Err(SimError::InvalidReference("ramp step must be non-zero".into()))
                } else {
                    Ok(())
                }
            }
            ReferenceSource::Jittered { period, jitter, .. } => {
                check_period(period)?;
                if jitter >= period / 2 {
                    return Err(SimError::InvalidReference(format!(
                        "jitter {} must be below half the period ({})",
                        jitter,
                        period / 2
                    )));
                }
                Ok(())
            }
        }
    }

    /// Nominal period in cycles, when the source has one.
    pub fn nominal_period(&self) -> Option<f64> {
        match *self {
            ReferenceSource::Square { period }
            | ReferenceSource::Burst { period, .. }
            | ReferenceSource::Jittered { period, .. } => Some(period as f64),
            // Bit 1 of a counter stepping by `step`
            ReferenceSource::Ramp { step } => match step % 4 {
                0 => None,
                2 => Some(2.0),
                _ => Some(4.0),
            },
            ReferenceSource::Idle => None,
        }
    }
}

fn check_period(period: u32) -> SimResult<()> {
    if period < 2 {
        return Err(SimError::InvalidReference(format!(
            "period must be at least 2 cycles, got {}",
            period
        )));
    }
    Ok(())
}

/// Stateful generator for a [`ReferenceSource`].
#[derive(Debug, Clone)]
pub struct ReferenceGenerator {
    source: ReferenceSource,
    cycle: u64,
    ramp: u8,
    /// Jittered source: current level and cycle of the next toggle
    level: bool,
    next_toggle: u64,
    rng: Option<StdRng>,
}

impl ReferenceGenerator {
    /// Create a generator. Validates the source.
    pub fn new(source: ReferenceSource) -> SimResult<Self> {
        source.validate()?;
        let rng = match source {
            ReferenceSource::Jittered { seed, .. } => Some(StdRng::seed_from_u64(seed)),
            _ => None,
        };
        Ok(Self {
            source,
            cycle: 0,
            ramp: 0,
            level: false,
            next_toggle: 0,
            rng,
        })
    }

    /// Generator holding the reference low.
    pub fn idle() -> Self {
        Self {
            source: ReferenceSource::Idle,
            cycle: 0,
            ramp: 0,
            level: false,
            next_toggle: 0,
            rng: None,
        }
    }

    /// Waveform being generated.
    pub fn source(&self) -> &ReferenceSource {
        &self.source
    }

    /// Produce the `ui_in` value for the next cycle from the testbench's value.
    pub fn drive(&mut self, ui: u8) -> u8 {
        let cycle = self.cycle;
        self.cycle += 1;

        let level = match self.source {
            ReferenceSource::Idle => false,
            ReferenceSource::Square { period } => square(cycle, period),
            ReferenceSource::Burst { period, cycles } => cycle < cycles && square(cycle, period),
            ReferenceSource::Ramp { step } => {
                self.ramp = self.ramp.wrapping_add(step);
                return self.ramp;
            }
            ReferenceSource::Jittered { period, jitter, .. } => {
                if cycle >= self.next_toggle {
                    self.level = !self.level;
                    let half = (period / 2) as i64;
                    let offset = match self.rng.as_mut() {
                        Some(rng) if jitter > 0 => rng.gen_range(-(jitter as i64)..=jitter as i64),
                        _ => 0,
                    };
                    self.next_toggle = cycle + (half + offset).max(1) as u64;
                }
                self.level
            }
        };

        let mask = 1u8 << ui_in::CLK_REF;
        (ui & !mask) | (if level { mask } else { 0 })
    }
}

#[inline]
fn square(cycle: u64, period: u32) -> bool {
    cycle % (period as u64) < (period / 2) as u64
}

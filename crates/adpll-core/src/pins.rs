//! Pin contract
//!
//! Bit positions of every signal on the external buses, plus the
//! decode/encode between raw bus values and core-level signals.
//!
//! | Signal | Bus | Bit(s) |
//! |---|---|---|
//! | `clk_ref` | `ui_in` | 1 |
//! | `pgm` | `ui_in` | 3 |
//! | `param_sel` | `ui_in` | 5 |
//! | `pgm_value` | `uio_in` | 6:2 |
//! | `fb_clk` | `uio_out` | 0 |
//! | `dco_out` | `uio_out` | 1 |
//! | output enables | `uio_oe` | 1:0 |
//! | `rec_clk` | `uo_out` | 1 |

use serde::{Deserialize, Serialize};

/// Dedicated input bus (`ui_in`)
pub mod ui_in {
    /// Reference clock
    pub const CLK_REF: u8 = 1;
    /// Programming write strobe
    pub const PGM: u8 = 3;
    /// Register select
    pub const PARAM_SEL: u8 = 5;
}

/// Bidirectional bus, input side (`uio_in`)
pub mod uio_in {
    /// Lowest bit of the programming value
    pub const PGM_VALUE_SHIFT: u8 = 2;
    /// Programming value field mask (before shifting)
    pub const PGM_VALUE_MASK: u8 = 0x1F;
}

/// Bidirectional bus, output side (`uio_out` / `uio_oe`)
pub mod uio_out {
    /// Feedback clock
    pub const FB_CLK: u8 = 0;
    /// Oscillator output
    pub const DCO_OUT: u8 = 1;
    /// Output-enable bits driven while running
    pub const OE_MASK: u8 = (1 << FB_CLK) | (1 << DCO_OUT);
}

/// Dedicated output bus (`uo_out`)
pub mod uo_out {
    /// Recovered clock
    pub const REC_CLK: u8 = 1;
}

#[inline]
fn bit(value: u8, pos: u8) -> bool {
    (value >> pos) & 1 == 1
}

/// Levels on every input pin for one clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinInputs {
    /// Active-low synchronous reset
    pub rst_n: bool,
    /// Master enable
    pub ena: bool,
    /// Dedicated inputs
    pub ui_in: u8,
    /// Bidirectional bus, input side
    pub uio_in: u8,
}

impl PinInputs {
    /// Core-level view of the input buses.
    pub fn decode(&self) -> CoreInputs {
        CoreInputs {
            clk_ref: bit(self.ui_in, ui_in::CLK_REF),
            pgm: bit(self.ui_in, ui_in::PGM),
            param_sel: bit(self.ui_in, ui_in::PARAM_SEL) as u8,
            pgm_value: (self.uio_in >> uio_in::PGM_VALUE_SHIFT) & uio_in::PGM_VALUE_MASK,
        }
    }

    /// Core is running: enabled and out of reset.
    pub fn running(&self) -> bool {
        self.ena && self.rst_n
    }
}

/// Decoded core inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoreInputs {
    /// Reference clock level
    pub clk_ref: bool,
    /// Write strobe
    pub pgm: bool,
    /// Register select
    pub param_sel: u8,
    /// Value on the programming lines
    pub pgm_value: u8,
}

impl CoreInputs {
    /// Encode back onto the raw buses, leaving other bits of `base` intact.
    pub fn encode(&self, base: PinInputs) -> PinInputs {
        let mut ui = base.ui_in
            & !((1 << ui_in::CLK_REF) | (1 << ui_in::PGM) | (1 << ui_in::PARAM_SEL));
        ui |= (self.clk_ref as u8) << ui_in::CLK_REF;
        ui |= (self.pgm as u8) << ui_in::PGM;
        ui |= (self.param_sel & 1) << ui_in::PARAM_SEL;

        let field = uio_in::PGM_VALUE_MASK << uio_in::PGM_VALUE_SHIFT;
        let uio = (base.uio_in & !field)
            | ((self.pgm_value & uio_in::PGM_VALUE_MASK) << uio_in::PGM_VALUE_SHIFT);

        PinInputs {
            ui_in: ui,
            uio_in: uio,
            ..base
        }
    }
}

/// Levels on every output pin after a clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinOutputs {
    /// Dedicated outputs
    pub uo_out: u8,
    /// Bidirectional bus, output side
    pub uio_out: u8,
    /// Bidirectional bus direction (1 = driven by the core)
    pub uio_oe: u8,
}

impl PinOutputs {
    /// Everything low, bidirectional bus released.
    pub const QUIET: Self = Self {
        uo_out: 0,
        uio_out: 0,
        uio_oe: 0,
    };

    /// Map oscillator signals onto the buses.
    ///
    /// `running` gates every output and output enable to zero.
    pub fn encode(running: bool, dco_out: bool, fb_clk: bool, rec_clk: bool) -> Self {
        if !running {
            return Self::QUIET;
        }
        Self {
            uo_out: (rec_clk as u8) << uo_out::REC_CLK,
            uio_out: ((fb_clk as u8) << uio_out::FB_CLK) | ((dco_out as u8) << uio_out::DCO_OUT),
            uio_oe: uio_out::OE_MASK,
        }
    }

    /// `dco_out` as seen on `uio_out[1]`.
    pub fn dco_out(&self) -> bool {
        bit(self.uio_out, uio_out::DCO_OUT)
    }

    /// `fb_clk` as seen on `uio_out[0]`.
    pub fn fb_clk(&self) -> bool {
        bit(self.uio_out, uio_out::FB_CLK)
    }

    /// `rec_clk` as seen on `uo_out[1]`.
    pub fn rec_clk(&self) -> bool {
        bit(self.uo_out, uo_out::REC_CLK)
    }

    /// Every output and output enable reads zero.
    pub fn is_quiet(&self) -> bool {
        *self == Self::QUIET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bit_positions() {
        let pins = PinInputs {
            rst_n: true,
            ena: true,
            ui_in: (1 << 1) | (1 << 3) | (1 << 5),
            uio_in: 0b10101 << 2,
        };
        let core = pins.decode();
        assert!(core.clk_ref);
        assert!(core.pgm);
        assert_eq!(core.param_sel, 1);
        assert_eq!(core.pgm_value, 0b10101);
    }

    #[test]
    fn test_decode_ignores_unrelated_bits() {
        let pins = PinInputs {
            ui_in: !((1 << 1) | (1 << 3) | (1 << 5)),
            uio_in: 0b1000_0011,
            ..Default::default()
        };
        assert_eq!(pins.decode(), CoreInputs::default());
    }

    #[test]
    fn test_encode_preserves_other_bits() {
        let base = PinInputs {
            ui_in: 0b1100_0001,
            uio_in: 0b1000_0001,
            ..Default::default()
        };
        let core = CoreInputs {
            clk_ref: true,
            pgm: false,
            param_sel: 1,
            pgm_value: 0b11111,
        };
        let pins = core.encode(base);
        assert_eq!(pins.ui_in, 0b1110_0011);
        assert_eq!(pins.uio_in, 0b1111_1101);
        assert_eq!(pins.decode(), core);
    }

    #[test]
    fn test_outputs_gated() {
        let out = PinOutputs::encode(false, true, true, true);
        assert!(out.is_quiet());
    }

    #[test]
    fn test_outputs_running() {
        let out = PinOutputs::encode(true, true, false, true);
        assert_eq!(out.uio_oe, 0b11);
        assert_eq!(out.uio_out, 0b10);
        assert_eq!(out.uo_out, 0b10);
        assert!(out.dco_out());
        assert!(!out.fb_clk());
        assert!(out.rec_clk());

        // Output enables stay set with all clocks low
        let low = PinOutputs::encode(true, false, false, false);
        assert_eq!(low.uio_oe, 0b11);
        assert!(!low.is_quiet());
    }
}

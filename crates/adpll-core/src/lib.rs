//! # ADPLL Core
//!
//! Cycle-accurate model of an all-digital phase-locked loop / clock-recovery
//! core behind a fixed pin contract.
//!
//! ## Signal Flow
//!
//! ```text
//! clk_ref → Edge Detector → Comparator ← fb_clk ← DCO ← Control Loop
//!                              │                           ▲    ▲
//!                              └──────── PhaseError ───────┘    │
//!                                   Register Interface (gain) ──┘
//! ```
//!
//! The whole design is a single transition function, [`tick`], invoked once
//! per rising clock edge. [`Adpll`] owns the state and implements
//! [`PinDevice`], the interface external drivers use.
//!
//! ## Example
//!
//! ```rust
//! use adpll_core::{Adpll, CoreConfig, PinDevice, PinInputs};
//!
//! let mut core = Adpll::new(CoreConfig::default()).unwrap();
//!
//! // Enabled, out of reset, reference toggling every tick
//! for i in 0..800u32 {
//!     let pins = PinInputs {
//!         rst_n: true,
//!         ena: true,
//!         ui_in: ((i % 2) as u8) << 1,
//!         uio_in: 0,
//!     };
//!     core.apply(pins);
//! }
//! assert!(core.probe().control_word > 0);
//! ```

pub mod adpll;
pub mod config;
pub mod control_loop;
pub mod dco;
pub mod edge_detector;
pub mod error;
pub mod lock_detector;
pub mod phase_detector;
pub mod pins;
pub mod registers;
pub mod traits;

pub use crate::adpll::{tick, Adpll, CoreMode, CoreProbe, CoreState, TickOutput};
pub use config::CoreConfig;
pub use control_loop::LoopState;
pub use error::{ConfigError, ConfigResult};
pub use phase_detector::{Comparison, ComparatorMode, PhaseError};
pub use pins::{CoreInputs, PinInputs, PinOutputs};
pub use registers::{Register, WriteOutcome};
pub use traits::PinDevice;

//! # ADPLL Simulator
//!
//! External driver for [`adpll_core`]: a cycle-level [`Testbench`] around
//! any [`PinDevice`](adpll_core::PinDevice), reference clock stimulus,
//! output monitors and a data-driven scenario engine.
//!
//! ## Example
//!
//! ```rust
//! use adpll_sim::scenario::{builtin, ScenarioEngine};
//!
//! for scenario in builtin::all() {
//!     let report = ScenarioEngine::new(scenario).unwrap().run().unwrap();
//!     assert!(report.passed(), "{} failed", report.name);
//! }
//! ```

pub mod error;
pub mod logging;
pub mod monitor;
pub mod scenario;
pub mod stimulus;
pub mod testbench;

pub use error::{SimError, SimResult};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use monitor::{OutputMonitor, OutputSignal, PeriodMeter, SignalTrace, ToggleCounter};
pub use scenario::{ScenarioConfig, ScenarioEngine, ScenarioReport, ScenarioStep};
pub use stimulus::{ReferenceGenerator, ReferenceSource};
pub use testbench::Testbench;

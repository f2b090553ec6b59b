//! Scenario-driven simulation
//!
//! A [`ScenarioConfig`] describes a run as data (core parameters, reference
//! stimulus, ordered steps); the [`ScenarioEngine`] executes it through a
//! [`Testbench`](crate::testbench::Testbench) and returns a
//! [`ScenarioReport`].

pub mod builtin;
pub mod config;
pub mod engine;

pub use config::{ScenarioConfig, ScenarioStep};
pub use engine::{ScenarioEngine, ScenarioReport, StepOutcome, StepStatus, ToggleSummary};

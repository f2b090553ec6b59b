//! Scenario engine: runs a [`ScenarioConfig`] against a device and reports
//! the outcome of every step.

use adpll_core::{Adpll, CoreProbe, PinDevice};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::{ScenarioConfig, ScenarioStep};
use crate::error::{SimError, SimResult};
use crate::monitor::{OutputSignal, SignalTrace};
use crate::testbench::Testbench;

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// Action applied
    Done,
    /// Expectation held
    Passed,
    /// Expectation did not hold
    Failed { description: String },
}

/// Per-step entry of a [`ScenarioReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step: &'static str,
    /// Cycle counter before and after the step
    pub start_cycle: u64,
    pub end_cycle: u64,
    pub status: StepStatus,
    /// Toggles observed by a toggle expectation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggles: Option<u64>,
}

/// Toggle counts of every output over the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToggleSummary {
    pub dco_out: u64,
    pub fb_clk: u64,
    pub rec_clk: u64,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub cycles: u64,
    pub steps: Vec<StepOutcome>,
    pub toggles: ToggleSummary,
    pub final_probe: CoreProbe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<SignalTrace>,
}

impl ScenarioReport {
    /// No step failed.
    pub fn passed(&self) -> bool {
        self.first_failure().is_none()
    }

    fn first_failure(&self) -> Option<(&StepOutcome, &str)> {
        self.steps.iter().find_map(|outcome| match &outcome.status {
            StepStatus::Failed { description } => Some((outcome, description.as_str())),
            _ => None,
        })
    }

    /// Turn the first failed expectation into an error.
    pub fn into_result(self) -> SimResult<Self> {
        if let Some((outcome, description)) = self.first_failure() {
            return Err(SimError::ExpectationFailed {
                cycle: outcome.end_cycle,
                description: format!("{} (step {} '{}')", description, outcome.index, outcome.step),
            });
        }
        Ok(self)
    }

    /// Report as pretty JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Executes scenario steps in order, stopping at the first failed
/// expectation.
pub struct ScenarioEngine {
    config: ScenarioConfig,
}

impl ScenarioEngine {
    /// Validate a scenario and prepare to run it.
    pub fn new(config: ScenarioConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Run against a fresh [`Adpll`] built from the scenario's core config.
    pub fn run(&self) -> SimResult<ScenarioReport> {
        let dut = Adpll::new(self.config.core.clone())?;
        self.run_with(dut)
    }

    /// Run against any pin-level device.
    pub fn run_with<D: PinDevice>(&self, dut: D) -> SimResult<ScenarioReport> {
        let config = &self.config;
        info!(
            scenario = %config.name,
            device = dut.name(),
            steps = config.steps.len(),
            "Scenario start"
        );

        let mut tb = Testbench::new(dut);
        tb.set_reference(config.reference.clone())?;
        if let Some(limit) = config.trace_limit {
            tb.enable_trace(limit);
        }

        let mut outcomes = Vec::with_capacity(config.steps.len());
        for (index, step) in config.steps.iter().enumerate() {
            let start_cycle = tb.cycle();
            let (status, toggles) = execute(&mut tb, step)?;
            let outcome = StepOutcome {
                index,
                step: step.label(),
                start_cycle,
                end_cycle: tb.cycle(),
                status,
                toggles,
            };
            debug!(index, step = outcome.step, cycle = outcome.end_cycle, "Step complete");

            let failed = matches!(outcome.status, StepStatus::Failed { .. });
            if let StepStatus::Failed { ref description } = outcome.status {
                warn!(
                    scenario = %config.name,
                    index,
                    step = outcome.step,
                    cycle = outcome.end_cycle,
                    "Expectation failed: {}",
                    description
                );
            }
            outcomes.push(outcome);
            if failed {
                break;
            }
        }

        let monitor = tb.monitor();
        let report = ScenarioReport {
            name: config.name.clone(),
            cycles: tb.cycle(),
            toggles: ToggleSummary {
                dco_out: monitor.toggles(OutputSignal::DcoOut),
                fb_clk: monitor.toggles(OutputSignal::FbClk),
                rec_clk: monitor.toggles(OutputSignal::RecClk),
            },
            final_probe: tb.probe(),
            trace: tb.trace().cloned(),
            steps: outcomes,
        };

        info!(
            scenario = %report.name,
            passed = report.passed(),
            cycles = report.cycles,
            control_word = report.final_probe.control_word,
            "Scenario complete"
        );
        Ok(report)
    }
}

fn execute<D: PinDevice>(tb: &mut Testbench<D>, step: &ScenarioStep) -> SimResult<(StepStatus, Option<u64>)> {
    let status = match step {
        ScenarioStep::Reset { cycles } => {
            tb.reset(*cycles);
            StepStatus::Done
        }
        ScenarioStep::Enable => {
            tb.set_enable(true);
            StepStatus::Done
        }
        ScenarioStep::Disable => {
            tb.set_enable(false);
            StepStatus::Done
        }
        ScenarioStep::Reference { source } => {
            tb.set_reference(source.clone())?;
            StepStatus::Done
        }
        ScenarioStep::Run { cycles } => {
            tb.clock_cycles(*cycles);
            StepStatus::Done
        }
        ScenarioStep::Program {
            sel,
            value,
            strobe_cycles,
        } => {
            tb.program_register(*sel, *value, *strobe_cycles)?;
            StepStatus::Done
        }
        ScenarioStep::ExpectQuiet { cycles } => {
            let mut status = StepStatus::Passed;
            for _ in 0..*cycles {
                let out = tb.clock();
                if !out.is_quiet() {
                    status = StepStatus::Failed {
                        description: format!(
                            "outputs not quiet: uo_out={:#04x} uio_out={:#04x} uio_oe={:#04x}",
                            out.uo_out, out.uio_out, out.uio_oe
                        ),
                    };
                    break;
                }
            }
            status
        }
        ScenarioStep::ExpectToggle {
            signal,
            within,
            min_toggles,
        } => {
            let toggles = tb.count_toggles(*signal, *within, *min_toggles);
            let status = if toggles >= *min_toggles {
                StepStatus::Passed
            } else {
                StepStatus::Failed {
                    description: format!(
                        "{} toggled {} times within {} cycles, expected at least {}",
                        signal, toggles, within, min_toggles
                    ),
                }
            };
            return Ok((status, Some(toggles)));
        }
        ScenarioStep::ExpectLocked { within } => {
            let mut status = StepStatus::Failed {
                description: format!("no lock within {} cycles", within),
            };
            for _ in 0..*within {
                tb.clock();
                if tb.probe().locked {
                    status = StepStatus::Passed;
                    break;
                }
            }
            status
        }
    };
    Ok((status, None))
}

//! Scenario configuration
//!
//! A scenario is a core configuration, an initial reference stimulus and an
//! ordered list of steps. Scenarios are plain JSON documents:
//!
//! ```json
//! {
//!   "name": "gain_write",
//!   "steps": [
//!     { "step": "enable" },
//!     { "step": "reset", "cycles": 5 },
//!     { "step": "program", "sel": 1, "value": 21, "strobe_cycles": 2 },
//!     { "step": "expect_toggle", "signal": "any_oscillator", "within": 2000 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use adpll_core::registers::{GAIN_BITS, GAIN_MAX};
use adpll_core::CoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::monitor::OutputSignal;
use crate::stimulus::ReferenceSource;

fn default_strobe_cycles() -> u32 {
    2
}

fn default_min_toggles() -> u64 {
    1
}

/// One action or check applied to the device under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Hold reset for `cycles` edges, then release it
    Reset { cycles: u32 },
    /// Drive `ena` high
    Enable,
    /// Drive `ena` low
    Disable,
    /// Switch the reference stimulus
    Reference { source: ReferenceSource },
    /// Clock without checking anything
    Run { cycles: u64 },
    /// Level-triggered register write
    Program {
        sel: u8,
        value: u8,
        #[serde(default = "default_strobe_cycles")]
        strobe_cycles: u32,
    },
    /// Every output and output enable must read zero for `cycles` edges
    ExpectQuiet { cycles: u64 },
    /// `signal` must change at least `min_toggles` times within `within` edges
    ExpectToggle {
        signal: OutputSignal,
        within: u64,
        #[serde(default = "default_min_toggles")]
        min_toggles: u64,
    },
    /// Lock detector must report lock within `within` edges
    ExpectLocked { within: u64 },
}

impl ScenarioStep {
    /// Short name used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioStep::Reset { .. } => "reset",
            ScenarioStep::Enable => "enable",
            ScenarioStep::Disable => "disable",
            ScenarioStep::Reference { .. } => "reference",
            ScenarioStep::Run { .. } => "run",
            ScenarioStep::Program { .. } => "program",
            ScenarioStep::ExpectQuiet { .. } => "expect_quiet",
            ScenarioStep::ExpectToggle { .. } => "expect_toggle",
            ScenarioStep::ExpectLocked { .. } => "expect_locked",
        }
    }

    /// Step is a check rather than an action.
    pub fn is_expectation(&self) -> bool {
        matches!(
            self,
            ScenarioStep::ExpectQuiet { .. }
                | ScenarioStep::ExpectToggle { .. }
                | ScenarioStep::ExpectLocked { .. }
        )
    }

    fn validate(&self, index: usize) -> SimResult<()> {
        let invalid = |reason: String| SimError::InvalidStep { index, reason };
        match self {
            ScenarioStep::Program {
                value,
                strobe_cycles,
                ..
            } => {
                if *value > GAIN_MAX {
                    return Err(invalid(format!(
                        "value {} does not fit {} bits",
                        value, GAIN_BITS
                    )));
                }
                if *strobe_cycles == 0 {
                    return Err(invalid("strobe must be held for at least one cycle".into()));
                }
            }
            ScenarioStep::ExpectToggle {
                within,
                min_toggles,
                ..
            } => {
                if *within == 0 || *min_toggles == 0 {
                    return Err(invalid("toggle window and count must be non-zero".into()));
                }
            }
            ScenarioStep::ExpectQuiet { cycles: 0 } | ScenarioStep::ExpectLocked { within: 0 } => {
                return Err(invalid("expectation window must be non-zero".into()));
            }
            ScenarioStep::Reference { source } => {
                source.validate().map_err(|e| invalid(e.to_string()))?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Complete description of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    /// Core build parameters
    #[serde(default)]
    pub core: CoreConfig,
    /// Reference stimulus at the start of the run
    #[serde(default)]
    pub reference: ReferenceSource,
    pub steps: Vec<ScenarioStep>,
    /// Record at most this many cycles of pin activity
    #[serde(default)]
    pub trace_limit: Option<usize>,
}

impl ScenarioConfig {
    /// Scenario with default core parameters and an idle reference.
    pub fn new(name: impl Into<String>, steps: Vec<ScenarioStep>) -> Self {
        Self {
            name: name.into(),
            core: CoreConfig::default(),
            reference: ReferenceSource::Idle,
            steps,
            trace_limit: None,
        }
    }

    /// Check the scenario can run.
    pub fn validate(&self) -> SimResult<()> {
        if self.steps.is_empty() {
            return Err(SimError::EmptyScenario(self.name.clone()));
        }
        self.core.validate()?;
        self.reference.validate()?;
        for (index, step) in self.steps.iter().enumerate() {
            step.validate(index)?;
        }
        Ok(())
    }

    /// Number of check steps.
    pub fn expectation_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_expectation()).count()
    }

    /// Parse and validate a JSON scenario.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpll_core::ConfigError;

    #[test]
    fn test_parse_minimal() {
        let json = r#"{
            "name": "gain_write",
            "steps": [
                { "step": "enable" },
                { "step": "reset", "cycles": 5 },
                { "step": "program", "sel": 1, "value": 21 },
                { "step": "expect_toggle", "signal": "any_oscillator", "within": 2000 }
            ]
        }"#;
        let cfg = ScenarioConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.core, CoreConfig::default());
        assert_eq!(cfg.reference, ReferenceSource::Idle);
        assert_eq!(
            cfg.steps[2],
            ScenarioStep::Program {
                sel: 1,
                value: 21,
                strobe_cycles: 2
            }
        );
        assert_eq!(
            cfg.steps[3],
            ScenarioStep::ExpectToggle {
                signal: OutputSignal::AnyOscillator,
                within: 2000,
                min_toggles: 1
            }
        );
        assert_eq!(cfg.expectation_count(), 1);
    }

    #[test]
    fn test_nested_reference() {
        let json = r#"{
            "name": "ramp",
            "reference": { "kind": "ramp", "step": 2 },
            "steps": [
                { "step": "reference", "source": { "kind": "square", "period": 20 } },
                { "step": "run", "cycles": 10 }
            ]
        }"#;
        let cfg = ScenarioConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.reference, ReferenceSource::Ramp { step: 2 });
        assert_eq!(
            cfg.steps[0],
            ScenarioStep::Reference {
                source: ReferenceSource::Square { period: 20 }
            }
        );
    }

    #[test]
    fn test_empty_rejected() {
        let err = ScenarioConfig::new("nothing", vec![]).validate().unwrap_err();
        assert!(matches!(err, SimError::EmptyScenario(ref name) if name == "nothing"));
    }

    #[test]
    fn test_wide_value_rejected() {
        let cfg = ScenarioConfig::new(
            "wide",
            vec![
                ScenarioStep::Enable,
                ScenarioStep::Program {
                    sel: 1,
                    value: 40,
                    strobe_cycles: 2,
                },
            ],
        );
        match cfg.validate() {
            Err(SimError::InvalidStep { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("5 bits"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_windows_rejected() {
        for step in [
            ScenarioStep::ExpectQuiet { cycles: 0 },
            ScenarioStep::ExpectLocked { within: 0 },
            ScenarioStep::ExpectToggle {
                signal: OutputSignal::DcoOut,
                within: 10,
                min_toggles: 0,
            },
        ] {
            assert!(ScenarioConfig::new("zero", vec![step]).validate().is_err());
        }
    }

    #[test]
    fn test_bad_core_config() {
        let mut cfg = ScenarioConfig::new("odd", vec![ScenarioStep::Enable]);
        cfg.core.feedback_divider = 3;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::Config(ConfigError::InvalidDivider(3)))
        ));
    }

    #[test]
    fn test_unknown_step_is_parse_error() {
        let json = r#"{ "name": "x", "steps": [ { "step": "explode" } ] }"#;
        assert!(matches!(
            ScenarioConfig::from_json_str(json),
            Err(SimError::Json(_))
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        let mut cfg = ScenarioConfig::new(
            "roundtrip",
            vec![
                ScenarioStep::Reset { cycles: 5 },
                ScenarioStep::Enable,
                ScenarioStep::Reference {
                    source: ReferenceSource::Jittered {
                        period: 24,
                        jitter: 2,
                        seed: 9,
                    },
                },
                ScenarioStep::ExpectLocked { within: 20_000 },
            ],
        );
        cfg.trace_limit = Some(128);
        cfg.save(&path).unwrap();
        assert_eq!(ScenarioConfig::load(&path).unwrap(), cfg);
    }
}

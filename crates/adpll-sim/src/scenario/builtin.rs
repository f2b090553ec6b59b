//! Built-in pin-contract scenarios.
//!
//! | Scenario | Checks |
//! |---|---|
//! | `disabled_quiet` | outputs and output enables stay low while `ena=0` |
//! | `ramp_recovers_clock` | `rec_clk` toggles while a ramp drives the reference |
//! | `gain_write_oscillates` | oscillator keeps toggling after a gain write |
//! | `lock_acquisition` | lock detector reports lock on a reachable reference |

use adpll_core::registers::SEL_GAIN;
use adpll_core::CoreConfig;

use super::config::{ScenarioConfig, ScenarioStep};
use crate::monitor::OutputSignal;
use crate::stimulus::ReferenceSource;

/// Reset then hold `ena` low: everything must read zero.
pub fn disabled_quiet() -> ScenarioConfig {
    ScenarioConfig::new(
        "disabled_quiet",
        vec![
            ScenarioStep::Reset { cycles: 5 },
            ScenarioStep::ExpectQuiet { cycles: 5 },
        ],
    )
}

/// Enable and drive an incrementing `ui_in` bus; the recovered clock must
/// move within 800 cycles.
pub fn ramp_recovers_clock() -> ScenarioConfig {
    ScenarioConfig::new(
        "ramp_recovers_clock",
        vec![
            ScenarioStep::Reset { cycles: 5 },
            ScenarioStep::ExpectQuiet { cycles: 5 },
            ScenarioStep::Enable,
            ScenarioStep::Reference {
                source: ReferenceSource::Ramp { step: 2 },
            },
            ScenarioStep::ExpectToggle {
                signal: OutputSignal::RecClk,
                within: 800,
                min_toggles: 1,
            },
        ],
    )
}

/// Program gain `0b10101` with a two-cycle strobe; an oscillator output
/// must change within 2000 cycles.
pub fn gain_write_oscillates() -> ScenarioConfig {
    ScenarioConfig::new(
        "gain_write_oscillates",
        vec![
            ScenarioStep::Enable,
            ScenarioStep::Reset { cycles: 5 },
            ScenarioStep::Program {
                sel: SEL_GAIN,
                value: 0b10101,
                strobe_cycles: 2,
            },
            ScenarioStep::ExpectToggle {
                signal: OutputSignal::AnyOscillator,
                within: 2000,
                min_toggles: 1,
            },
        ],
    )
}

/// Maximum gain against a 28-cycle square reference.
pub fn lock_acquisition() -> ScenarioConfig {
    let mut config = ScenarioConfig::new(
        "lock_acquisition",
        vec![
            ScenarioStep::Reset { cycles: 1 },
            ScenarioStep::Enable,
            ScenarioStep::Program {
                sel: SEL_GAIN,
                value: 31,
                strobe_cycles: 2,
            },
            ScenarioStep::Reference {
                source: ReferenceSource::Square { period: 28 },
            },
            ScenarioStep::ExpectLocked { within: 20_000 },
            ScenarioStep::ExpectToggle {
                signal: OutputSignal::RecClk,
                within: 100,
                min_toggles: 2,
            },
        ],
    );
    config.core = CoreConfig {
        lock_window: 256,
        lock_threshold: 4,
        ..Default::default()
    };
    config
}

/// Every built-in scenario, in run order.
pub fn all() -> Vec<ScenarioConfig> {
    vec![
        disabled_quiet(),
        ramp_recovers_clock(),
        gain_write_oscillates(),
        lock_acquisition(),
    ]
}

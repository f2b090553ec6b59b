//! Run the built-in pin-contract scenarios, plus any scenario files given
//! on the command line.
//!
//! Run with: cargo run --example run_scenarios -p adpll-sim [-- scenario.json ...]
//!
//! Set `RUST_LOG=adpll_core=debug` to see loop state changes and gain writes.

use std::process::ExitCode;

use adpll_sim::scenario::builtin;
use adpll_sim::{init_logging, LogConfig, ScenarioConfig, ScenarioEngine, SimResult};

fn run(config: ScenarioConfig) -> SimResult<bool> {
    let report = ScenarioEngine::new(config)?.run()?;
    let verdict = if report.passed() { "PASS" } else { "FAIL" };
    println!(
        "{:<24} {}  cycles={:<6} cw={:<5} state={} dco/fb/rec toggles={}/{}/{}",
        report.name,
        verdict,
        report.cycles,
        report.final_probe.control_word,
        report.final_probe.loop_state,
        report.toggles.dco_out,
        report.toggles.fb_clk,
        report.toggles.rec_clk,
    );
    Ok(report.passed())
}

fn main() -> ExitCode {
    init_logging(&LogConfig::default());

    let mut scenarios = builtin::all();
    for path in std::env::args().skip(1) {
        match ScenarioConfig::load(&path) {
            Ok(config) => scenarios.push(config),
            Err(e) => {
                eprintln!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    let mut failures = 0;
    for config in scenarios {
        let name = config.name.clone();
        match run(config) {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        println!("\n{} scenario(s) failed", failures);
        ExitCode::FAILURE
    } else {
        println!("\nAll scenarios passed");
        ExitCode::SUCCESS
    }
}

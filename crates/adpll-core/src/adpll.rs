//! # ADPLL Top Level
//!
//! Composition of the edge detectors, phase comparator, control loop, DCO,
//! register file and pin mapping into one synchronous design.
//!
//! ```text
//!  ui_in[1] ─► EdgeDetector ─ref─►┌────────────┐ error ┌─────────────┐ cw ┌─────┐
//!                                 │ Comparator ├──────►│ ControlLoop ├───►│ DCO ├─► dco_out
//!             EdgeDetector ─fb───►└────────────┘       └──────▲──────┘    └──┬──┘
//!                  ▲                                    gain  │              │
//!                  └───────────────── fb_clk ◄────────────────┼──────────────┘
//!  ui_in[3,5], uio_in[6:2] ─► RegisterFile ───────────────────┘
//! ```
//!
//! All state lives in [`CoreState`]. [`tick`] is the whole design: it maps
//! the previous settled state and the pin levels at a rising clock edge to
//! the next state and the pin levels after the edge. Every component reads
//! only the previous state, so nothing observes a partial update within a
//! tick. [`Adpll`] wraps the function with owned state and logging.

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::CoreConfig;
use crate::control_loop::{ControlLoop, LoopState};
use crate::dco::Dco;
use crate::edge_detector::EdgeDetector;
use crate::error::ConfigResult;
use crate::lock_detector::LockDetector;
use crate::phase_detector::{PfdState, PhaseComparator, PhaseError};
use crate::pins::{PinInputs, PinOutputs};
use crate::registers::{RegisterFile, WriteOutcome};
use crate::traits::PinDevice;

/// Complete registered state of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreState {
    ref_detector: EdgeDetector,
    fb_detector: EdgeDetector,
    comparator: PhaseComparator,
    control: ControlLoop,
    dco: Dco,
    registers: RegisterFile,
    lock: LockDetector,
    ticks: u64,
    reference_edges: u64,
}

impl CoreState {
    /// State forced by reset.
    pub fn reset(config: &CoreConfig) -> Self {
        Self {
            ref_detector: EdgeDetector::default(),
            fb_detector: EdgeDetector::default(),
            comparator: PhaseComparator::new(config.comparator),
            control: ControlLoop::default(),
            dco: Dco::default(),
            registers: RegisterFile::new(config.reset_gain),
            lock: LockDetector::default(),
            ticks: 0,
            reference_edges: 0,
        }
    }

    /// Control loop state.
    pub fn loop_state(&self) -> LoopState {
        self.control.state()
    }

    /// Current control word.
    pub fn control_word(&self) -> i32 {
        self.control.control_word()
    }

    /// Current gain register.
    pub fn gain(&self) -> u8 {
        self.registers.gain()
    }

    /// Read-only snapshot of the internal state.
    pub fn probe(&self) -> CoreProbe {
        CoreProbe {
            loop_state: self.control.state(),
            control_word: self.control.control_word(),
            gain: self.registers.gain(),
            dco_phase: self.dco.phase(),
            dco_out: self.dco.dco_out(),
            fb_clk: self.dco.fb_clk(),
            pfd_state: self.comparator.state(),
            locked: self.lock.is_locked(),
            ticks: self.ticks,
            reference_edges: self.reference_edges,
        }
    }
}

/// Everything a tick produces besides the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutput {
    /// Pin levels after the edge
    pub pins: PinOutputs,
    /// What the register interface did
    pub write: WriteOutcome,
    /// Comparator direction used by the loop
    pub error: PhaseError,
    /// Comparator magnitude (0 when in phase)
    pub magnitude: u8,
    /// A reference edge was detected
    pub ref_edge: bool,
}

impl TickOutput {
    fn quiet() -> Self {
        Self {
            pins: PinOutputs::QUIET,
            write: WriteOutcome::Idle,
            error: PhaseError::InPhase,
            magnitude: 0,
            ref_edge: false,
        }
    }
}

/// One rising clock edge.
///
/// Reset is synchronous and wins over everything else. With reset released
/// and `ena` low the core is clock-gated: state holds and all outputs and
/// output enables read zero.
///
/// # Panics
///
/// `config` must have passed [`CoreConfig::validate`], which [`Adpll::new`]
/// enforces. Bit widths outside the validated ranges overflow shifts; debug
/// builds check the precondition up front.
pub fn tick(config: &CoreConfig, state: &CoreState, inputs: &PinInputs) -> (CoreState, TickOutput) {
    debug_assert!(config.validate().is_ok(), "tick called with an unvalidated config");
    if !inputs.rst_n {
        return (CoreState::reset(config), TickOutput::quiet());
    }
    if !inputs.ena {
        return (*state, TickOutput::quiet());
    }

    let core = inputs.decode();

    let (ref_detector, ref_edge) = state.ref_detector.sample(core.clk_ref);
    let (fb_detector, fb_edge) = state.fb_detector.sample(state.dco.fb_clk());
    let (comparator, comparison) = state.comparator.compare(ref_edge, fb_edge);

    // The loop and the DCO see the previous gain and control word
    let control = state
        .control
        .advance(config, state.registers.gain(), ref_edge, comparison);
    let dco = state.dco.advance(config, state.control.control_word());

    let (registers, write) = state
        .registers
        .write(core.pgm, core.param_sel, core.pgm_value);

    let lock = state.lock.update(config, ref_edge, comparison);

    let next = CoreState {
        ref_detector,
        fb_detector,
        comparator,
        control,
        dco,
        registers,
        lock,
        ticks: state.ticks + 1,
        reference_edges: state.reference_edges + ref_edge as u64,
    };

    let pins = PinOutputs::encode(true, dco.dco_out(), dco.fb_clk(), dco.fb_clk());

    (
        next,
        TickOutput {
            pins,
            write,
            error: comparison.error,
            magnitude: comparison.magnitude,
            ref_edge,
        },
    )
}

/// Observable operating mode.
///
/// `Programming` overlaps the loop state: it is reported whenever the write
/// strobe is high on a running core, and the loop keeps running underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CoreMode {
    /// Held in reset or awaiting enable
    Reset,
    /// Oscillating, loop inactive
    FreeRun,
    /// Integrating phase error
    Tracking,
    /// Gain write in progress
    Programming,
}

impl From<LoopState> for CoreMode {
    fn from(state: LoopState) -> Self {
        match state {
            LoopState::Reset => CoreMode::Reset,
            LoopState::FreeRun => CoreMode::FreeRun,
            LoopState::Tracking => CoreMode::Tracking,
        }
    }
}

/// Snapshot of internal state for debugging and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoreProbe {
    pub loop_state: LoopState,
    pub control_word: i32,
    pub gain: u8,
    pub dco_phase: u32,
    pub dco_out: bool,
    pub fb_clk: bool,
    pub pfd_state: PfdState,
    pub locked: bool,
    /// Enabled, out-of-reset ticks since reset
    pub ticks: u64,
    pub reference_edges: u64,
}

/// ADPLL core with owned state.
///
/// # Example
///
/// ```rust
/// use adpll_core::{Adpll, CoreConfig, PinDevice, PinInputs};
///
/// let mut core = Adpll::new(CoreConfig::default()).unwrap();
/// let run = PinInputs { rst_n: true, ena: true, ..Default::default() };
///
/// let mut toggles = 0;
/// let mut prev = core.outputs().dco_out();
/// for _ in 0..100 {
///     let out = core.apply(run);
///     if out.dco_out() != prev {
///         toggles += 1;
///     }
///     prev = out.dco_out();
/// }
/// assert!(toggles > 0);
/// ```
#[derive(Debug, Clone)]
pub struct Adpll {
    config: CoreConfig,
    state: CoreState,
    inputs: PinInputs,
    outputs: PinOutputs,
}

impl Adpll {
    /// Build a core from a validated configuration. The core starts in reset.
    pub fn new(config: CoreConfig) -> ConfigResult<Self> {
        config.validate()?;
        let state = CoreState::reset(&config);
        Ok(Self {
            config,
            state,
            inputs: PinInputs::default(),
            outputs: PinOutputs::QUIET,
        })
    }

    /// Build configuration.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Registered state.
    pub fn state(&self) -> &CoreState {
        &self.state
    }

    /// Pin levels applied on the last edge.
    pub fn inputs(&self) -> PinInputs {
        self.inputs
    }

    /// Operating mode after the last edge.
    pub fn mode(&self) -> CoreMode {
        let loop_state = self.state.loop_state();
        if self.inputs.running() && self.inputs.decode().pgm && loop_state != LoopState::Reset {
            CoreMode::Programming
        } else {
            loop_state.into()
        }
    }

    /// Apply one rising edge and return the full tick result.
    pub fn step(&mut self, inputs: PinInputs) -> TickOutput {
        let (next, out) = tick(&self.config, &self.state, &inputs);
        self.log_transition(&next, &out);
        self.state = next;
        self.inputs = inputs;
        self.outputs = out.pins;
        out
    }

    fn log_transition(&self, next: &CoreState, out: &TickOutput) {
        let (from, to) = (self.state.loop_state(), next.loop_state());
        if from != to {
            debug!(
                from = %from,
                to = %to,
                control_word = next.control_word(),
                tick = next.ticks,
                "Loop state change"
            );
        }
        match out.write {
            WriteOutcome::Written { register, value } if value != self.state.gain() => {
                debug!(?register, value, previous = self.state.gain(), "Register write");
            }
            WriteOutcome::Ignored { sel } => {
                trace!(sel, "Write to reserved register select ignored");
            }
            _ => {}
        }
        if next.lock.is_locked() != self.state.lock.is_locked() {
            debug!(
                locked = next.lock.is_locked(),
                control_word = next.control_word(),
                "Lock status change"
            );
        }
    }
}

impl PinDevice for Adpll {
    fn apply(&mut self, inputs: PinInputs) -> PinOutputs {
        self.step(inputs).pins
    }

    fn outputs(&self) -> PinOutputs {
        self.outputs
    }

    fn probe(&self) -> CoreProbe {
        self.state.probe()
    }

    fn name(&self) -> &str {
        "adpll"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase_detector::ComparatorMode;
    use crate::pins::{ui_in, uio_in};

    const RUN: PinInputs = PinInputs {
        rst_n: true,
        ena: true,
        ui_in: 0,
        uio_in: 0,
    };

    fn with_ref(level: bool) -> PinInputs {
        PinInputs {
            ui_in: (level as u8) << ui_in::CLK_REF,
            ..RUN
        }
    }

    fn program(sel: u8, value: u8) -> PinInputs {
        PinInputs {
            ui_in: (1 << ui_in::PGM) | ((sel & 1) << ui_in::PARAM_SEL),
            uio_in: value << uio_in::PGM_VALUE_SHIFT,
            ..RUN
        }
    }

    fn core() -> Adpll {
        Adpll::new(CoreConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = CoreConfig {
            feedback_divider: 1,
            ..Default::default()
        };
        assert!(Adpll::new(cfg).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unvalidated config")]
    fn test_tick_rejects_unvalidated_config() {
        let cfg = CoreConfig {
            accumulator_bits: 0,
            ..Default::default()
        };
        let state = CoreState::reset(&CoreConfig::default());
        tick(&cfg, &state, &RUN);
    }

    #[test]
    fn test_reset_forces_defaults() {
        let mut c = core();
        for i in 0..500 {
            c.apply(with_ref(i % 6 < 3));
        }
        assert_ne!(c.state().control_word(), 0);

        let out = c.apply(PinInputs { rst_n: false, ..RUN });
        assert!(out.is_quiet());
        assert_eq!(c.state(), &CoreState::reset(c.config()));
        assert_eq!(c.mode(), CoreMode::Reset);
    }

    #[test]
    fn test_reset_wins_over_disable() {
        let mut c = core();
        for _ in 0..50 {
            c.apply(RUN);
        }
        c.apply(PinInputs {
            rst_n: false,
            ena: false,
            ..RUN
        });
        assert_eq!(c.probe().ticks, 0);
        assert_eq!(c.probe().dco_phase, 0);
    }

    #[test]
    fn test_disabled_is_quiet_and_frozen() {
        let mut c = core();
        for _ in 0..37 {
            c.apply(RUN);
        }
        let frozen = *c.state();
        for i in 0..100 {
            let out = c.apply(PinInputs {
                ena: false,
                ..with_ref(i % 2 == 0)
            });
            assert!(out.is_quiet());
        }
        assert_eq!(c.state(), &frozen);
    }

    #[test]
    fn test_disabled_after_reset_stays_in_reset() {
        let mut c = core();
        c.apply(PinInputs { rst_n: false, ena: false, ..RUN });
        for _ in 0..10 {
            c.apply(PinInputs { ena: false, ..RUN });
        }
        assert_eq!(c.mode(), CoreMode::Reset);
        assert_eq!(c.outputs().uio_oe, 0);
    }

    #[test]
    fn test_free_run_rate_after_reset() {
        let mut c = core();
        c.apply(PinInputs { rst_n: false, ..RUN });
        let mut toggles = Vec::new();
        let mut prev = false;
        for t in 0..64 {
            let out = c.apply(RUN);
            assert_eq!(out.uio_oe, 0b11);
            if out.dco_out() != prev {
                toggles.push(t);
            }
            prev = out.dco_out();
        }
        // Toggles every 8 ticks from the first enabled tick
        assert_eq!(toggles, vec![7, 15, 23, 31, 39, 47, 55, 63]);
        assert_eq!(c.mode(), CoreMode::FreeRun);
        assert_eq!(c.state().control_word(), 0);
    }

    #[test]
    fn test_rec_clk_follows_feedback() {
        let mut c = core();
        for _ in 0..200 {
            let out = c.apply(RUN);
            assert_eq!(out.rec_clk(), out.fb_clk());
        }
    }

    #[test]
    fn test_reference_starts_tracking() {
        let mut c = core();
        c.apply(RUN);
        c.apply(with_ref(false));
        let out = c.step(with_ref(true));
        assert!(out.ref_edge);
        assert_eq!(out.error, PhaseError::Lag);
        assert_eq!(c.mode(), CoreMode::Tracking);
        assert_eq!(c.state().control_word(), 4);
    }

    #[test]
    fn test_write_visible_next_tick() {
        let mut c = core();
        c.apply(RUN);
        c.apply(with_ref(true)); // tracking, cw = 4

        // Program gain 20 with the reference low
        let mut pins = program(1, 20);
        pins.ui_in &= !(1 << ui_in::CLK_REF);
        c.apply(pins);
        assert_eq!(c.state().gain(), 20);
        assert_eq!(c.mode(), CoreMode::Programming);

        let mut pins = program(1, 20);
        pins.ui_in |= 1 << ui_in::CLK_REF;
        let before = c.state().control_word();
        let out = c.step(pins);
        assert_eq!(out.error, PhaseError::Lag);
        assert_eq!(c.state().control_word() - before, 20);
    }

    #[test]
    fn test_write_uses_old_gain_on_latch_tick() {
        let mut c = core();
        c.apply(RUN);
        c.apply(with_ref(false));
        // Reference edge and gain write on the same tick
        let mut pins = program(1, 30);
        pins.ui_in |= 1 << ui_in::CLK_REF;
        let out = c.step(pins);
        assert_eq!(out.error, PhaseError::Lag);
        assert_eq!(c.state().control_word(), 4);
        assert_eq!(c.state().gain(), 30);
    }

    #[test]
    fn test_programming_does_not_disturb_loop() {
        let mut a = core();
        let mut b = core();
        for i in 0..300 {
            let pins = with_ref(i % 10 < 5);
            a.apply(pins);
            // Same stimulus, but rewrite the reset gain with the strobe held
            let mut p = program(1, 4);
            p.ui_in |= pins.ui_in;
            b.apply(p);
        }
        assert_eq!(a.state().control_word(), b.state().control_word());
        assert_eq!(a.probe().dco_phase, b.probe().dco_phase);
    }

    #[test]
    fn test_reserved_select_ignored() {
        let mut c = core();
        c.apply(RUN);
        let out = c.step(program(0, 31));
        assert_eq!(out.write, WriteOutcome::Ignored { sel: 0 });
        assert_eq!(c.state().gain(), 4);
    }

    #[test]
    fn test_programming_mode_reported() {
        let mut c = core();
        c.apply(RUN);
        c.apply(program(1, 3));
        assert_eq!(c.mode(), CoreMode::Programming);
        c.apply(RUN);
        assert_eq!(c.mode(), CoreMode::FreeRun);
        assert_eq!(c.state().gain(), 3);
    }

    #[test]
    fn test_tracks_toward_reference_frequency() {
        // Reference period 12 ticks; feedback free-runs at 32
        let mut c = core();
        for i in 0..6000 {
            c.apply(with_ref(i % 12 < 6));
        }
        // Loop must have sped the DCO up
        assert!(c.state().control_word() > 0);
        assert_eq!(c.mode(), CoreMode::Tracking);
    }

    #[test]
    fn test_locks_to_reachable_reference() {
        // Feedback runs at 32 ticks with a zero control word. A 28-tick
        // reference needs an increment of 2 * 65536 / 28 ≈ 4681, so the
        // loop should settle near cw ≈ 585.
        let cfg = CoreConfig {
            lock_window: 256,
            lock_threshold: 4,
            ..Default::default()
        };
        let mut c = Adpll::new(cfg).unwrap();
        c.apply(PinInputs { rst_n: false, ..RUN });
        c.apply(program(1, 31));
        for i in 0..40_000 {
            c.apply(with_ref(i % 28 < 14));
        }
        let probe = c.probe();
        assert!(probe.locked, "did not lock: {:?}", probe);
        assert!(
            (350..850).contains(&probe.control_word),
            "control word {} far from equilibrium",
            probe.control_word
        );
    }

    #[test]
    fn test_tri_state_tracks_faster_reference() {
        let cfg = CoreConfig {
            comparator: ComparatorMode::TriState,
            ..Default::default()
        };
        let mut c = Adpll::new(cfg).unwrap();
        c.apply(program(1, 1));
        for i in 0..3000 {
            c.apply(with_ref(i % 20 < 10));
        }
        assert!(c.state().control_word() > 0);
    }

    #[test]
    fn test_tri_state_quiet_ticks_in_phase() {
        let cfg = CoreConfig {
            comparator: ComparatorMode::TriState,
            ..Default::default()
        };
        let mut c = Adpll::new(cfg).unwrap();
        c.apply(PinInputs { rst_n: false, ..RUN });

        // Reference edge on the first enabled tick arms UP
        let out = c.step(with_ref(true));
        assert!(out.ref_edge);
        assert_eq!(out.error, PhaseError::InPhase);
        assert_eq!(c.state().comparator.state(), PfdState::Up);

        for _ in 1..8 {
            let out = c.step(with_ref(true));
            assert_eq!(out.error, PhaseError::InPhase);
            assert_eq!(out.magnitude, 0);
        }

        // First feedback edge is seen on tick 8
        let out = c.step(with_ref(true));
        assert_eq!(out.error, PhaseError::Lag);
        assert_eq!(out.magnitude, 8);
        assert_eq!(c.state().comparator.state(), PfdState::Idle);
    }

    #[test]
    fn test_deterministic_replay() {
        let run = || {
            let mut c = core();
            c.apply(program(1, 0b10101));
            let mut trace = Vec::new();
            for i in 0..2000 {
                trace.push(c.apply(with_ref(i % 9 < 4)));
            }
            (trace, c.probe())
        };
        assert_eq!(run(), run());
    }
}

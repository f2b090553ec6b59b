//! # Testbench
//!
//! Cycle-level driver for any [`PinDevice`]. The testbench owns the levels
//! presented on every input pin; each call to [`Testbench::clock`] applies
//! the reference stimulus, presents the pins for one rising edge and feeds
//! the resulting outputs to the monitors.
//!
//! ## Example
//!
//! ```rust
//! use adpll_core::{Adpll, CoreConfig};
//! use adpll_sim::testbench::Testbench;
//! use adpll_sim::monitor::OutputSignal;
//!
//! let mut tb = Testbench::new(Adpll::new(CoreConfig::default()).unwrap());
//! tb.reset(5);
//! tb.set_enable(true);
//! tb.program_gain(0b10101, 2).unwrap();
//! tb.clock_cycles(200);
//! assert!(tb.monitor().toggles(OutputSignal::DcoOut) > 0);
//! ```

use adpll_core::pins::{ui_in, uio_in};
use adpll_core::registers::{GAIN_BITS, GAIN_MAX, SEL_GAIN};
use adpll_core::{CoreProbe, PinDevice, PinInputs, PinOutputs};
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::monitor::{OutputMonitor, OutputSignal, SignalTrace, ToggleCounter};
use crate::stimulus::{ReferenceGenerator, ReferenceSource};

/// Cycle-level driver around a device under test.
pub struct Testbench<D: PinDevice> {
    dut: D,
    pins: PinInputs,
    reference: ReferenceGenerator,
    monitor: OutputMonitor,
    trace: Option<SignalTrace>,
    cycle: u64,
}

impl<D: PinDevice> Testbench<D> {
    /// Wrap a device. All inputs start low (reset asserted, disabled) and
    /// the reference is idle.
    pub fn new(dut: D) -> Self {
        Self {
            dut,
            pins: PinInputs::default(),
            reference: ReferenceGenerator::idle(),
            monitor: OutputMonitor::default(),
            trace: None,
            cycle: 0,
        }
    }

    /// Replace the reference stimulus.
    pub fn set_reference(&mut self, source: ReferenceSource) -> SimResult<()> {
        self.reference = ReferenceGenerator::new(source)?;
        Ok(())
    }

    /// Record up to `limit` cycles of pin activity from now on.
    pub fn enable_trace(&mut self, limit: usize) {
        self.trace = Some(SignalTrace::new(limit));
    }

    /// Recorded trace, if tracing is enabled.
    pub fn trace(&self) -> Option<&SignalTrace> {
        self.trace.as_ref()
    }

    /// Drive `rst_n` low (`true`) or high (`false`).
    pub fn set_reset(&mut self, asserted: bool) {
        self.pins.rst_n = !asserted;
    }

    /// Drive `ena`.
    pub fn set_enable(&mut self, enabled: bool) {
        self.pins.ena = enabled;
    }

    /// Hold reset for `cycles` edges, then release it.
    pub fn reset(&mut self, cycles: u32) {
        self.set_reset(true);
        self.clock_cycles(cycles as u64);
        self.set_reset(false);
    }

    /// Apply one rising edge.
    pub fn clock(&mut self) -> PinOutputs {
        self.pins.ui_in = self.reference.drive(self.pins.ui_in);
        let outputs = self.dut.apply(self.pins);
        trace!(
            cycle = self.cycle,
            ui_in = self.pins.ui_in,
            uo_out = outputs.uo_out,
            uio_out = outputs.uio_out,
            uio_oe = outputs.uio_oe,
            "tick"
        );
        self.monitor.observe(self.cycle, &outputs);
        if let Some(trace) = self.trace.as_mut() {
            trace.record(self.cycle, self.pins, outputs);
        }
        self.cycle += 1;
        outputs
    }

    /// Apply `n` rising edges.
    pub fn clock_cycles(&mut self, n: u64) {
        for _ in 0..n {
            self.clock();
        }
    }

    /// Clock until `done` holds for the outputs, at most `max_cycles` edges.
    ///
    /// Returns the number of edges applied when the predicate held.
    pub fn run_until<F>(&mut self, max_cycles: u64, mut done: F) -> Option<u64>
    where
        F: FnMut(&PinOutputs) -> bool,
    {
        for n in 1..=max_cycles {
            let out = self.clock();
            if done(&out) {
                return Some(n);
            }
        }
        None
    }

    /// Clock up to `max_cycles` edges counting changes of `signal`
    /// relative to its current level. Stops once `min_toggles` is reached.
    pub fn count_toggles(&mut self, signal: OutputSignal, max_cycles: u64, min_toggles: u64) -> u64 {
        let mut counter = ToggleCounter::from_level(signal.sample(&self.dut.outputs()));
        for _ in 0..max_cycles {
            let out = self.clock();
            counter.observe(signal.sample(&out));
            if counter.toggles() >= min_toggles {
                break;
            }
        }
        counter.toggles()
    }

    /// Run the level-triggered programming sequence: present `sel` and
    /// `value`, hold the strobe for `strobe_cycles` edges, then release it
    /// for one edge.
    ///
    /// A ramp reference owns the whole `ui_in` bus and will overwrite the
    /// strobe and select bits.
    pub fn program_register(&mut self, sel: u8, value: u8, strobe_cycles: u32) -> SimResult<()> {
        if value > GAIN_MAX {
            return Err(SimError::ValueTooWide {
                value,
                bits: GAIN_BITS,
            });
        }

        let sel_mask = 1u8 << ui_in::PARAM_SEL;
        let pgm_mask = 1u8 << ui_in::PGM;
        self.pins.ui_in = (self.pins.ui_in & !sel_mask) | ((sel & 1) << ui_in::PARAM_SEL);
        let field = uio_in::PGM_VALUE_MASK << uio_in::PGM_VALUE_SHIFT;
        self.pins.uio_in = (self.pins.uio_in & !field) | (value << uio_in::PGM_VALUE_SHIFT);

        self.pins.ui_in |= pgm_mask;
        self.clock_cycles(strobe_cycles as u64);
        self.pins.ui_in &= !pgm_mask;
        self.clock();
        Ok(())
    }

    /// Program the loop gain.
    pub fn program_gain(&mut self, value: u8, strobe_cycles: u32) -> SimResult<()> {
        self.program_register(SEL_GAIN, value, strobe_cycles)
    }

    /// Edges applied so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Levels currently presented on the inputs.
    pub fn pins(&self) -> PinInputs {
        self.pins
    }

    /// Outputs after the last edge.
    pub fn outputs(&self) -> PinOutputs {
        self.dut.outputs()
    }

    /// Internal state of the device.
    pub fn probe(&self) -> CoreProbe {
        self.dut.probe()
    }

    pub fn monitor(&self) -> &OutputMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut OutputMonitor {
        &mut self.monitor
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    /// Consume the testbench, returning the device.
    pub fn into_dut(self) -> D {
        self.dut
    }
}

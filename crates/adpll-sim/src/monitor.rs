//! # Output Monitors
//!
//! Passive observers of the pin outputs: toggle counters, rising-edge
//! period meters and a bounded per-cycle trace.

use adpll_core::{PinInputs, PinOutputs};
use serde::{Deserialize, Serialize};

/// Output signal selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSignal {
    /// `uio_out[1]`
    DcoOut,
    /// `uio_out[0]`
    FbClk,
    /// `uo_out[1]`
    RecClk,
    /// `dco_out` or `fb_clk`, whichever changes
    AnyOscillator,
}

impl OutputSignal {
    /// Sample the selected signal.
    ///
    /// `AnyOscillator` is encoded as a 2-bit value so a change on either
    /// line registers as a change.
    pub fn sample(self, out: &PinOutputs) -> u8 {
        match self {
            OutputSignal::DcoOut => out.dco_out() as u8,
            OutputSignal::FbClk => out.fb_clk() as u8,
            OutputSignal::RecClk => out.rec_clk() as u8,
            OutputSignal::AnyOscillator => ((out.dco_out() as u8) << 1) | out.fb_clk() as u8,
        }
    }
}

impl std::fmt::Display for OutputSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputSignal::DcoOut => write!(f, "dco_out"),
            OutputSignal::FbClk => write!(f, "fb_clk"),
            OutputSignal::RecClk => write!(f, "rec_clk"),
            OutputSignal::AnyOscillator => write!(f, "dco_out|fb_clk"),
        }
    }
}

/// Counts value changes of one signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleCounter {
    prev: Option<u8>,
    toggles: u64,
}

impl ToggleCounter {
    /// Start counting relative to a known level.
    pub fn from_level(level: u8) -> Self {
        Self {
            prev: Some(level),
            toggles: 0,
        }
    }

    /// Observe one sample.
    pub fn observe(&mut self, value: u8) {
        if let Some(prev) = self.prev {
            if prev != value {
                self.toggles += 1;
            }
        }
        self.prev = Some(value);
    }

    /// Changes seen so far.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

/// Measures the mean spacing of rising edges of one signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodMeter {
    prev: bool,
    first_edge: Option<u64>,
    last_edge: Option<u64>,
    edges: u64,
}

impl PeriodMeter {
    /// Observe one sample taken at `cycle`.
    pub fn observe(&mut self, cycle: u64, level: bool) {
        if level && !self.prev {
            self.first_edge.get_or_insert(cycle);
            self.last_edge = Some(cycle);
            self.edges += 1;
        }
        self.prev = level;
    }

    /// Rising edges seen so far.
    pub fn edges(&self) -> u64 {
        self.edges
    }

    /// Mean period in cycles; needs at least two rising edges.
    pub fn mean_period(&self) -> Option<f64> {
        match (self.first_edge, self.last_edge) {
            (Some(first), Some(last)) if self.edges >= 2 => {
                Some((last - first) as f64 / (self.edges - 1) as f64)
            }
            _ => None,
        }
    }

    /// Forget all edges but keep the current level.
    pub fn restart(&mut self) {
        *self = Self {
            prev: self.prev,
            ..Default::default()
        };
    }
}

/// Toggle counts and period meters for every oscillator output.
#[derive(Debug, Clone, Default)]
pub struct OutputMonitor {
    pub dco_out: PeriodMeter,
    pub fb_clk: PeriodMeter,
    pub rec_clk: PeriodMeter,
    dco_toggles: ToggleCounter,
    fb_toggles: ToggleCounter,
    rec_toggles: ToggleCounter,
    quiet_cycles: u64,
}

impl OutputMonitor {
    /// Observe the outputs after the edge at `cycle`.
    pub fn observe(&mut self, cycle: u64, out: &PinOutputs) {
        self.dco_out.observe(cycle, out.dco_out());
        self.fb_clk.observe(cycle, out.fb_clk());
        self.rec_clk.observe(cycle, out.rec_clk());
        self.dco_toggles.observe(out.dco_out() as u8);
        self.fb_toggles.observe(out.fb_clk() as u8);
        self.rec_toggles.observe(out.rec_clk() as u8);
        if out.is_quiet() {
            self.quiet_cycles += 1;
        }
    }

    /// Toggles of a signal since the monitor was created.
    pub fn toggles(&self, signal: OutputSignal) -> u64 {
        match signal {
            OutputSignal::DcoOut => self.dco_toggles.toggles(),
            OutputSignal::FbClk => self.fb_toggles.toggles(),
            OutputSignal::RecClk => self.rec_toggles.toggles(),
            OutputSignal::AnyOscillator => self.dco_toggles.toggles() + self.fb_toggles.toggles(),
        }
    }

    /// Cycles on which every output and output enable read zero.
    pub fn quiet_cycles(&self) -> u64 {
        self.quiet_cycles
    }

    /// Restart the period meters (e.g. after a configuration change).
    pub fn restart_periods(&mut self) {
        self.dco_out.restart();
        self.fb_clk.restart();
        self.rec_clk.restart();
    }
}

/// One traced cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSample {
    pub cycle: u64,
    pub inputs: PinInputs,
    pub outputs: PinOutputs,
}

/// Bounded record of pin activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalTrace {
    limit: usize,
    samples: Vec<TraceSample>,
    dropped: u64,
}

impl SignalTrace {
    /// Trace keeping at most `limit` samples; later samples are dropped.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            samples: Vec::with_capacity(limit.min(1 << 16)),
            dropped: 0,
        }
    }

    /// Record one cycle.
    pub fn record(&mut self, cycle: u64, inputs: PinInputs, outputs: PinOutputs) {
        if self.samples.len() < self.limit {
            self.samples.push(TraceSample {
                cycle,
                inputs,
                outputs,
            });
        } else {
            self.dropped += 1;
        }
    }

    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }

    /// Samples that did not fit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

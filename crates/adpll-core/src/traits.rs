//! Pin-level device trait
//!
//! The seam between the core and whatever drives it. A testbench only
//! needs a device that takes pin levels on a rising clock edge and returns
//! pin levels after it.

use crate::adpll::CoreProbe;
use crate::pins::{PinInputs, PinOutputs};

/// A synchronous device exposing the fixed pin contract.
///
/// # Example
///
/// ```rust
/// use adpll_core::{Adpll, CoreConfig, PinDevice, PinInputs};
///
/// fn hold_reset(dev: &mut dyn PinDevice, cycles: usize) {
///     for _ in 0..cycles {
///         dev.apply(PinInputs::default());
///     }
/// }
///
/// let mut core = Adpll::new(CoreConfig::default()).unwrap();
/// hold_reset(&mut core, 5);
/// assert!(core.outputs().is_quiet());
/// ```
pub trait PinDevice: Send {
    /// Apply one rising clock edge with the given input levels.
    fn apply(&mut self, inputs: PinInputs) -> PinOutputs;

    /// Output levels after the last edge.
    fn outputs(&self) -> PinOutputs;

    /// Internal state snapshot.
    fn probe(&self) -> CoreProbe;

    /// Device name for logs and reports.
    fn name(&self) -> &str {
        "device"
    }
}

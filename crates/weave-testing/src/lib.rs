//! Testing utilities and harness for Weave.

mod deadline;
mod memory_host;

pub use deadline::{BudgetDeadline, NoYield};
pub use memory_host::{HostOp, MemoryHost, MemoryNode};

use weave_core::{HostAdapter, HostError, Renderer, SliceOutcome};

/// Drives `renderer` in slices of `units_per_slice` work nodes until a slice
/// reports no remaining work, returning how many slices it took.
pub fn drive_to_idle<H: HostAdapter>(
    renderer: &mut Renderer<H>,
    units_per_slice: usize,
) -> Result<usize, HostError> {
    let mut slices = 0;
    loop {
        let outcome = renderer.run_slice(&BudgetDeadline::new(units_per_slice))?;
        slices += 1;
        if outcome == SliceOutcome::Idle {
            return Ok(slices);
        }
    }
}

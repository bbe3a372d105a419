//! Concrete calculators and the glue that runs them through
//! [`crate::lifecycle`].
//!
//! Every calculation mode in `oq-calc::registry` maps to one of these.
//! Real seismological/vulnerability computation is delegated to the
//! trait ports in `oq-hazard`/`oq-risk`/`oq-source` (§1 Non-goals), so a
//! calculator struct here is constructed with whichever concrete port
//! implementations the deployment provides — this module only owns the
//! four-phase state machine and the store-sharing/rebinding rule between
//! a pre-calculator and its dependent, not the physics.

pub mod classical;
pub mod event_based;
pub mod scenario;

use crate::lifecycle::{CalcContext, Calculator};
use crate::error::CalcResult;

/// Runs a pre-calculator's full lifecycle (minus export/clean_up, which
/// belong to whichever calculator finishes the run) over `ctx`, then hands
/// the same context — and so the same store — to the dependent
/// calculator. Mirrors `base.py::BaseCalculator.run`'s "pre-calculator
/// chaining" branch: pre-calculator and dependent share one store, no
/// separate calculation id or parent-store rebinding involved.
pub fn run_chained<P, M>(pre: &mut P, main: &mut M, ctx: &mut CalcContext) -> CalcResult<Vec<String>>
where
    P: Calculator,
    M: Calculator,
{
    pre.pre_execute(ctx)?;
    let pre_result = pre.execute(ctx)?;
    pre.post_execute(ctx, pre_result)?;
    crate::lifecycle::run(main, ctx)
}

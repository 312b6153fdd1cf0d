//! Scenario in, report out.

use crate::loader::{LoadedScenario, load};
use crate::report::{Report, build_report};
use crate::scenario::Scenario;
use anyhow::{Context, Result};
use polyinfer_solver::{
    ExprData, InferenceContext, InferenceError, InferenceLimits, InferenceOutcome, NominalOracle,
    TypeId,
};
use tracing::info;

/// Parse, load and infer one scenario given as JSON text.
pub fn run(source: &str, limits: InferenceLimits) -> Result<Report> {
    let scenario: Scenario = serde_json::from_str(source).context("invalid scenario")?;
    let loaded = load(&scenario)?;
    let result = infer(&loaded, limits);
    let report = build_report(&loaded, result);
    info!(ok = report.is_ok(), "scenario finished");
    Ok(report)
}

/// A call at the root is inferred with its (optional) assignment target;
/// any other expression needs a target, `void` if none is given.
pub fn infer(
    scenario: &LoadedScenario,
    limits: InferenceLimits,
) -> Result<InferenceOutcome, InferenceError> {
    let oracle = NominalOracle::new(&scenario.db);
    let ctx = InferenceContext::new(&scenario.db, &oracle, &scenario.exprs).with_limits(limits);
    match scenario.exprs.get(scenario.root) {
        Some(ExprData::Call(_)) => ctx.infer_call(scenario.root, scenario.target),
        _ => ctx.infer_expression(scenario.root, scenario.target.unwrap_or(TypeId::VOID)),
    }
}

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod tests;

//! C6 — Batch Orchestrator.
//!
//! Runs the same flight table and constraint bundle through the engine
//! once per weight vector, the way the original tool swept trade-off
//! curves by re-solving under a list of weightings (spec.md §4.6, §8). One
//! run's failure never aborts the batch; it is recorded in place and the
//! next weight vector still runs, preserving input order throughout.

use tracing::{info, warn};

use crate::config::{CostParams, SolveLimits, WeightVector};
use crate::constraints::CompiledConstraints;
use crate::error::EngineError;
use crate::flight::Flight;
use crate::model::build_model;
use crate::result::ResultTable;
use crate::solver::resolve_backend;

/// One run's place in the batch and its outcome.
pub struct BatchRun {
    pub weights: WeightVector,
    pub result: ResultTable,
}

/// The full batch result, in the same order the weight vectors were given.
pub struct BatchOutcome {
    pub runs: Vec<BatchRun>,
}

/// C6 entry point.
pub fn batch_solve(
    flights: &[Flight],
    compiled: &CompiledConstraints,
    weight_vectors: &[WeightVector],
    cost: &CostParams,
    limits: &SolveLimits,
    solver_name: &str,
) -> Result<BatchOutcome, EngineError> {
    let backend = resolve_backend(solver_name)?;
    let mut runs = Vec::with_capacity(weight_vectors.len());

    for (i, weights) in weight_vectors.iter().enumerate() {
        info!(run = i, weights = ?weights, "solving weight vector");
        let model = build_model(flights, compiled, weights, cost);
        let outcome = backend.solve(model, limits)?;
        if outcome.reason.is_some() {
            warn!(run = i, reason = ?outcome.reason, status = ?outcome.status, "run did not reach an optimum");
        }
        let result = crate::result::extract_results(flights, outcome);
        runs.push(BatchRun {
            weights: *weights,
            result,
        });
    }

    Ok(BatchOutcome { runs })
}

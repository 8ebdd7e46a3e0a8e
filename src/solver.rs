//! C4 — Solver Driver.
//!
//! Wraps a single `good_lp`/CBC backend behind a narrow trait so a second
//! backend is a new impl, not a rewrite of the model builder or result
//! extractor (spec.md §9, "Solver abstraction"). `solve()` consumes the
//! `Model` by value: once a model has been handed to the solver there is no
//! way to solve it again or inspect its pre-solve state, matching the
//! scoped-acquisition lifecycle the model builder documents.

use good_lp::{Solution, SolverModel};

use crate::config::SolveLimits;
use crate::error::EngineError;
use crate::model::{FlightVariables, Model, SlackEntry};

/// How a solve attempt concluded. `good_lp`'s high-level API surfaces a
/// proven optimum or a `ResolutionError`; it does not distinguish a
/// time-limited feasible-but-unproven solution from a proven optimum, so
/// every `Ok` is reported as `Optimal` — a known limitation of the
/// abstraction, not of the model (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

/// Everything downstream (C5, the result extractor) needs to read values
/// back out of a solved model.
pub struct SolverOutcome {
    pub status: TerminationStatus,
    pub reason: Option<String>,
    pub objective_value: Option<f64>,
    pub solution: Option<Box<dyn Solution>>,
    pub flight_vars: Option<FlightVariables>,
    pub slacks: Vec<SlackEntry>,
}

impl SolverOutcome {
    fn failed(status: TerminationStatus, reason: String, slacks: Vec<SlackEntry>) -> Self {
        SolverOutcome {
            status,
            reason: Some(reason),
            objective_value: None,
            solution: None,
            flight_vars: None,
            slacks,
        }
    }
}

/// A pluggable MILP backend. The only implementation shipped here is CBC,
/// but batch callers (C6) select by name, so adding a second backend never
/// touches the model builder.
pub trait SolverBackend {
    fn name(&self) -> &'static str;
    fn solve(&self, model: Model, limits: &SolveLimits) -> Result<SolverOutcome, EngineError>;
}

/// The default backend: `good_lp`'s CBC bindings.
pub struct CbcBackend;

impl SolverBackend for CbcBackend {
    fn name(&self) -> &'static str {
        "cbc"
    }

    fn solve(&self, model: Model, limits: &SolveLimits) -> Result<SolverOutcome, EngineError> {
        let Model {
            vars,
            objective,
            constraints,
            flight_vars,
            slacks,
        } = model;

        let objective_for_eval = objective.clone();
        let mut problem = vars.minimise(objective).using(good_lp::solvers::coin_cbc::coin_cbc);
        for c in constraints {
            problem = problem.with(c);
        }
        problem.set_parameter("seconds", &limits.time_limit_s.to_string());
        problem.set_parameter("ratioGap", &limits.mip_gap.to_string());

        match problem.solve() {
            Ok(solution) => {
                let objective_value = objective_for_eval.eval_with(&solution);
                Ok(SolverOutcome {
                    status: TerminationStatus::Optimal,
                    reason: None,
                    objective_value: Some(objective_value),
                    solution: Some(Box::new(solution)),
                    flight_vars: Some(flight_vars),
                    slacks,
                })
            }
            Err(good_lp::ResolutionError::Infeasible) => Ok(SolverOutcome::failed(
                TerminationStatus::Infeasible,
                "no feasible assignment satisfies every hard constraint".to_string(),
                slacks,
            )),
            Err(good_lp::ResolutionError::Unbounded) => Ok(SolverOutcome::failed(
                TerminationStatus::Unbounded,
                "objective is unbounded".to_string(),
                slacks,
            )),
            Err(other) => Ok(SolverOutcome::failed(TerminationStatus::Error, other.to_string(), slacks)),
        }
    }
}

/// Resolves a solver by name. The only name recognized today is `"cbc"`;
/// anything else is an `UnknownSolver` error rather than a silent fallback.
pub fn resolve_backend(name: &str) -> Result<Box<dyn SolverBackend>, EngineError> {
    match name {
        "cbc" => Ok(Box::new(CbcBackend)),
        other => Err(EngineError::UnknownSolver(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_name_is_rejected() {
        assert!(resolve_backend("gurobi").is_err());
    }

    #[test]
    fn cbc_backend_is_resolved() {
        assert!(resolve_backend("cbc").is_ok());
    }
}

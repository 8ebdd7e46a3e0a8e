//! C5 — Result Extractor.
//!
//! Turns a solved (or failed) model into the per-flight decision table and
//! soft-constraint diagnostics spec.md §4.5 describes, reading variable
//! values back out of the `good_lp` solution rather than re-deriving them.

use chrono::{Duration, NaiveDateTime};
use good_lp::{Solution, Variable};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tracing::info;

use crate::flight::{Flight, FlightId};
use crate::solver::{SolverOutcome, TerminationStatus};

/// The recovery action the model chose for one flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Keep,
    Delay,
    Swap,
    Cancel,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Keep => "KEEP",
            Action::Delay => "DELAY",
            Action::Swap => "SWAP",
            Action::Cancel => "CANCEL",
        };
        write!(f, "{s}")
    }
}

/// Whether a flight made it onto the operated schedule at all (spec.md
/// §4.5, §6): `Cancelled` flights carry no `adjusted_departure_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Operated,
    Cancelled,
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlightStatus::Operated => "operated",
            FlightStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

fn display_naive(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

fn display_adjusted(dt: &Option<NaiveDateTime>) -> String {
    dt.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_else(|| "-".to_string())
}

/// One flight's resolved decision.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct ResultRow {
    pub flight_id: FlightId,
    pub flight_number: String,
    pub action: Action,
    pub status: FlightStatus,
    pub delay_minutes: i64,
    #[tabled(display = "display_naive")]
    pub scheduled_departure: NaiveDateTime,
    #[tabled(display = "display_naive")]
    pub target_departure: NaiveDateTime,
    #[tabled(display = "display_adjusted")]
    pub adjusted_departure_time: Option<NaiveDateTime>,
}

/// A soft constraint whose slack absorbed part of the assignment.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct SlackViolation {
    pub name: String,
    pub amount: f64,
}

/// The full outcome of one solve, ready to print or feed into the batch
/// summary (spec.md §4.5, §8).
#[derive(Debug, Clone)]
pub struct ResultTable {
    pub status: TerminationStatus,
    pub objective_value: Option<f64>,
    pub rows: Vec<ResultRow>,
    pub violations: Vec<SlackViolation>,
}

/// Slack values below this are solver numerical noise, not a real
/// constraint breach, and are not reported (spec.md §4.5).
const SLACK_REPORT_THRESHOLD: f64 = 0.001;

fn action_of(solution: &dyn Solution, cancel: Variable, swap: Variable, d: Variable) -> (Action, i64) {
    let delay_minutes = solution.value(d).round() as i64;
    if solution.value(cancel) > 0.5 {
        (Action::Cancel, 0)
    } else if solution.value(swap) > 0.5 {
        (Action::Swap, delay_minutes)
    } else if delay_minutes > 0 {
        (Action::Delay, delay_minutes)
    } else {
        (Action::Keep, 0)
    }
}

/// C5 entry point.
pub fn extract_results(flights: &[Flight], outcome: SolverOutcome) -> ResultTable {
    let SolverOutcome {
        status,
        objective_value,
        solution,
        flight_vars,
        slacks,
        ..
    } = outcome;

    let (Some(solution), Some(fv)) = (solution, flight_vars) else {
        return ResultTable {
            status,
            objective_value,
            rows: Vec::new(),
            violations: Vec::new(),
        };
    };

    let rows = flights
        .iter()
        .map(|f| {
            let cancel = fv.cancel[&f.id];
            let swap = fv.swap[&f.id];
            let d = fv.d[&f.id];
            let (action, delay_minutes) = action_of(solution.as_ref(), cancel, swap, d);
            let status = if action == Action::Cancel {
                FlightStatus::Cancelled
            } else {
                FlightStatus::Operated
            };
            let adjusted_departure_time = (action != Action::Cancel)
                .then(|| f.target_departure + Duration::minutes(delay_minutes));
            ResultRow {
                flight_id: f.id.clone(),
                flight_number: f.flight_number.clone(),
                action,
                status,
                delay_minutes,
                scheduled_departure: f.scheduled_departure,
                target_departure: f.target_departure,
                adjusted_departure_time,
            }
        })
        .collect();

    let violations: Vec<SlackViolation> = slacks
        .iter()
        .filter_map(|s| {
            let amount = solution.value(s.variable);
            (amount > SLACK_REPORT_THRESHOLD).then_some(SlackViolation {
                name: s.name.clone(),
                amount,
            })
        })
        .collect();

    if !violations.is_empty() {
        info!(count = violations.len(), "soft constraints absorbed slack");
    }

    ResultTable {
        status,
        objective_value,
        rows,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_outcome_yields_empty_table() {
        let outcome = SolverOutcome {
            status: TerminationStatus::Infeasible,
            reason: Some("no feasible assignment".to_string()),
            objective_value: None,
            solution: None,
            flight_vars: None,
            slacks: Vec::new(),
        };
        let table = extract_results(&[], outcome);
        assert!(table.rows.is_empty());
        assert!(table.violations.is_empty());
        assert_eq!(table.status, TerminationStatus::Infeasible);
    }
}

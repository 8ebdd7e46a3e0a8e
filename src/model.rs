//! C3 — Model Builder.
//!
//! Declares the decision variables (spec.md §3), links them with the
//! structural constraints every flight obeys regardless of which rules
//! apply to it, realizes each compiled constraint (C2) as `good_lp`
//! variables and inequalities, and assembles the weighted objective.
//!
//! `Model` is the scoped resource this module hands to the solver driver:
//! it owns the `good_lp` problem state and the slack-variable registry, is
//! not `Clone`, and is consumed by value on the way into `solve()` — there
//! is no path to reuse it after that (spec.md §9, ownership & lifecycle).

use std::collections::HashMap;
use std::sync::Arc;

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};

use crate::config::{CostParams, WeightVector};
use crate::constraints::{CompiledConstraint, CompiledConstraints, CurfewSide, Priority};
use crate::flight::{Flight, FlightId};
use crate::time::MINUTES_PER_DAY;

/// One variable per flight, for each of the six decision variables in
/// spec.md §3.
#[derive(Debug, Clone, Default)]
pub struct FlightVariables {
    pub cancel: HashMap<FlightId, Variable>,
    pub swap: HashMap<FlightId, Variable>,
    pub x: HashMap<FlightId, Variable>,
    pub d: HashMap<FlightId, Variable>,
    pub dep_mod: HashMap<FlightId, Variable>,
    pub arr_mod: HashMap<FlightId, Variable>,
}

/// A soft-constraint slack variable, tagged with the label the result
/// extractor reports it under and the priority that set its penalty.
#[derive(Debug, Clone)]
pub struct SlackEntry {
    pub name: String,
    pub variable: Variable,
    pub priority: Priority,
}

fn penalty_for(cost: &CostParams, priority: Priority) -> f64 {
    match priority {
        Priority::Must => 0.0, // hard constraints never carry a slack
        Priority::High => cost.penalty_high,
        Priority::Medium => cost.penalty_medium,
        Priority::Low => cost.penalty_low,
    }
}

/// The model handle: owns every `good_lp` artifact needed to solve, plus
/// the bookkeeping the result extractor (C5) needs afterward.
pub struct Model {
    pub(crate) vars: ProblemVariables,
    pub(crate) objective: Expression,
    pub(crate) constraints: Vec<Constraint>,
    pub flight_vars: FlightVariables,
    pub slacks: Vec<SlackEntry>,
}

/// C3 entry point.
pub fn build_model(
    flights: &[Flight],
    compiled: &CompiledConstraints,
    weights: &WeightVector,
    cost: &CostParams,
) -> Model {
    let mut vars = ProblemVariables::new();
    let mut flight_vars = FlightVariables::default();
    let mut constraints = Vec::new();
    let mut slacks = Vec::new();

    for f in flights {
        let cancel = vars.add(variable().binary());
        let swap = vars.add(variable().binary());
        let x = vars.add(variable().binary());
        let d = vars.add(variable().min(0.0).max(cost.max_delay_minutes as f64));
        let dep_mod = vars.add(variable().min(0.0).max((2 * MINUTES_PER_DAY) as f64));
        let arr_mod = vars.add(variable().min(0.0).max((2 * MINUTES_PER_DAY) as f64));

        // 1. action exclusivity
        constraints.push(constraint!(swap + cancel <= 1.0));
        // 2. operation link
        constraints.push(constraint!(x + cancel == 1.0));
        // 3. delay gating: cancelled flights carry zero charged delay
        constraints.push(constraint!(d <= x * (cost.max_delay_minutes as f64)));
        // 4. departure time identity
        constraints.push(constraint!(dep_mod == d + f.target_dep_min_of_day as f64));
        // 5. arrival time identity
        constraints.push(constraint!(
            arr_mod == d + (f.target_dep_min_of_day + f.flight_duration_minutes) as f64
        ));

        flight_vars.cancel.insert(f.id.clone(), cancel);
        flight_vars.swap.insert(f.id.clone(), swap);
        flight_vars.x.insert(f.id.clone(), x);
        flight_vars.d.insert(f.id.clone(), d);
        flight_vars.dep_mod.insert(f.id.clone(), dep_mod);
        flight_vars.arr_mod.insert(f.id.clone(), arr_mod);
    }

    for compiled_constraint in &compiled.constraints {
        apply_compiled_constraint(
            compiled_constraint,
            &mut vars,
            &flight_vars,
            cost,
            &mut constraints,
            &mut slacks,
        );
    }

    let objective = assemble_objective(flights, &flight_vars, &slacks, weights, cost);

    Model {
        vars,
        objective,
        constraints,
        flight_vars,
        slacks,
    }
}

fn assemble_objective(
    flights: &[Flight],
    fv: &FlightVariables,
    slacks: &[SlackEntry],
    weights: &WeightVector,
    cost: &CostParams,
) -> Expression {
    let mut objective = Expression::from(0.0);

    for f in flights {
        let cancel = fv.cancel[&f.id];
        let swap = fv.swap[&f.id];
        let d = fv.d[&f.id];
        objective += cancel * (weights.cancel * f.revenue);
        objective += swap * (weights.swap * cost.c_swap);
        objective += d * (weights.delay * cost.c_delay_per_min);
    }

    // Soft-constraint penalties are absolute: weights multiply only the
    // three action terms above (spec.md §4.3, §9).
    for slack in slacks {
        objective += slack.variable * penalty_for(cost, slack.priority);
    }

    objective
}

fn apply_compiled_constraint(
    compiled: &CompiledConstraint,
    vars: &mut ProblemVariables,
    fv: &FlightVariables,
    cost: &CostParams,
    constraints: &mut Vec<Constraint>,
    slacks: &mut Vec<SlackEntry>,
) {
    match compiled {
        CompiledConstraint::Curfew {
            airport,
            start_min,
            end_min,
            priority,
            applications,
        } => {
            for app in applications {
                compile_curfew_application(
                    airport,
                    *start_min,
                    *end_min,
                    *priority,
                    app,
                    vars,
                    fv,
                    cost,
                    constraints,
                    slacks,
                );
            }
        }
        CompiledConstraint::HourlyCapacity {
            airport,
            window,
            limit,
            priority,
            flights_in_window,
        } => {
            let departures = flights_in_window
                .iter()
                .fold(Expression::from(0.0), |acc, id| acc + fv.x[id]);

            if priority.is_hard() {
                constraints.push(departures.leq(*limit as f64));
            } else {
                let overage = vars.add(variable().min(0.0));
                constraints.push(constraint!(departures <= overage + *limit as f64));
                slacks.push(SlackEntry {
                    name: format!("capacity_overage_{airport}_{window}"),
                    variable: overage,
                    priority: *priority,
                });
            }
        }
        CompiledConstraint::CancelQuota { limit, priority } => {
            let total = fv.cancel.values().fold(Expression::from(0.0), |acc, v| acc + *v);
            if priority.is_hard() {
                constraints.push(total.leq(*limit as f64));
            } else {
                let overage = vars.add(variable().min(0.0));
                constraints.push(constraint!(total <= overage + *limit as f64));
                slacks.push(SlackEntry {
                    name: "quota_overage_cancel".to_string(),
                    variable: overage,
                    priority: *priority,
                });
            }
        }
        CompiledConstraint::SwapQuota { limit, priority } => {
            let total = fv.swap.values().fold(Expression::from(0.0), |acc, v| acc + *v);
            if priority.is_hard() {
                constraints.push(total.leq(*limit as f64));
            } else {
                let overage = vars.add(variable().min(0.0));
                constraints.push(constraint!(total <= overage + *limit as f64));
                slacks.push(SlackEntry {
                    name: "quota_overage_swap".to_string(),
                    variable: overage,
                    priority: *priority,
                });
            }
        }
    }
}

/// Encodes one flight's exposure to one curfew rule as a Big-M
/// disjunction, mirroring `Optimizer.py::_apply_airport_curfew`'s
/// single-`time_var` pair exactly: a `side` selector forces the time
/// variable to lie either at or before `end_min` or at or after
/// `start_min`, so it can never land in the forbidden gap between them.
/// `dep_mod`/`arr_mod` are never wrapped modulo a day — a delay that
/// pushes a flight past midnight simply grows the variable past 1440,
/// and the `>= start_min` arm still catches it, so no separate day
/// selector is needed (see SPEC_FULL.md §4.2 and DESIGN.md's curfew
/// open-question resolution).
#[allow(clippy::too_many_arguments)]
fn compile_curfew_application(
    airport: &Arc<str>,
    start_min: i64,
    end_min: i64,
    priority: Priority,
    app: &crate::constraints::CurfewApplication,
    vars: &mut ProblemVariables,
    fv: &FlightVariables,
    cost: &CostParams,
    constraints: &mut Vec<Constraint>,
    slacks: &mut Vec<SlackEntry>,
) {
    let time_var = match app.side {
        CurfewSide::Departure => fv.dep_mod[&app.flight_id],
        CurfewSide::Arrival => fv.arr_mod[&app.flight_id],
    };
    let cancel_var = fv.cancel[&app.flight_id];
    let big_m = cost.big_m;

    let side = vars.add(variable().binary());

    let mut release = cancel_var * big_m;
    if !priority.is_hard() {
        let viol = vars.add(variable().binary());
        release += viol * big_m;
        slacks.push(SlackEntry {
            name: format!("curfew_soft_violation_{}_{}_{}", app.flight_id, airport, side_label(app.side)),
            variable: viol,
            priority,
        });
    }

    constraints.push(constraint!(time_var <= end_min as f64 + side * big_m + release.clone()));
    constraints.push(constraint!(time_var >= start_min as f64 - (1.0 - side) * big_m - release));
}

fn side_label(side: CurfewSide) -> &'static str {
    match side {
        CurfewSide::Departure => "dep",
        CurfewSide::Arrival => "arr",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostParams;

    fn empty_compiled() -> CompiledConstraints {
        CompiledConstraints {
            constraints: vec![],
            report: Default::default(),
        }
    }

    #[test]
    fn empty_flight_table_yields_trivial_model() {
        let model = build_model(&[], &empty_compiled(), &WeightVector::default(), &CostParams::default());
        assert!(model.flight_vars.cancel.is_empty());
        assert!(model.constraints.is_empty());
        assert!(model.slacks.is_empty());
    }
}

//! C2 — Constraint Compiler.
//!
//! Translates the three raw constraint families into a uniform stream of
//! compiled constraints the model builder (C3) can fold into a `good_lp`
//! problem: each variant knows how to emit its own variables and linear
//! inequalities, so adding a fourth family later is a matter of adding a
//! variant and its compile function (spec.md §9, "Constraint polymorphism").

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::flight::{Flight, FlightId};
use crate::time::parse_hh_mm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Must,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn is_hard(self) -> bool {
        matches!(self, Priority::Must)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurfewRule {
    #[serde(rename = "AIRPORT_CODE")]
    pub airport_code: String,
    #[serde(rename = "RESTRICTION_TYPE")]
    pub restriction_type: String,
    #[serde(rename = "START_TIME_OF_DAY")]
    pub start_time_of_day: String,
    #[serde(rename = "END_TIME_OF_DAY")]
    pub end_time_of_day: String,
    #[serde(rename = "PRIORITY")]
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapacityLimit {
    Bare(i64),
    Detailed { limit: i64, priority: Priority },
}

impl CapacityLimit {
    fn parts(&self) -> (i64, Priority) {
        match self {
            CapacityLimit::Bare(limit) => (*limit, Priority::High),
            CapacityLimit::Detailed { limit, priority } => (*limit, *priority),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaLimit {
    pub max: i64,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuotaRules {
    pub cancel: Option<QuotaLimit>,
    pub swap: Option<QuotaLimit>,
}

/// Wire shape matching spec.md §6's constraint bundle.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConstraintBundle {
    #[serde(default)]
    pub airport_restriction: Vec<CurfewRule>,
    #[serde(default)]
    pub airport_capacity: HashMap<String, HashMap<String, CapacityLimit>>,
    #[serde(default)]
    pub quota: QuotaRules,
}

/// Which decision variable a curfew rule constrains for a given flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurfewSide {
    Departure,
    Arrival,
}

/// A single flight's exposure to a compiled curfew rule.
#[derive(Debug, Clone)]
pub struct CurfewApplication {
    pub flight_id: FlightId,
    pub side: CurfewSide,
}

/// A fully-parsed, still solver-agnostic constraint, ready for the model
/// builder to realize as `good_lp` variables and inequalities.
#[derive(Debug, Clone)]
pub enum CompiledConstraint {
    Curfew {
        airport: Arc<str>,
        start_min: i64,
        end_min: i64,
        priority: Priority,
        applications: Vec<CurfewApplication>,
    },
    HourlyCapacity {
        airport: Arc<str>,
        window: String,
        limit: i64,
        priority: Priority,
        flights_in_window: Vec<FlightId>,
    },
    CancelQuota { limit: i64, priority: Priority },
    SwapQuota { limit: i64, priority: Priority },
}

/// Malformed-rule counters, by family (spec.md §7: `MalformedConstraint`
/// skips the single rule and is counted, never raised).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub malformed_curfew_rules: usize,
    pub malformed_capacity_windows: usize,
}

pub struct CompiledConstraints {
    pub constraints: Vec<CompiledConstraint>,
    pub report: CompileReport,
}

/// C2 entry point.
pub fn compile_constraints(flights: &[Flight], bundle: &ConstraintBundle) -> CompiledConstraints {
    let mut constraints = Vec::new();
    let mut report = CompileReport::default();

    for rule in &bundle.airport_restriction {
        if rule.restriction_type != "AIRPORT_CURFEW" {
            continue;
        }
        let Some(start_min) = parse_hh_mm(&rule.start_time_of_day) else {
            report.malformed_curfew_rules += 1;
            warn!(rule = ?rule, "malformed curfew start time, skipping rule");
            continue;
        };
        let Some(end_min) = parse_hh_mm(&rule.end_time_of_day) else {
            report.malformed_curfew_rules += 1;
            warn!(rule = ?rule, "malformed curfew end time, skipping rule");
            continue;
        };
        // Only wrap-around (overnight) windows are enforced; same-day
        // windows are accepted input but intentionally ignored — see
        // spec.md §9, "Wrap-around-only curfew policy". Preserved as-is.
        if start_min <= end_min {
            continue;
        }

        let applications: Vec<CurfewApplication> = flights
            .iter()
            .filter_map(|f| {
                if f.departure_airport.as_ref() == rule.airport_code {
                    Some(CurfewApplication {
                        flight_id: f.id.clone(),
                        side: CurfewSide::Departure,
                    })
                } else if f.arrival_airport.as_ref() == rule.airport_code {
                    Some(CurfewApplication {
                        flight_id: f.id.clone(),
                        side: CurfewSide::Arrival,
                    })
                } else {
                    None
                }
            })
            .collect();

        if applications.is_empty() {
            continue;
        }

        constraints.push(CompiledConstraint::Curfew {
            airport: Arc::from(rule.airport_code.as_str()),
            start_min,
            end_min,
            priority: rule.priority,
            applications,
        });
    }

    for (airport, windows) in &bundle.airport_capacity {
        for (window_key, details) in windows {
            let (limit, priority) = details.parts();
            let Some((start_min, end_min)) = parse_capacity_window(window_key) else {
                report.malformed_capacity_windows += 1;
                warn!(airport, window = window_key.as_str(), "malformed capacity window, skipping rule");
                continue;
            };

            // Window membership uses the *target* (pre-decision) time —
            // data, not a decision — so delay can never move a flight out
            // of a congested window (spec.md §9).
            let flights_in_window: Vec<FlightId> = flights
                .iter()
                .filter(|f| {
                    f.departure_airport.as_ref() == airport
                        && f.target_dep_min_of_day >= start_min
                        && f.target_dep_min_of_day < end_min
                })
                .map(|f| f.id.clone())
                .collect();

            if flights_in_window.is_empty() {
                continue;
            }

            constraints.push(CompiledConstraint::HourlyCapacity {
                airport: Arc::from(airport.as_str()),
                window: window_key.clone(),
                limit,
                priority,
                flights_in_window,
            });
        }
    }

    if let Some(cancel) = &bundle.quota.cancel {
        constraints.push(CompiledConstraint::CancelQuota {
            limit: cancel.max,
            priority: cancel.priority,
        });
    }
    if let Some(swap) = &bundle.quota.swap {
        constraints.push(CompiledConstraint::SwapQuota {
            limit: swap.max,
            priority: swap.priority,
        });
    }

    CompiledConstraints { constraints, report }
}

/// Parses `"HH:MM-HH:MM"` or `"HH:MM(+MM)"` into `(start_min, end_min)`.
/// `None` means the caller should count it as a malformed rule and skip.
fn parse_capacity_window(window_key: &str) -> Option<(i64, i64)> {
    if let Some(open) = window_key.find("(+") {
        let start_str = &window_key[..open];
        let duration_str = window_key[open + 2..].strip_suffix(')')?;
        let start = parse_hh_mm(start_str)?;
        let duration: i64 = duration_str.trim().parse().ok()?;
        if duration <= 0 {
            return None;
        }
        return Some((start, start + duration));
    }
    if let Some((start_str, end_str)) = window_key.split_once('-') {
        let start = parse_hh_mm(start_str)?;
        let end = parse_hh_mm(end_str)?;
        return Some((start, end));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_end_window() {
        assert_eq!(parse_capacity_window("08:00-09:00"), Some((480, 540)));
    }

    #[test]
    fn parses_duration_window() {
        assert_eq!(parse_capacity_window("08:00(+60)"), Some((480, 540)));
    }

    #[test]
    fn rejects_unknown_window_syntax() {
        assert_eq!(parse_capacity_window("8am till 9am"), None);
        assert_eq!(parse_capacity_window(""), None);
    }

    #[test]
    fn same_day_curfew_is_skipped_not_errored() {
        let flights = vec![];
        let bundle = ConstraintBundle {
            airport_restriction: vec![CurfewRule {
                airport_code: "PEK".into(),
                restriction_type: "AIRPORT_CURFEW".into(),
                start_time_of_day: "08:00".into(),
                end_time_of_day: "10:00".into(),
                priority: Priority::Must,
            }],
            ..Default::default()
        };
        let compiled = compile_constraints(&flights, &bundle);
        assert!(compiled.constraints.is_empty());
        assert_eq!(compiled.report.malformed_curfew_rules, 0);
    }

    #[test]
    fn malformed_curfew_time_is_counted_and_skipped() {
        let flights = vec![];
        let bundle = ConstraintBundle {
            airport_restriction: vec![CurfewRule {
                airport_code: "PEK".into(),
                restriction_type: "AIRPORT_CURFEW".into(),
                start_time_of_day: "not-a-time".into(),
                end_time_of_day: "05:00".into(),
                priority: Priority::Must,
            }],
            ..Default::default()
        };
        let compiled = compile_constraints(&flights, &bundle);
        assert!(compiled.constraints.is_empty());
        assert_eq!(compiled.report.malformed_curfew_rules, 1);
    }
}

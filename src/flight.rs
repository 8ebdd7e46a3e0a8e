//! C1 — Flight Normalizer.
//!
//! Produces the canonical flight table the rest of the engine consumes.
//! Alias mapping between the bilingual operator column names and the
//! canonical schema happens exactly once, in [`RawFlightRecord`]; nothing
//! downstream ever looks a field up by name again (spec.md §9, "Dynamic
//! field access vs. explicit schema").

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tracing::{info, warn};

use crate::error::EngineError;

pub type FlightId = Arc<str>;

const DEFAULT_DURATION_MINUTES: i64 = 120;
const DEFAULT_REVENUE_NO_PASSENGER_DATA: f64 = 75_000.0;
const DEFAULT_REVENUE_UNRESOLVABLE: f64 = 30_000.0;
const AVG_TICKET_PRICE: f64 = 500.0;

/// Wire shape accepted from upstream loaders: either canonical field names
/// or the operator's original bilingual column names. Every alias is
/// resolved here, once.
#[derive(Debug, Deserialize)]
struct RawFlightRecord {
    flight_id: Option<String>,

    #[serde(alias = "航班号")]
    flight_number: Option<String>,

    #[serde(alias = "计划起飞机场")]
    departure_airport: Option<String>,

    #[serde(alias = "计划落地机场")]
    arrival_airport: Option<String>,

    #[serde(alias = "计划起飞时间")]
    scheduled_departure: Option<NaiveDateTime>,

    #[serde(alias = "预计起飞时间")]
    expected_departure: Option<NaiveDateTime>,

    #[serde(alias = "预计落地时间")]
    expected_arrival: Option<NaiveDateTime>,

    ctot: Option<NaiveDateTime>,

    #[serde(alias = "计划飞行时长(分钟)")]
    flight_duration_minutes: Option<f64>,

    revenue: Option<f64>,

    #[serde(alias = "旅客人数(订座)")]
    passenger_count: Option<f64>,
}

/// The canonical flight record every other component consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Flight {
    pub id: FlightId,
    pub flight_number: String,
    pub carrier_code: String,
    pub departure_airport: Arc<str>,
    pub arrival_airport: Arc<str>,
    #[tabled(display = "display_naive")]
    pub scheduled_departure: NaiveDateTime,
    #[tabled(display = "display_naive")]
    pub target_departure: NaiveDateTime,
    pub flight_duration_minutes: i64,
    pub revenue: f64,
    pub target_dep_min_of_day: i64,
    pub base_delay_minutes: i64,
}

fn display_naive(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

fn truncate_to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Row-level counters from a normalization pass (spec.md §7: dropped rows
/// and reassigned ids are logged, not raised as errors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub rows_in: usize,
    pub rows_dropped_missing_departure: usize,
    pub duplicate_ids_reassigned: usize,
}

#[derive(Debug, Clone)]
pub struct NormalizedFlights {
    pub flights: Vec<Flight>,
    pub report: NormalizationReport,
}

fn carrier_code_of(flight_number: &str) -> String {
    static CARRIER_RE_SRC: &str = r"^[A-Za-z]{1,3}";
    let re = Regex::new(CARRIER_RE_SRC).expect("static carrier regex is valid");
    re.find(flight_number)
        .map(|m| m.as_str().to_uppercase())
        .unwrap_or_else(|| "CA".to_string())
}

/// C1 entry point: `normalize_flights(raw_table) -> canonical_table`.
///
/// Required columns (after alias mapping): `flight_number`,
/// `departure_airport`, `arrival_airport`. Their total absence across every
/// row is an `InputShapeError`; a missing *departure time* on an individual
/// row drops just that row (spec.md §4.1, §7).
pub fn normalize_flights(raw: Vec<serde_json::Value>) -> Result<NormalizedFlights, EngineError> {
    let rows_in = raw.len();
    let mut records = Vec::with_capacity(rows_in);
    for value in raw {
        let record: RawFlightRecord = serde_json::from_value(value).map_err(|_| {
            EngineError::InputShapeError(vec!["flight_number", "departure_airport", "arrival_airport"])
        })?;
        records.push(record);
    }

    if !records.is_empty()
        && records
            .iter()
            .all(|r| r.flight_number.is_none() || r.departure_airport.is_none() || r.arrival_airport.is_none())
    {
        return Err(EngineError::InputShapeError(vec![
            "flight_number",
            "departure_airport",
            "arrival_airport",
        ]));
    }

    // First pass: resolve target departure / duration per row, collecting
    // durations so a missing one can fall back to the input's own mean.
    let mut durations: Vec<i64> = Vec::new();
    let mut staged: Vec<(RawFlightRecord, Option<NaiveDateTime>, Option<i64>)> = Vec::new();
    for record in records {
        let target_departure = record
            .ctot
            .or(record.expected_departure)
            .or(record.scheduled_departure)
            .map(truncate_to_seconds);

        let duration = match (record.flight_duration_minutes, record.expected_arrival, record.expected_departure) {
            (Some(d), _, _) if d > 0.0 => Some(d.round() as i64),
            (_, Some(arr), Some(dep)) => {
                let mins = (arr - dep).num_minutes();
                if mins > 0 { Some(mins) } else { None }
            }
            _ => None,
        };
        if let Some(d) = duration {
            durations.push(d);
        }
        staged.push((record, target_departure, duration));
    }

    let mean_duration = if durations.is_empty() {
        DEFAULT_DURATION_MINUTES
    } else {
        durations.iter().sum::<i64>() / durations.len() as i64
    };

    let mut flights = Vec::with_capacity(staged.len());
    let mut dropped = 0usize;
    let mut seen_ids: HashMap<String, ()> = HashMap::new();
    let mut duplicate_count = 0usize;

    for (record, target_departure, duration) in staged {
        let Some(target_departure) = target_departure else {
            dropped += 1;
            continue;
        };
        let scheduled_departure = record.scheduled_departure.map(truncate_to_seconds).unwrap_or(target_departure);

        let flight_duration_minutes = duration.unwrap_or(mean_duration).max(1);

        let revenue = match record.passenger_count {
            Some(count) if count > 0.0 => count * AVG_TICKET_PRICE,
            Some(_) => DEFAULT_REVENUE_UNRESOLVABLE,
            None => record.revenue.unwrap_or(DEFAULT_REVENUE_NO_PASSENGER_DATA),
        };

        let flight_number = record.flight_number.unwrap_or_default();
        let carrier_code = carrier_code_of(&flight_number);
        let base_delay_minutes = (target_departure - scheduled_departure).num_minutes();
        let target_dep_min_of_day =
            target_departure.time().hour() as i64 * 60 + target_departure.time().minute() as i64;

        let raw_id = record.flight_id.clone().unwrap_or_else(|| flight_number.clone());
        if seen_ids.insert(raw_id.clone(), ()).is_some() {
            duplicate_count += 1;
        }

        flights.push(Flight {
            id: Arc::from(raw_id.as_str()),
            flight_number,
            carrier_code,
            departure_airport: Arc::from(record.departure_airport.unwrap_or_default().as_str()),
            arrival_airport: Arc::from(record.arrival_airport.unwrap_or_default().as_str()),
            scheduled_departure,
            target_departure,
            flight_duration_minutes,
            revenue,
            target_dep_min_of_day,
            base_delay_minutes,
        });
    }

    // Deterministic reassignment, in input order, whenever any id collided.
    let ids_reassigned = if duplicate_count > 0 {
        for (i, flight) in flights.iter_mut().enumerate() {
            flight.id = Arc::from(format!("F{}", i + 1));
        }
        flights.len()
    } else {
        0
    };

    let report = NormalizationReport {
        rows_in,
        rows_dropped_missing_departure: dropped,
        duplicate_ids_reassigned: ids_reassigned,
    };

    if report.rows_dropped_missing_departure > 0 {
        warn!(
            dropped = report.rows_dropped_missing_departure,
            "rows dropped: no CTOT, expected, or scheduled departure"
        );
    }
    if report.duplicate_ids_reassigned > 0 {
        warn!(
            reassigned = report.duplicate_ids_reassigned,
            "duplicate flight_id values found; ids reassigned sequentially"
        );
    }
    info!(rows_in, rows_out = flights.len(), "normalized flight table");

    Ok(NormalizedFlights { flights, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, dep: &str) -> serde_json::Value {
        json!({
            "flight_id": id,
            "flight_number": id,
            "departure_airport": "PEK",
            "arrival_airport": "SHA",
            "scheduled_departure": dep,
        })
    }

    #[test]
    fn derives_target_departure_from_stot_when_no_ctot() {
        let result = normalize_flights(vec![row("CA101", "2025-08-16T08:10:00")]).unwrap();
        assert_eq!(result.flights.len(), 1);
        assert_eq!(result.flights[0].target_dep_min_of_day, 8 * 60 + 10);
        assert_eq!(result.flights[0].base_delay_minutes, 0);
    }

    #[test]
    fn drops_rows_with_no_departure_time_at_all() {
        let mut no_time = row("CA102", "2025-08-16T09:00:00");
        no_time.as_object_mut().unwrap().remove("scheduled_departure");
        let result = normalize_flights(vec![row("CA101", "2025-08-16T08:10:00"), no_time]).unwrap();
        assert_eq!(result.flights.len(), 1);
        assert_eq!(result.report.rows_dropped_missing_departure, 1);
    }

    #[test]
    fn reassigns_duplicate_flight_ids_deterministically() {
        let result =
            normalize_flights(vec![row("DUP", "2025-08-16T08:00:00"), row("DUP", "2025-08-16T09:00:00")]).unwrap();
        assert_eq!(result.flights[0].id.as_ref(), "F1");
        assert_eq!(result.flights[1].id.as_ref(), "F2");
        assert_eq!(result.report.duplicate_ids_reassigned, 2);
    }

    #[test]
    fn falls_back_to_mean_duration_then_default() {
        let mut a = row("CA101", "2025-08-16T08:00:00");
        a["expected_departure"] = json!("2025-08-16T08:00:00");
        a["expected_arrival"] = json!("2025-08-16T10:00:00");
        let b = row("CA102", "2025-08-16T09:00:00");
        let result = normalize_flights(vec![a, b]).unwrap();
        assert_eq!(result.flights[0].flight_duration_minutes, 120);
        assert_eq!(result.flights[1].flight_duration_minutes, 120);
    }

    #[test]
    fn idempotent_on_canonical_input() {
        let first = normalize_flights(vec![row("CA101", "2025-08-16T08:10:00")]).unwrap();
        let as_value = serde_json::to_value(&first.flights[0]).unwrap();
        let second = normalize_flights(vec![as_value]).unwrap();
        assert_eq!(first.flights[0].id, second.flights[0].id);
        assert_eq!(first.flights[0].target_dep_min_of_day, second.flights[0].target_dep_min_of_day);
    }
}

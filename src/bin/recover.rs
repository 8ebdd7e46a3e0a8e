use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use tabled::settings::Style;
use tabled::Table;

use recovery_engine::config::{CostParams, SolveLimits, WeightVector};
use recovery_engine::constraints::{compile_constraints, ConstraintBundle};
use recovery_engine::error::EngineError;
use recovery_engine::flight::normalize_flights;
use recovery_engine::result::Action;
use recovery_engine::{batch_solve, BatchOutcome};

#[derive(Parser)]
struct Args {
    /// Path to the JSON scenario file
    #[arg(short, long, value_name = "FILE", default_value = "demos/default.json")]
    scenario: PathBuf,

    /// Solver backend to use
    #[arg(long, default_value = "cbc")]
    solver: String,
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    flights: Vec<serde_json::Value>,
    #[serde(default)]
    constraints: ConstraintBundle,
    #[serde(default = "default_weight_vectors")]
    weight_vectors: Vec<WeightVector>,
    #[serde(default)]
    cost: Option<CostParams>,
    #[serde(default)]
    limits: Option<SolveLimits>,
}

fn default_weight_vectors() -> Vec<WeightVector> {
    vec![WeightVector::default()]
}

fn colored_action(action: Action) -> colored::ColoredString {
    match action {
        Action::Keep => "KEEP".green(),
        Action::Delay => "DELAY".yellow(),
        Action::Swap => "SWAP".cyan(),
        Action::Cancel => "CANCEL".red(),
    }
}

fn print_batch(outcome: &BatchOutcome) {
    for (i, run) in outcome.runs.iter().enumerate() {
        println!(
            "\n=== run {i}: weights cancel={:.2} delay={:.2} swap={:.2} ===",
            run.weights.cancel, run.weights.delay, run.weights.swap
        );
        println!(
            "status: {:?}  objective: {}",
            run.result.status,
            run.result
                .objective_value
                .map(|v| format!("{v:.0}"))
                .unwrap_or_else(|| "n/a".to_string())
        );

        if run.result.rows.is_empty() {
            println!("(no recovery table — run did not reach a solution)");
            continue;
        }

        let mut table = Table::new(&run.result.rows);
        table.with(Style::rounded());
        println!("{table}");
        for row in &run.result.rows {
            if row.action != Action::Keep {
                println!("  {} {}", row.flight_number, colored_action(row.action));
            }
        }

        if !run.result.violations.is_empty() {
            println!("soft constraint slack:");
            for v in &run.result.violations {
                println!("  {} = {:.2}", v.name, v.amount);
            }
        }
    }
}

fn run(args: Args) -> Result<(), EngineError> {
    let contents = std::fs::read_to_string(&args.scenario).map_err(|source| EngineError::ScenarioIo {
        path: args.scenario.display().to_string(),
        source,
    })?;
    let scenario: ScenarioFile =
        serde_json::from_str(&contents).map_err(|source| EngineError::ScenarioParse {
            path: args.scenario.display().to_string(),
            source,
        })?;

    let normalized = normalize_flights(scenario.flights)?;
    println!(
        "normalized {} of {} input rows ({} dropped, {} ids reassigned)",
        normalized.flights.len(),
        normalized.report.rows_in,
        normalized.report.rows_dropped_missing_departure,
        normalized.report.duplicate_ids_reassigned
    );

    let compiled = compile_constraints(&normalized.flights, &scenario.constraints);
    if compiled.report.malformed_curfew_rules > 0 || compiled.report.malformed_capacity_windows > 0 {
        println!(
            "skipped {} malformed curfew rule(s), {} malformed capacity window(s)",
            compiled.report.malformed_curfew_rules, compiled.report.malformed_capacity_windows
        );
    }

    let cost = scenario.cost.unwrap_or_default();
    let limits = scenario.limits.unwrap_or_default();
    let outcome = batch_solve(
        &normalized.flights,
        &compiled,
        &scenario.weight_vectors,
        &cost,
        &limits,
        &args.solver,
    )?;

    print_batch(&outcome);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

//! Crate-level error type. Most of the error *kinds* named in the spec
//! (`MissingDepartureTime`, `DuplicateFlightId`, `MalformedConstraint`,
//! `SolverInfeasible`, ...) are row- or run-level conditions the engine
//! counts and logs rather than raising — see `NormalizationReport`,
//! `CompileReport` and `SolverOutcome`. `EngineError` is reserved for
//! conditions that make the whole call fail fast.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input is missing required column(s) after alias mapping: {0:?}")]
    InputShapeError(Vec<&'static str>),

    #[error("unknown solver backend {0:?}")]
    UnknownSolver(String),

    #[error("failed to read scenario file {path:?}: {source}")]
    ScenarioIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario file {path:?}: {source}")]
    ScenarioParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

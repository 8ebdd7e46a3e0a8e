//! Day-of-operations flight recovery optimizer.
//!
//! Six components in a straight pipeline, each a module here:
//!
//! 1. [`flight`] — normalizes raw flight rows into the canonical schema.
//! 2. [`constraints`] — compiles curfew/capacity/quota rules into a
//!    uniform, solver-agnostic stream.
//! 3. [`model`] — builds the `good_lp` decision variables, structural
//!    constraints and weighted objective.
//! 4. [`solver`] — drives a pluggable MILP backend (CBC by default).
//! 5. [`result`] — reads the solution back into a per-flight action table.
//! 6. [`batch`] — repeats 3–5 across a list of weight vectors.
//!
//! [`config`], [`error`] and [`time`] are shared infrastructure the other
//! five lean on.

pub mod batch;
pub mod config;
pub mod constraints;
pub mod error;
pub mod flight;
pub mod model;
pub mod result;
pub mod solver;
pub mod time;

pub use batch::{batch_solve, BatchOutcome, BatchRun};
pub use config::{CostParams, SolveLimits, WeightVector};
pub use constraints::{compile_constraints, ConstraintBundle};
pub use error::EngineError;
pub use flight::{normalize_flights, Flight, NormalizedFlights};
pub use result::{extract_results, ResultTable};

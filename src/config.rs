//! Cost parameters, solve limits and weight vectors — the tunable knobs the
//! rest of the engine treats as read-only snapshots for the duration of a
//! solve (spec.md §5).

use serde::{Deserialize, Serialize};

/// Multipliers applied to the three recovery-action cost terms. Soft
/// constraint penalties are deliberately *not* scaled by these — see
/// `CostParams` and spec.md §9 ("Penalty scale vs. weights").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub cancel: f64,
    pub delay: f64,
    pub swap: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        WeightVector {
            cancel: 1.0,
            delay: 0.3,
            swap: 0.3,
        }
    }
}

/// Absolute cost constants. Kept outside `WeightVector` so that a sweep
/// across weight vectors never changes the relative severity of `HIGH` /
/// `MEDIUM` / `LOW` soft constraints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    pub c_cancel: f64,
    pub c_swap: f64,
    pub c_delay_per_min: f64,
    pub penalty_high: f64,
    pub penalty_medium: f64,
    pub penalty_low: f64,
    /// Additional delay minutes a flight may absorb on top of its target
    /// departure before it can only be recovered by cancellation.
    pub max_delay_minutes: i64,
    /// Big-M constant for the curfew disjunctions. Must dominate every
    /// plausible time-variable gap without swamping the solver's numerics.
    pub big_m: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        CostParams {
            c_cancel: 30_000.0,
            c_swap: 15_000.0,
            c_delay_per_min: 80.0,
            penalty_high: 1_000_000.0,
            penalty_medium: 100_000.0,
            penalty_low: 10_000.0,
            max_delay_minutes: 240,
            big_m: 10_000.0,
        }
    }
}

/// Per-solve wall-clock and optimality-gap limits, passed through to the
/// solver driver (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveLimits {
    pub time_limit_s: u32,
    pub mip_gap: f64,
}

impl Default for SolveLimits {
    fn default() -> Self {
        SolveLimits {
            time_limit_s: 60,
            mip_gap: 1e-4,
        }
    }
}

//! Numerical constants and configuration defaults
//!
//! Defaults follow the TrackMate LAP tracker settings where one exists.
//! They are separate from [`TrackerConfig`](crate::TrackerConfig), which is
//! what callers actually tune.

/// Added to every finite frame-linking cost so that a zero-distance link
/// is never a zero cost for the solver.
pub const LINKING_COST_EPSILON: f64 = 1e-6;

/// Added to every finite gap-closing, merging and splitting cost. A spot
/// reappearing at the same position must still beat the alternative cost.
pub const SEGMENT_COST_EPSILON: f64 = 1e-6;

/// Weight applied to the normalized feature difference in the penalty term.
///
/// With a weight of 1, two spots whose feature differs by a factor of two
/// look as if they were twice as far apart.
pub const FEATURE_PENALTY_SCALE: f64 = 1.5;

/// Morphology heuristic step, applied once per criterion.
pub const MORPHOLOGY_STEP: f64 = 0.05;

/// Relative tolerance for the diameter and intensity agreement criteria.
pub const MORPHOLOGY_RATIO_TOLERANCE: f64 = 0.10;

/// Number of criteria scored by the morphology heuristic.
pub const MORPHOLOGY_CRITERIA: usize = 3;

/// Scale applied to the blocking value when a top-left block has no finite
/// cost at all, giving a finite alternative cost.
pub const NO_CANDIDATE_ALTERNATIVE_SCALE: f64 = 1e-3;

pub const DEFAULT_LINKING_MAX_DISTANCE: f64 = 15.0;
pub const DEFAULT_GAP_CLOSING_MAX_DISTANCE: f64 = 15.0;
pub const DEFAULT_GAP_CLOSING_MAX_FRAME_GAP: usize = 2;
pub const DEFAULT_MERGING_MAX_DISTANCE: f64 = 15.0;
pub const DEFAULT_SPLITTING_MAX_DISTANCE: f64 = 15.0;
pub const DEFAULT_ALLOW_GAP_CLOSING: bool = true;
pub const DEFAULT_ALLOW_MERGING: bool = false;
pub const DEFAULT_ALLOW_SPLITTING: bool = false;

/// Jaqaman intensity-ratio cutoffs for merge and split events.
pub const DEFAULT_INTENSITY_RATIO_BOUNDS: (f64, f64) = (0.5, 4.0);

/// Multiplier applied to the percentile cutoff to get alternative costs.
pub const DEFAULT_ALTERNATIVE_COST_FACTOR: f64 = 1.05;

/// Percentile of finite costs used as the alternative-cost cutoff.
pub const DEFAULT_CUTOFF_PERCENTILE: f64 = 0.9;

/// Finite stand-in for a forbidden pairing.
pub const DEFAULT_BLOCKING_VALUE: f64 = 1e300;

/// Largest square matrix (in elements) the tracker will allocate.
pub const DEFAULT_MAX_MATRIX_ELEMENTS: usize = 1 << 28;

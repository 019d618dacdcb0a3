//! Error types for the tracker
//!
//! Every failure in this crate is structural (bad configuration, bad input,
//! or a broken internal invariant), so nothing is retried: errors abort the
//! whole run and carry enough context to locate the offending field, spot,
//! or matrix.

use thiserror::Error;

use crate::types::Feature;

/// Top-level tracker error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Malformed configuration, detected before any matrix is built
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Malformed input spots
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// The solver selected a blocked pairing on a matrix that always has a
    /// finite perfect matching
    #[error("Solver found no feasible assignment for {stage} matrix ({rows}x{cols})")]
    SolverInfeasible {
        /// Which matrix failed
        stage: MatrixStage,
        rows: usize,
        cols: usize,
    },

    /// Matrix too large to allocate
    #[error("Cost matrix for {stage} is too large ({rows}x{cols}, limit {limit} elements)")]
    ResourceExhaustion {
        /// Which matrix failed
        stage: MatrixStage,
        rows: usize,
        cols: usize,
        /// Configured element limit
        limit: usize,
    },

    /// The run-scoped worker pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ConfigError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Invalid input spot data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Two compared spots have different dimensionality
    #[error("Dimension mismatch between spots {first} and {second}: expected {expected}, got {actual}")]
    DimensionMismatch {
        first: u64,
        second: u64,
        expected: usize,
        actual: usize,
    },

    /// A cost function needs a feature the spot does not carry
    #[error("Spot {spot} is missing required feature {feature}")]
    MissingFeature { spot: u64, feature: Feature },

    /// Frame indices are not strictly increasing
    #[error("Frame indices must be strictly increasing: {current} follows {previous}")]
    NonMonotonicFrames { previous: usize, current: usize },

    /// A spot was listed under a frame other than its own
    #[error("Spot {spot} has frame {actual} but was listed under frame {expected}")]
    FrameMismatch {
        spot: u64,
        expected: usize,
        actual: usize,
    },

    /// A spot does not share the dimensionality of the run
    #[error("Spot {spot} has {actual} dimensions, run uses {expected}")]
    InconsistentDimensionality {
        spot: u64,
        expected: usize,
        actual: usize,
    },

    /// A spot has a NaN or infinite coordinate
    #[error("Spot {spot} has a non-finite coordinate")]
    NonFiniteCoordinate { spot: u64 },
}

/// Identifies one of the matrices built during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixStage {
    /// Frame-to-frame linking between two consecutive frames
    FrameLinking { from: usize, to: usize },
    /// Segment-level gap closing / merging / splitting
    SegmentLinking,
}

impl std::fmt::Display for MatrixStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixStage::FrameLinking { from, to } => {
                write!(f, "frame linking {} -> {}", from, to)
            }
            MatrixStage::SegmentLinking => write!(f, "segment linking"),
        }
    }
}

/// Errors reported by an assignment solver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The solver only accepts square matrices
    #[error("Cost matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// NaN or infinite entry
    #[error("Cost matrix entry ({row}, {col}) is not finite")]
    NonFinite { row: usize, col: usize },

    /// No augmenting path left for a row
    #[error("No augmenting path for row {row}")]
    NoAugmentingPath { row: usize },
}

/// Result alias used throughout the tracker
pub type Result<T> = std::result::Result<T, TrackerError>;

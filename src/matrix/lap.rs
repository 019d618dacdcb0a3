//! Square LAP matrix completion
//!
//! A rectangular top-left block of real costs is embedded in a square
//! matrix whose extra quadrants let every row and column stay unassigned
//! at the alternative cost:
//!
//! ```text
//!            C cols               R cols
//!        +----------------+------------------+
//!  R rows|  top-left      |  diag = alt      |
//!        +----------------+------------------+
//!  C rows|  diag = alt    |  top-leftᵀ, finite entries = alt
//!        +----------------+------------------+
//! ```
//!
//! Off-diagonal entries of the two diagonal quadrants are blocked. The
//! diagonals alone form a finite perfect matching, so the completed matrix
//! is always solvable. The bottom-right quadrant lets a "no link" row pair
//! with a "no link" column for every real pairing not taken.

use super::cost_matrix::CostMatrix;
use super::pool::WorkerPool;
use crate::tracker::errors::{MatrixStage, TrackerError};

/// Completed square matrix plus the layout it was built from.
#[derive(Debug, Clone)]
pub struct LapMatrix {
    matrix: CostMatrix,
    rows: usize,
    cols: usize,
    alternative_cost: f64,
}

impl LapMatrix {
    /// Complete `top_left` with alternative quadrants.
    ///
    /// Rejects the matrix up front if its side squared exceeds
    /// `max_elements`.
    pub fn complete(
        top_left: &CostMatrix,
        alternative_cost: f64,
        stage: MatrixStage,
        max_elements: usize,
        pool: &WorkerPool,
    ) -> Result<Self, TrackerError> {
        let rows = top_left.nrows();
        let cols = top_left.ncols();
        let side = check_square_size(stage, rows, cols, max_elements)?;
        let blocked = top_left.blocking_value();

        let costs = pool.fill_columns(side, side, stage, |c, out| {
            if c < cols {
                for (r, cell) in out[..rows].iter_mut().enumerate() {
                    *cell = top_left.get(r, c);
                }
                for (k, cell) in out[rows..].iter_mut().enumerate() {
                    *cell = if k == c { alternative_cost } else { blocked };
                }
            } else {
                let j = c - cols;
                for (r, cell) in out[..rows].iter_mut().enumerate() {
                    *cell = if r == j { alternative_cost } else { blocked };
                }
                for (k, cell) in out[rows..].iter_mut().enumerate() {
                    *cell = if top_left.is_blocked(j, k) {
                        blocked
                    } else {
                        alternative_cost
                    };
                }
            }
            Ok(())
        })?;

        Ok(Self {
            matrix: CostMatrix::new(costs, blocked),
            rows,
            cols,
            alternative_cost,
        })
    }

    /// The square matrix handed to the solver
    pub fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Shape of the real-cost block
    #[inline]
    pub fn top_left_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.rows + self.cols
    }

    #[inline]
    pub fn alternative_cost(&self) -> f64 {
        self.alternative_cost
    }

    /// Whether `(row, col)` of the square matrix is a real pairing.
    #[inline]
    pub fn is_top_left(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }
}

/// Side of the square matrix for a `rows × cols` block, or
/// [`TrackerError::ResourceExhaustion`] if it would exceed `max_elements`.
pub fn check_square_size(
    stage: MatrixStage,
    rows: usize,
    cols: usize,
    max_elements: usize,
) -> Result<usize, TrackerError> {
    let side = rows.saturating_add(cols);
    match side.checked_mul(side) {
        Some(elements) if elements <= max_elements => Ok(side),
        _ => Err(TrackerError::ResourceExhaustion {
            stage,
            rows: side,
            cols: side,
            limit: max_elements,
        }),
    }
}

/// Reject a rectangular `rows × cols` block larger than `max_elements`.
pub fn check_block_size(
    stage: MatrixStage,
    rows: usize,
    cols: usize,
    max_elements: usize,
) -> Result<(), TrackerError> {
    match rows.checked_mul(cols) {
        Some(elements) if elements <= max_elements => Ok(()),
        _ => Err(TrackerError::ResourceExhaustion {
            stage,
            rows,
            cols,
            limit: max_elements,
        }),
    }
}

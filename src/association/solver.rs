//! Assignment solver seam
//!
//! The tracker only needs a minimum-cost perfect matching on a square
//! matrix. Anything implementing [`AssignmentSolver`] can be plugged into
//! [`LapTracker`](crate::LapTracker); [`HungarianSolver`](super::HungarianSolver)
//! is the default.

use crate::matrix::CostMatrix;
use crate::tracker::errors::SolverError;

/// One-to-one assignment of rows to columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// `row_to_col[r]` is the column assigned to row `r`
    row_to_col: Vec<usize>,
    /// Sum of the selected costs
    cost: f64,
}

impl Assignment {
    pub fn new(row_to_col: Vec<usize>, cost: f64) -> Self {
        Self { row_to_col, cost }
    }

    /// Column assigned to `row`
    #[inline]
    pub fn col_for_row(&self, row: usize) -> Option<usize> {
        self.row_to_col.get(row).copied()
    }

    /// `(row, col)` pairs in row order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_to_col.iter().copied().enumerate()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.row_to_col.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.row_to_col.is_empty()
    }

    /// Total cost of the assignment
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Whether every column in `0..len` is used exactly once.
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.row_to_col.len()];
        for &c in &self.row_to_col {
            if c >= seen.len() || seen[c] {
                return false;
            }
            seen[c] = true;
        }
        true
    }
}

/// Square-matrix minimum-cost perfect matching.
///
/// Implementations must be deterministic: the same matrix always yields
/// the same assignment.
pub trait AssignmentSolver: Send + Sync {
    /// Solve the assignment problem for a square `costs` matrix.
    fn solve(&self, costs: &CostMatrix) -> Result<Assignment, SolverError>;

    /// Get algorithm name
    fn name(&self) -> &'static str;
}

/// Shared input checks: square and every entry finite.
pub fn validate_square(costs: &CostMatrix) -> Result<(), SolverError> {
    if !costs.is_square() {
        return Err(SolverError::NotSquare {
            rows: costs.nrows(),
            cols: costs.ncols(),
        });
    }
    for row in 0..costs.nrows() {
        for col in 0..costs.ncols() {
            if !costs.get(row, col).is_finite() {
                return Err(SolverError::NonFinite { row, col });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn test_assignment_accessors() {
        let a = Assignment::new(vec![2, 0, 1], 6.0);
        assert_eq!(a.len(), 3);
        assert_eq!(a.col_for_row(0), Some(2));
        assert_eq!(a.col_for_row(3), None);
        assert!(a.is_permutation());
        assert_eq!(a.pairs().collect::<Vec<_>>(), vec![(0, 2), (1, 0), (2, 1)]);
        assert!(!Assignment::new(vec![0, 0], 0.0).is_permutation());
    }

    #[test]
    fn test_validate_square() {
        let rect = CostMatrix::new(DMatrix::zeros(2, 3), 1e300);
        assert_eq!(
            validate_square(&rect),
            Err(SolverError::NotSquare { rows: 2, cols: 3 })
        );

        let nan = CostMatrix::new(DMatrix::from_row_slice(2, 2, &[0.0, 1.0, f64::NAN, 0.0]), 1e300);
        assert_eq!(
            validate_square(&nan),
            Err(SolverError::NonFinite { row: 1, col: 0 })
        );
    }
}

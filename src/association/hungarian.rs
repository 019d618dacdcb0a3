//! Hungarian algorithm for optimal assignment
//!
//! Shortest augmenting path form of the Hungarian method with row and
//! column potentials. Rows are inserted one at a time; each insertion runs
//! a Dijkstra-like search over reduced costs and augments along the
//! cheapest path. O(n³) time, O(n) extra memory.
//!
//! Ties are broken towards the lowest column index, so the result is a
//! pure function of the matrix.

use nalgebra::DMatrix;

use super::solver::{validate_square, Assignment, AssignmentSolver};
use crate::matrix::CostMatrix;
use crate::tracker::errors::SolverError;

/// Default [`AssignmentSolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HungarianSolver;

impl HungarianSolver {
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentSolver for HungarianSolver {
    fn solve(&self, costs: &CostMatrix) -> Result<Assignment, SolverError> {
        validate_square(costs)?;
        hungarian(costs.costs())
    }

    fn name(&self) -> &'static str {
        "Hungarian"
    }
}

/// Minimum-cost perfect matching of a square matrix with finite entries.
///
/// # Arguments
/// * `costs` - Square cost matrix (N×N)
///
/// # Returns
/// Assignment mapping each row to a distinct column
pub fn hungarian(costs: &DMatrix<f64>) -> Result<Assignment, SolverError> {
    let n = costs.nrows();
    if n != costs.ncols() {
        return Err(SolverError::NotSquare {
            rows: n,
            cols: costs.ncols(),
        });
    }
    if n == 0 {
        return Ok(Assignment::new(Vec::new(), 0.0));
    }

    // 1-based with a virtual column 0 holding the row being inserted
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut col_owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        col_owner[0] = row;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = col_owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = costs[(i0 - 1, j - 1)] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            if j1 == 0 {
                return Err(SolverError::NoAugmentingPath { row: row - 1 });
            }

            for j in 0..=n {
                if used[j] {
                    u[col_owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if col_owner[j0] == 0 {
                break;
            }
        }

        // Augment along the alternating path back to the virtual column
        loop {
            let j1 = way[j0];
            col_owner[j0] = col_owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0usize; n];
    for j in 1..=n {
        row_to_col[col_owner[j] - 1] = j - 1;
    }
    let cost = row_to_col
        .iter()
        .enumerate()
        .map(|(r, &c)| costs[(r, c)])
        .sum();

    Ok(Assignment::new(row_to_col, cost))
}

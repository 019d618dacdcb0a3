//! Dense cost matrix with a blocking sentinel

use nalgebra::DMatrix;

use crate::common::constants::NO_CANDIDATE_ALTERNATIVE_SCALE;
use crate::common::utils::percentile;

/// Row-source by column-target cost table.
///
/// Forbidden pairings hold `blocking_value`, a large finite number, so the
/// solver's arithmetic never meets an infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    costs: DMatrix<f64>,
    blocking_value: f64,
}

impl CostMatrix {
    /// Wrap an existing table.
    pub fn new(costs: DMatrix<f64>, blocking_value: f64) -> Self {
        Self {
            costs,
            blocking_value,
        }
    }

    /// Matrix with every entry blocked.
    pub fn blocked(rows: usize, cols: usize, blocking_value: f64) -> Self {
        Self::new(DMatrix::from_element(rows, cols, blocking_value), blocking_value)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.costs.nrows()
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.costs.ncols()
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows() == 0 || self.ncols() == 0
    }

    #[inline]
    pub fn blocking_value(&self) -> f64 {
        self.blocking_value
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.costs[(row, col)]
    }

    /// Whether a cost counts as blocked under `blocking_value`. NaN does.
    #[inline]
    pub fn is_blocked_value(cost: f64, blocking_value: f64) -> bool {
        !(cost < blocking_value)
    }

    #[inline]
    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        Self::is_blocked_value(self.get(row, col), self.blocking_value)
    }

    /// Underlying table
    pub fn costs(&self) -> &DMatrix<f64> {
        &self.costs
    }

    pub fn into_inner(self) -> DMatrix<f64> {
        self.costs
    }

    /// All non-blocked costs, in column-major order.
    pub fn finite_costs(&self) -> Vec<f64> {
        self.costs
            .iter()
            .copied()
            .filter(|&c| !Self::is_blocked_value(c, self.blocking_value))
            .collect()
    }

    /// Whether any entry is not blocked.
    pub fn has_finite(&self) -> bool {
        self.costs
            .iter()
            .any(|&c| !Self::is_blocked_value(c, self.blocking_value))
    }

    /// Whether a row has any non-blocked entry.
    pub fn row_has_finite(&self, row: usize) -> bool {
        self.costs
            .row(row)
            .iter()
            .any(|&c| !Self::is_blocked_value(c, self.blocking_value))
    }

    /// Whether a column has any non-blocked entry.
    pub fn col_has_finite(&self, col: usize) -> bool {
        self.costs
            .column(col)
            .iter()
            .any(|&c| !Self::is_blocked_value(c, self.blocking_value))
    }

    /// Number of non-blocked entries
    pub fn num_finite(&self) -> usize {
        self.costs
            .iter()
            .filter(|&&c| !Self::is_blocked_value(c, self.blocking_value))
            .count()
    }

    /// Cost of leaving a row or column unassigned.
    ///
    /// `factor · percentile(finite costs, cutoff)`. With no finite cost at
    /// all, the blocking value scaled down to a finite stand-in.
    pub fn alternative_cost(&self, factor: f64, cutoff: f64) -> f64 {
        match percentile(&self.finite_costs(), cutoff) {
            Some(p) => factor * p,
            None => self.blocking_value * NO_CANDIDATE_ALTERNATIVE_SCALE,
        }
    }
}

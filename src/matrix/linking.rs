//! Frame-to-frame linking matrix

use crate::costs::{CostFunction, EventSpots};
use crate::tracker::errors::{MatrixStage, TrackerError};
use crate::types::Spot;

use super::cost_matrix::CostMatrix;
use super::lap::check_square_size;
use super::pool::WorkerPool;

/// Builds the `m × n` linking block between two consecutive frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameLinkingBuilder<'a> {
    cost: CostFunction<'a>,
    blocking_value: f64,
    max_elements: usize,
}

impl<'a> FrameLinkingBuilder<'a> {
    pub fn new(cost: CostFunction<'a>, blocking_value: f64, max_elements: usize) -> Self {
        Self {
            cost,
            blocking_value,
            max_elements,
        }
    }

    /// Linking costs from every spot of `source` (frame `from`) to every spot
    /// of `target` (frame `to`).
    ///
    /// The size limit is checked against the square matrix the block will be
    /// completed into, before anything is allocated.
    pub fn build(
        &self,
        from: usize,
        to: usize,
        source: &[Spot],
        target: &[Spot],
        pool: &WorkerPool,
    ) -> Result<CostMatrix, TrackerError> {
        let stage = MatrixStage::FrameLinking { from, to };
        check_square_size(stage, source.len(), target.len(), self.max_elements)?;

        let costs = pool.fill_columns(source.len(), target.len(), stage, |j, out| {
            let b = &target[j];
            for (cell, a) in out.iter_mut().zip(source) {
                *cell = self
                    .cost
                    .evaluate(EventSpots::pair(a, b))?
                    .unwrap_or(self.blocking_value);
            }
            Ok(())
        })?;

        Ok(CostMatrix::new(costs, self.blocking_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::LINKING_COST_EPSILON;
    use crate::costs::FeaturePenalties;
    use crate::tracker::errors::InputError;

    const B: f64 = 1e300;

    fn spot(id: u64, frame: usize, x: f64, y: f64) -> Spot {
        Spot::from_coords(id, frame, &[x, y])
    }

    #[test]
    fn test_linking_block() {
        let none = FeaturePenalties::new();
        let builder = FrameLinkingBuilder::new(
            CostFunction::Linking {
                max_distance: 5.0,
                penalties: &none,
            },
            B,
            1 << 20,
        );
        let pool = WorkerPool::new(2).unwrap();
        let source = [spot(1, 0, 0.0, 0.0), spot(2, 0, 10.0, 10.0)];
        let target = [spot(3, 1, 1.0, 1.0), spot(4, 1, 11.0, 9.0)];

        let m = builder.build(0, 1, &source, &target, &pool).unwrap();
        assert_eq!(m.get(0, 0), 2.0 + LINKING_COST_EPSILON);
        assert_eq!(m.get(1, 1), 2.0 + LINKING_COST_EPSILON);
        assert_eq!(m.get(0, 1), B);
        assert_eq!(m.get(1, 0), B);
    }

    #[test]
    fn test_empty_frame() {
        let none = FeaturePenalties::new();
        let builder = FrameLinkingBuilder::new(
            CostFunction::Linking {
                max_distance: 5.0,
                penalties: &none,
            },
            B,
            1 << 20,
        );
        let pool = WorkerPool::new(1).unwrap();
        let m = builder.build(0, 1, &[spot(1, 0, 0.0, 0.0)], &[], &pool).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (1, 0));
        assert!(!m.has_finite());
    }

    #[test]
    fn test_dimension_mismatch_fails_the_pair() {
        let none = FeaturePenalties::new();
        let builder = FrameLinkingBuilder::new(
            CostFunction::Linking {
                max_distance: 5.0,
                penalties: &none,
            },
            B,
            1 << 20,
        );
        let pool = WorkerPool::new(1).unwrap();
        let err = builder
            .build(
                0,
                1,
                &[spot(1, 0, 0.0, 0.0)],
                &[Spot::from_coords(2, 1, &[0.0, 0.0, 0.0])],
                &pool,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Input(InputError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_size_limit_checked_before_fill() {
        let none = FeaturePenalties::new();
        let builder = FrameLinkingBuilder::new(
            CostFunction::Linking {
                max_distance: 5.0,
                penalties: &none,
            },
            B,
            8,
        );
        let pool = WorkerPool::new(1).unwrap();
        let source = [spot(1, 0, 0.0, 0.0), spot(2, 0, 1.0, 0.0)];
        let target = [spot(3, 1, 0.0, 0.0), spot(4, 1, 1.0, 0.0)];
        let err = builder.build(4, 5, &source, &target, &pool).unwrap_err();
        assert_eq!(
            err,
            TrackerError::ResourceExhaustion {
                stage: MatrixStage::FrameLinking { from: 4, to: 5 },
                rows: 4,
                cols: 4,
                limit: 8
            }
        );
    }
}

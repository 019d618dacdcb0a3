//! Run-scoped worker pool for matrix construction
//!
//! One [`WorkerPool`] is created per tracking run and reused by every
//! matrix fill and by the frame-pair fan-out. Each task owns a disjoint
//! set of columns of the buffer it fills; the join at the end of
//! [`rayon::ThreadPool::install`] is the only synchronization.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::tracker::errors::{InputError, MatrixStage, TrackerError};

/// Fixed-size thread pool owned by one tracking run.
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    num_workers: usize,
}

impl WorkerPool {
    /// Create a pool with `num_workers` threads.
    pub fn new(num_workers: usize) -> Result<Self, TrackerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("lap-tracker-{}", i))
            .build()
            .map_err(|e| TrackerError::WorkerPool(e.to_string()))?;
        Ok(Self { pool, num_workers })
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Run `op` inside the pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Fill a `rows × cols` matrix column by column in parallel.
    ///
    /// `fill(col, out)` writes the whole of column `col` into `out`. The
    /// buffer is column-major, so it becomes the matrix storage without a
    /// copy. It is allocated fallibly; an allocation failure is reported as
    /// [`TrackerError::ResourceExhaustion`] for `stage`.
    ///
    /// If several columns fail, the error of the lowest one is returned,
    /// whatever the number of workers.
    pub fn fill_columns<F>(
        &self,
        rows: usize,
        cols: usize,
        stage: MatrixStage,
        fill: F,
    ) -> Result<DMatrix<f64>, TrackerError>
    where
        F: Fn(usize, &mut [f64]) -> Result<(), InputError> + Sync,
    {
        if rows == 0 || cols == 0 {
            return Ok(DMatrix::zeros(rows, cols));
        }

        let mut buffer = allocate(rows, cols, stage)?;
        let failure = self.pool.install(|| {
            buffer
                .par_chunks_mut(rows)
                .enumerate()
                .filter_map(|(col, out)| fill(col, out).err().map(|e| (col, e)))
                .min_by_key(|(col, _)| *col)
        });
        if let Some((_, e)) = failure {
            return Err(e.into());
        }

        Ok(DMatrix::from_vec(rows, cols, buffer))
    }
}

/// Zeroed column-major buffer, reporting allocation failure instead of aborting.
pub(crate) fn allocate(rows: usize, cols: usize, stage: MatrixStage) -> Result<Vec<f64>, TrackerError> {
    let exhausted = || TrackerError::ResourceExhaustion {
        stage,
        rows,
        cols,
        limit: rows.saturating_mul(cols),
    };
    let len = rows.checked_mul(cols).ok_or_else(exhausted)?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| exhausted())?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_columns_layout() {
        let pool = WorkerPool::new(2).unwrap();
        let m = pool
            .fill_columns(3, 2, MatrixStage::SegmentLinking, |col, out| {
                for (row, cell) in out.iter_mut().enumerate() {
                    *cell = (row * 10 + col) as f64;
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m[(2, 1)], 21.0);
        assert_eq!(m[(1, 0)], 10.0);
        assert_eq!(m[(0, 1)], 1.0);
    }

    #[test]
    fn test_fill_columns_empty() {
        let pool = WorkerPool::new(1).unwrap();
        let m = pool
            .fill_columns(0, 4, MatrixStage::SegmentLinking, |_, _| Ok(()))
            .unwrap();
        assert_eq!(m.shape(), (0, 4));
    }

    #[test]
    fn test_fill_columns_propagates_input_error() {
        let pool = WorkerPool::new(2).unwrap();
        let err = pool
            .fill_columns(4, 4, MatrixStage::SegmentLinking, |col, _| {
                if col == 2 {
                    Err(InputError::NonFiniteCoordinate { spot: 9 })
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(
            err,
            TrackerError::Input(InputError::NonFiniteCoordinate { spot: 9 })
        );
    }

    #[test]
    fn test_lowest_failing_column_wins() {
        for workers in [1, 2, 4, 8] {
            let pool = WorkerPool::new(workers).unwrap();
            for _ in 0..20 {
                let err = pool
                    .fill_columns(3, 64, MatrixStage::SegmentLinking, |col, _| {
                        if col % 7 == 5 {
                            Err(InputError::NonFiniteCoordinate { spot: col as u64 })
                        } else {
                            Ok(())
                        }
                    })
                    .unwrap_err();
                assert_eq!(
                    err,
                    TrackerError::Input(InputError::NonFiniteCoordinate { spot: 5 })
                );
            }
        }
    }
}

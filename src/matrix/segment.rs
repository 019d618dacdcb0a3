//! Segment-level matrix: gap closing, merging and splitting in one problem
//!
//! With `S` segments, `Pm` merge candidates and `Ps` split candidates the
//! real-cost block is
//!
//! ```text
//!              S cols (segment starts)   Pm cols (middle points)
//!   S rows   [ gap closing             | merging               ]
//!   Ps rows  [ splitting               | blocked               ]
//! ```
//!
//! Rows are segment ends then mothers, columns are segment starts then
//! merge targets. Only middle points with at least one finite merge
//! (resp. split) cost become columns (resp. rows).

use crate::costs::{CostFunction, EventSpots};
use crate::tracker::errors::{MatrixStage, TrackerError};
use crate::types::{SpotCollection, TrackSegments};

use super::cost_matrix::CostMatrix;
use super::lap::{check_block_size, check_square_size};
use super::pool::WorkerPool;

const STAGE: MatrixStage = MatrixStage::SegmentLinking;

/// Event encoded by a top-left cell of a [`SegmentCostMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEvent {
    /// End of segment `from` to start of segment `to`
    GapClosing { from: usize, to: usize },
    /// End of `segment` into middle point `middle`
    Merging { segment: usize, middle: usize },
    /// Middle point `middle` to start of `segment`
    Splitting { middle: usize, segment: usize },
}

/// Accepted segment-level event and its cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLink {
    pub event: SegmentEvent,
    pub cost: f64,
}

/// Real-cost block of the segment-level problem.
#[derive(Debug, Clone)]
pub struct SegmentCostMatrix {
    /// `(S + Ps) × (S + Pm)` costs
    pub top_left: CostMatrix,
    /// Number of segments `S`
    pub num_segments: usize,
    /// Middle-point indices used as merge columns
    pub merge_candidates: Vec<usize>,
    /// Middle-point indices used as split rows
    pub split_candidates: Vec<usize>,
}

impl SegmentCostMatrix {
    /// Decode a top-left cell. `None` for the blocked split-to-merge block
    /// or out-of-range cells.
    pub fn event(&self, row: usize, col: usize) -> Option<SegmentEvent> {
        let s = self.num_segments;
        match (row < s, col < s) {
            (true, true) => Some(SegmentEvent::GapClosing { from: row, to: col }),
            (true, false) => self
                .merge_candidates
                .get(col - s)
                .map(|&middle| SegmentEvent::Merging {
                    segment: row,
                    middle,
                }),
            (false, true) => self
                .split_candidates
                .get(row - s)
                .map(|&middle| SegmentEvent::Splitting {
                    middle,
                    segment: col,
                }),
            (false, false) => None,
        }
    }
}

/// Builds the [`SegmentCostMatrix`]. A `None` cost function disables its
/// event type.
#[derive(Debug, Clone, Copy)]
pub struct SegmentLinkingBuilder<'a> {
    gap_closing: Option<CostFunction<'a>>,
    merging: Option<CostFunction<'a>>,
    splitting: Option<CostFunction<'a>>,
    blocking_value: f64,
    max_elements: usize,
}

impl<'a> SegmentLinkingBuilder<'a> {
    pub fn new(blocking_value: f64, max_elements: usize) -> Self {
        Self {
            gap_closing: None,
            merging: None,
            splitting: None,
            blocking_value,
            max_elements,
        }
    }

    pub fn gap_closing(mut self, cost: Option<CostFunction<'a>>) -> Self {
        self.gap_closing = cost;
        self
    }

    pub fn merging(mut self, cost: Option<CostFunction<'a>>) -> Self {
        self.merging = cost;
        self
    }

    pub fn splitting(mut self, cost: Option<CostFunction<'a>>) -> Self {
        self.splitting = cost;
        self
    }

    /// Whether any event type is enabled.
    pub fn any_enabled(&self) -> bool {
        self.gap_closing.is_some() || self.merging.is_some() || self.splitting.is_some()
    }

    pub fn build(
        &self,
        spots: &SpotCollection,
        segments: &TrackSegments,
        pool: &WorkerPool,
    ) -> Result<SegmentCostMatrix, TrackerError> {
        let s = segments.num_segments();
        let p = segments.num_middle_points();
        let blocked = self.blocking_value;

        check_block_size(STAGE, s, s, self.max_elements)?;
        let gap_closing = match self.gap_closing {
            Some(cost) => pool.fill_columns(s, s, STAGE, |j, out| {
                let start = spots.get(segments.segments[j].first());
                for (i, cell) in out.iter_mut().enumerate() {
                    *cell = if i == j {
                        blocked
                    } else {
                        let end = spots.get(segments.segments[i].last());
                        cost.evaluate(EventSpots::pair(end, start))?
                            .unwrap_or(blocked)
                    };
                }
                Ok(())
            })?,
            None => CostMatrix::blocked(s, s, blocked).into_inner(),
        };
        let gap_closing = CostMatrix::new(gap_closing, blocked);

        let (merging, merge_candidates) = match self.merging {
            Some(cost) if p > 0 && s > 0 => {
                check_block_size(STAGE, s, p, self.max_elements)?;
                let m = pool.fill_columns(s, p, STAGE, |k, out| {
                    let middle = &segments.middle_points[k];
                    let target = spots.get(middle.spot);
                    let predecessor = spots.get(segments.predecessor(middle));
                    for (i, cell) in out.iter_mut().enumerate() {
                        *cell = if middle.segment == i {
                            blocked
                        } else {
                            let end = spots.get(segments.segments[i].last());
                            cost.evaluate(EventSpots::junction(end, target, predecessor))?
                                .unwrap_or(blocked)
                        };
                    }
                    Ok(())
                })?;
                let m = CostMatrix::new(m, blocked);
                let keep = (0..p).filter(|&k| m.col_has_finite(k)).collect::<Vec<_>>();
                (Some(m), keep)
            }
            _ => (None, Vec::new()),
        };

        let (splitting, split_candidates) = match self.splitting {
            Some(cost) if p > 0 && s > 0 => {
                check_block_size(STAGE, p, s, self.max_elements)?;
                let m = pool.fill_columns(p, s, STAGE, |j, out| {
                    let daughter = spots.get(segments.segments[j].first());
                    for (k, cell) in out.iter_mut().enumerate() {
                        let middle = &segments.middle_points[k];
                        *cell = if middle.segment == j {
                            blocked
                        } else {
                            let mother = spots.get(middle.spot);
                            let sibling = spots.get(segments.successor(middle));
                            cost.evaluate(EventSpots::junction(mother, daughter, sibling))?
                                .unwrap_or(blocked)
                        };
                    }
                    Ok(())
                })?;
                let m = CostMatrix::new(m, blocked);
                let keep = (0..p).filter(|&k| m.row_has_finite(k)).collect::<Vec<_>>();
                (Some(m), keep)
            }
            _ => (None, Vec::new()),
        };

        let rows = s + split_candidates.len();
        let cols = s + merge_candidates.len();
        check_square_size(STAGE, rows, cols, self.max_elements)?;

        let top_left = pool.fill_columns(rows, cols, STAGE, |c, out| {
            for (r, cell) in out.iter_mut().enumerate() {
                *cell = match (r < s, c < s) {
                    (true, true) => gap_closing.get(r, c),
                    (true, false) => merging
                        .as_ref()
                        .map_or(blocked, |m| m.get(r, merge_candidates[c - s])),
                    (false, true) => splitting
                        .as_ref()
                        .map_or(blocked, |m| m.get(split_candidates[r - s], c)),
                    (false, false) => blocked,
                };
            }
            Ok(())
        })?;

        Ok(SegmentCostMatrix {
            top_left: CostMatrix::new(top_left, blocked),
            num_segments: s,
            merge_candidates,
            split_candidates,
        })
    }
}

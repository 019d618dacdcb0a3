//! Track segments produced by frame-to-frame linking
//!
//! A [`TrackSegment`] is a maximal gap-free chain of spots. Its interior
//! spots are [`MiddlePoint`]s, the only places where a merge or a split
//! may attach during segment-level reconciliation.

use super::spot::{SpotCollection, SpotRef};

/// Maximal chain of spots linked frame to frame, consecutive frames only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSegment {
    spots: Vec<SpotRef>,
}

impl TrackSegment {
    /// Create a segment. Callers guarantee the chain invariant; see
    /// [`TrackSegment::is_contiguous`].
    pub(crate) fn new(spots: Vec<SpotRef>) -> Self {
        debug_assert!(!spots.is_empty());
        Self { spots }
    }

    /// First (earliest) spot
    #[inline]
    pub fn first(&self) -> SpotRef {
        self.spots[0]
    }

    /// Last (latest) spot
    #[inline]
    pub fn last(&self) -> SpotRef {
        self.spots[self.spots.len() - 1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.spots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Spots in frame order
    pub fn spots(&self) -> &[SpotRef] {
        &self.spots
    }

    /// Spot at a position along the chain
    #[inline]
    pub fn get(&self, position: usize) -> Option<SpotRef> {
        self.spots.get(position).copied()
    }

    /// Check that consecutive spots are exactly one frame apart.
    pub fn is_contiguous(&self, spots: &SpotCollection) -> bool {
        self.spots
            .windows(2)
            .all(|w| spots.get(w[1]).frame() == spots.get(w[0]).frame() + 1)
    }
}

/// Interior spot of a segment (neither first nor last).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiddlePoint {
    /// The spot itself
    pub spot: SpotRef,
    /// Index of the owning segment
    pub segment: usize,
    /// Position inside the owning segment, in `1..len-1`
    pub position: usize,
}

/// Output of the segment assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSegments {
    /// All segments, ordered by the frame then frame offset of their first spot
    pub segments: Vec<TrackSegment>,
    /// Interior spots of all segments, in segment order
    pub middle_points: Vec<MiddlePoint>,
}

impl TrackSegments {
    /// Collect middle points of every segment long enough to have one.
    pub fn new(segments: Vec<TrackSegment>) -> Self {
        let middle_points = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.len() >= 3)
            .flat_map(|(s, segment)| {
                (1..segment.len() - 1).map(move |position| MiddlePoint {
                    spot: segment.spots[position],
                    segment: s,
                    position,
                })
            })
            .collect();

        Self {
            segments,
            middle_points,
        }
    }

    #[inline]
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn num_middle_points(&self) -> usize {
        self.middle_points.len()
    }

    /// Spot right after a middle point in its own segment.
    pub fn successor(&self, middle: &MiddlePoint) -> SpotRef {
        self.segments[middle.segment].spots[middle.position + 1]
    }

    /// Spot right before a middle point in its own segment.
    pub fn predecessor(&self, middle: &MiddlePoint) -> SpotRef {
        self.segments[middle.segment].spots[middle.position - 1]
    }
}

//! Track segment assembly
//!
//! Frame linking yields, per consecutive frame pair, a one-to-one set of
//! links. Once every pair is done the links are folded into maximal
//! chains: a spot without an incoming link starts a segment, and each
//! outgoing link extends the segment its source belongs to. Links are
//! injective per frame pair, so chains never fork here.

use crate::types::{SpotCollection, SpotRef, TrackSegment, TrackSegments};

/// Link between a spot in frame `t` and a spot in frame `t + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLink {
    pub source: SpotRef,
    pub target: SpotRef,
    pub cost: f64,
}

/// Accepted links of one frame pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLinks {
    pub from: usize,
    pub to: usize,
    pub links: Vec<FrameLink>,
}

impl FrameLinks {
    /// Frame pair with no links
    pub fn empty(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            links: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Folds frame links into [`TrackSegments`].
#[derive(Debug, Clone)]
pub struct SegmentAssembler {
    next: Vec<Option<SpotRef>>,
    has_incoming: Vec<bool>,
}

impl SegmentAssembler {
    pub fn new(num_spots: usize) -> Self {
        Self {
            next: vec![None; num_spots],
            has_incoming: vec![false; num_spots],
        }
    }

    /// Record the links of one frame pair.
    pub fn add_links(&mut self, links: &FrameLinks) {
        for link in &links.links {
            debug_assert!(self.next[link.source.0].is_none(), "spot linked forward twice");
            debug_assert!(!self.has_incoming[link.target.0], "spot linked backward twice");
            self.next[link.source.0] = Some(link.target);
            self.has_incoming[link.target.0] = true;
        }
    }

    /// Walk every chain from its head. Segments come out in the order of
    /// their first spot in the collection (frame, then position in frame).
    pub fn assemble(self, spots: &SpotCollection) -> TrackSegments {
        debug_assert_eq!(spots.len(), self.next.len());
        let mut segments = Vec::new();

        for head in (0..self.next.len()).filter(|&i| !self.has_incoming[i]) {
            let mut chain = vec![SpotRef(head)];
            let mut current = head;
            while let Some(next) = self.next[current] {
                chain.push(next);
                current = next.0;
            }
            segments.push(TrackSegment::new(chain));
        }

        TrackSegments::new(segments)
    }
}

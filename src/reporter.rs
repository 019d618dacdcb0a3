//! Observability for tracking runs.
//!
//! This module provides the [`TrackerReporter`] trait for debugging and
//! research instrumentation. Reporters receive callbacks at the key points
//! of a run without polluting the matrix-building code.
//!
//! Callbacks are always delivered from the calling thread, in a fixed
//! order: frame pairs in increasing frame order, then segments, then the
//! segment-level matrix and its links, then the final graph.
//!
//! # Zero-Cost Abstraction
//!
//! The default [`NoOpReporter`] compiles to zero overhead - all callback
//! methods are empty and will be optimized away by the compiler.
//!
//! # Example
//!
//! ```
//! use lap_tracker::{DebugReporter, LapTracker, Spot, SpotCollection, TrackerConfig};
//!
//! let spots = SpotCollection::from_spots(vec![
//!     Spot::from_coords(1, 0, &[0.0, 0.0]),
//!     Spot::from_coords(2, 1, &[1.0, 0.0]),
//! ])
//! .unwrap();
//! let tracker = LapTracker::new(TrackerConfig::default()).unwrap();
//!
//! let mut reporter = DebugReporter::new();
//! tracker.track_with_reporter(spots, &mut reporter).unwrap();
//! assert_eq!(reporter.frame_links().len(), 1);
//! ```

use crate::matrix::SegmentLink;
use crate::tracker::assembler::FrameLinks;
use crate::tracker::errors::MatrixStage;
use crate::types::{TrackGraph, TrackSegments};

/// Shape and content summary of one LAP matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixSummary {
    pub stage: MatrixStage,
    /// Rows of the real-cost block
    pub rows: usize,
    /// Columns of the real-cost block
    pub cols: usize,
    /// Non-blocked entries of the real-cost block
    pub finite: usize,
    /// Alternative cost; `None` when the solver was skipped
    pub alternative_cost: Option<f64>,
}

impl MatrixSummary {
    /// Whether the matrix went to the solver.
    #[inline]
    pub fn solved(&self) -> bool {
        self.alternative_cost.is_some()
    }
}

// ============================================================================
// TrackerReporter Trait
// ============================================================================

/// Observability trait for tracking runs.
///
/// All methods have default empty implementations, so you only need to
/// override the events you care about.
///
/// Reporters use `&mut self` and are NOT required to be `Send + Sync`:
/// parallel work is collected first and reported sequentially.
pub trait TrackerReporter {
    /// Called once per linkable frame pair, after its matrix is built.
    fn on_frame_linking_matrix(&mut self, _summary: &MatrixSummary) {}

    /// Called once per linkable frame pair with the accepted links.
    fn on_frame_links(&mut self, _links: &FrameLinks) {}

    /// Called after segment assembly.
    fn on_segments(&mut self, _segments: &TrackSegments) {}

    /// Called after the segment-level matrix is built.
    ///
    /// Not called when gap closing, merging and splitting are all disabled.
    fn on_segment_matrix(&mut self, _summary: &MatrixSummary) {}

    /// Called with the accepted gap-closing, merging and splitting events.
    fn on_segment_links(&mut self, _links: &[SegmentLink]) {}

    /// Called with the final graph.
    fn on_complete(&mut self, _graph: &TrackGraph) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Zero-cost reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl TrackerReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures all events for debugging.
///
/// Stores clones of everything it receives, including the segments and
/// the final graph. Memory grows with the input size.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    frame_matrices: Vec<MatrixSummary>,
    frame_links: Vec<FrameLinks>,
    segments: Option<TrackSegments>,
    segment_matrix: Option<MatrixSummary>,
    segment_links: Vec<SegmentLink>,
    graph: Option<TrackGraph>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Frame-linking matrix summaries, in frame order.
    pub fn frame_matrices(&self) -> &[MatrixSummary] {
        &self.frame_matrices
    }

    /// Accepted frame links, in frame order.
    pub fn frame_links(&self) -> &[FrameLinks] {
        &self.frame_links
    }

    /// Assembled segments
    pub fn segments(&self) -> Option<&TrackSegments> {
        self.segments.as_ref()
    }

    /// Segment-level matrix summary
    pub fn segment_matrix(&self) -> Option<&MatrixSummary> {
        self.segment_matrix.as_ref()
    }

    /// Accepted segment-level links
    pub fn segment_links(&self) -> &[SegmentLink] {
        &self.segment_links
    }

    /// Final graph
    pub fn graph(&self) -> Option<&TrackGraph> {
        self.graph.as_ref()
    }

    /// Total number of captured events across all types.
    pub fn total_events(&self) -> usize {
        self.frame_matrices.len()
            + self.frame_links.len()
            + usize::from(self.segments.is_some())
            + usize::from(self.segment_matrix.is_some())
            + usize::from(!self.segment_links.is_empty())
            + usize::from(self.graph.is_some())
    }
}

impl TrackerReporter for DebugReporter {
    fn on_frame_linking_matrix(&mut self, summary: &MatrixSummary) {
        self.frame_matrices.push(*summary);
    }

    fn on_frame_links(&mut self, links: &FrameLinks) {
        self.frame_links.push(links.clone());
    }

    fn on_segments(&mut self, segments: &TrackSegments) {
        self.segments = Some(segments.clone());
    }

    fn on_segment_matrix(&mut self, summary: &MatrixSummary) {
        self.segment_matrix = Some(*summary);
    }

    fn on_segment_links(&mut self, links: &[SegmentLink]) {
        self.segment_links.extend_from_slice(links);
    }

    fn on_complete(&mut self, graph: &TrackGraph) {
        self.graph = Some(graph.clone());
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits events through the `log` crate.
///
/// # Log Levels
///
/// - `on_complete`: INFO
/// - `on_segments`, `on_segment_matrix`, `on_segment_links`: DEBUG
/// - `on_frame_linking_matrix`, `on_frame_links`: TRACE
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    /// Whether to log every accepted link
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose logging reporter that logs individual links.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl TrackerReporter for LoggingReporter {
    fn on_frame_linking_matrix(&mut self, summary: &MatrixSummary) {
        log::trace!(
            "{} matrix: {}x{}, {} finite, alternative cost {:?}",
            summary.stage,
            summary.rows,
            summary.cols,
            summary.finite,
            summary.alternative_cost
        );
    }

    fn on_frame_links(&mut self, links: &FrameLinks) {
        log::trace!(
            "Frames {} -> {}: {} links",
            links.from,
            links.to,
            links.len()
        );
        if self.verbose {
            for link in &links.links {
                log::trace!(
                    "  {} -> {} (cost {:.4})",
                    link.source.0,
                    link.target.0,
                    link.cost
                );
            }
        }
    }

    fn on_segments(&mut self, segments: &TrackSegments) {
        log::debug!(
            "Assembled {} segments, {} middle points",
            segments.num_segments(),
            segments.num_middle_points()
        );
    }

    fn on_segment_matrix(&mut self, summary: &MatrixSummary) {
        log::debug!(
            "Segment matrix: {}x{}, {} finite, alternative cost {:?}",
            summary.rows,
            summary.cols,
            summary.finite,
            summary.alternative_cost
        );
    }

    fn on_segment_links(&mut self, links: &[SegmentLink]) {
        log::debug!("Accepted {} segment links", links.len());
        if self.verbose {
            for link in links {
                log::debug!("  {:?} (cost {:.4})", link.event, link.cost);
            }
        }
    }

    fn on_complete(&mut self, graph: &TrackGraph) {
        log::info!(
            "Tracking complete: {} spots, {} edges",
            graph.spots().len(),
            graph.num_edges()
        );
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards events to two child reporters.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: TrackerReporter, B: TrackerReporter> {
    first: A,
    second: B,
}

impl<A: TrackerReporter, B: TrackerReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: TrackerReporter, B: TrackerReporter> TrackerReporter for CompositeReporter<A, B> {
    fn on_frame_linking_matrix(&mut self, summary: &MatrixSummary) {
        self.first.on_frame_linking_matrix(summary);
        self.second.on_frame_linking_matrix(summary);
    }

    fn on_frame_links(&mut self, links: &FrameLinks) {
        self.first.on_frame_links(links);
        self.second.on_frame_links(links);
    }

    fn on_segments(&mut self, segments: &TrackSegments) {
        self.first.on_segments(segments);
        self.second.on_segments(segments);
    }

    fn on_segment_matrix(&mut self, summary: &MatrixSummary) {
        self.first.on_segment_matrix(summary);
        self.second.on_segment_matrix(summary);
    }

    fn on_segment_links(&mut self, links: &[SegmentLink]) {
        self.first.on_segment_links(links);
        self.second.on_segment_links(links);
    }

    fn on_complete(&mut self, graph: &TrackGraph) {
        self.first.on_complete(graph);
        self.second.on_complete(graph);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SegmentEvent;
    use crate::types::SpotCollection;

    fn summary() -> MatrixSummary {
        MatrixSummary {
            stage: MatrixStage::FrameLinking { from: 0, to: 1 },
            rows: 2,
            cols: 3,
            finite: 4,
            alternative_cost: Some(1.5),
        }
    }

    fn segment_link() -> SegmentLink {
        SegmentLink {
            event: SegmentEvent::GapClosing { from: 0, to: 1 },
            cost: 2.0,
        }
    }

    #[test]
    fn test_noop_reporter() {
        let mut reporter = NoOpReporter::new();
        reporter.on_frame_linking_matrix(&summary());
        reporter.on_frame_links(&FrameLinks::empty(0, 1));
        reporter.on_segments(&TrackSegments::default());
        reporter.on_segment_links(&[]);
        reporter.on_complete(&TrackGraph::new(SpotCollection::default()));
    }

    #[test]
    fn test_debug_reporter_captures_events() {
        let mut reporter = DebugReporter::new();
        assert_eq!(reporter.total_events(), 0);

        reporter.on_frame_linking_matrix(&summary());
        reporter.on_frame_links(&FrameLinks::empty(0, 1));
        reporter.on_frame_links(&FrameLinks::empty(1, 2));
        reporter.on_segments(&TrackSegments::default());
        reporter.on_segment_links(&[segment_link()]);
        reporter.on_complete(&TrackGraph::new(SpotCollection::default()));

        assert_eq!(reporter.frame_matrices(), &[summary()]);
        assert_eq!(reporter.frame_links().len(), 2);
        assert_eq!(reporter.frame_links()[1].from, 1);
        assert!(reporter.segments().is_some());
        assert!(reporter.segment_matrix().is_none());
        assert_eq!(reporter.segment_links(), &[segment_link()]);
        assert!(reporter.graph().is_some());
        assert_eq!(reporter.total_events(), 6);

        reporter.clear();
        assert_eq!(reporter.total_events(), 0);
    }

    #[test]
    fn test_logging_reporter() {
        // Just verify it doesn't panic without a logger installed
        let mut reporter = LoggingReporter::verbose();
        reporter.on_frame_linking_matrix(&summary());
        reporter.on_segment_links(&[segment_link()]);
        reporter.on_complete(&TrackGraph::new(SpotCollection::default()));
    }

    #[test]
    fn test_composite_reporter() {
        let mut composite = CompositeReporter::new(DebugReporter::new(), LoggingReporter::new());
        composite.on_frame_linking_matrix(&summary());
        composite.on_segment_matrix(&summary());

        assert_eq!(composite.first().frame_matrices().len(), 1);
        assert!(composite.first().segment_matrix().is_some());

        let (debug, _logging) = composite.into_parts();
        assert_eq!(debug.total_events(), 2);
    }

    #[test]
    fn test_summary_solved_flag() {
        assert!(summary().solved());
        let skipped = MatrixSummary {
            alternative_cost: None,
            ..summary()
        };
        assert!(!skipped.solved());
    }
}

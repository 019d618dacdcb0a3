//! Two-stage LAP tracker
//!
//! 1. Every pair of consecutive frames gets a linking matrix, completed with
//!    alternative quadrants and solved. Frame pairs are independent and run
//!    in parallel on the run's [`WorkerPool`].
//! 2. Once all pairs are done the links are assembled into segments. If gap
//!    closing, merging or splitting is enabled, one segment-level matrix is
//!    built and solved, and its accepted events become edges between
//!    segments.
//!
//! The tracker holds no mutable state; each call to [`LapTracker::track`]
//! owns its pool, matrices and intermediate results.

use rayon::prelude::*;

use crate::association::{Assignment, AssignmentSolver, HungarianSolver};
use crate::matrix::{
    CostMatrix, FrameLinkingBuilder, LapMatrix, SegmentEvent, SegmentLink, SegmentLinkingBuilder,
    WorkerPool,
};
use crate::reporter::{MatrixSummary, NoOpReporter, TrackerReporter};
use crate::types::{EdgeKind, Spot, SpotCollection, SpotRef, TrackGraph, TrackSegments};

use super::assembler::{FrameLink, FrameLinks, SegmentAssembler};
use super::config::TrackerConfig;
use super::errors::{MatrixStage, Result, TrackerError};

/// Output of [`LapTracker::track_detailed`].
#[derive(Debug, Clone)]
pub struct TrackingResult {
    /// Final track graph
    pub graph: TrackGraph,
    /// Segments produced by frame linking, before reconciliation
    pub segments: TrackSegments,
}

/// Linear-assignment tracker, generic over the assignment solver.
#[derive(Debug, Clone)]
pub struct LapTracker<S: AssignmentSolver = HungarianSolver> {
    config: TrackerConfig,
    solver: S,
}

impl LapTracker<HungarianSolver> {
    /// Tracker with the built-in Hungarian solver.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        Self::with_solver(config, HungarianSolver)
    }
}

impl<S: AssignmentSolver> LapTracker<S> {
    /// Tracker with a custom solver. The config is validated here.
    pub fn with_solver(config: TrackerConfig, solver: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Track spots and return the graph.
    pub fn track(&self, spots: SpotCollection) -> Result<TrackGraph> {
        Ok(self.track_detailed(spots)?.graph)
    }

    /// Track spots and also return the intermediate segments.
    pub fn track_detailed(&self, spots: SpotCollection) -> Result<TrackingResult> {
        self.track_with_reporter(spots, &mut NoOpReporter)
    }

    /// Track spots, reporting every stage to `reporter`.
    pub fn track_with_reporter<R: TrackerReporter + ?Sized>(
        &self,
        spots: SpotCollection,
        reporter: &mut R,
    ) -> Result<TrackingResult> {
        self.config.validate()?;
        let pool = WorkerPool::new(self.config.num_workers)?;

        log::info!(
            "Tracking {} spots over {} frames with {} workers ({} solver)",
            spots.len(),
            spots.num_frames(),
            pool.num_workers(),
            self.solver.name()
        );

        // Stage 1: frame-to-frame linking
        // Every pair runs to completion so a failure reports the earliest
        // failing pair, whatever the number of workers.
        let pairs = spots.linkable_frame_pairs();
        let outcomes: Vec<Result<(MatrixSummary, FrameLinks)>> = pool.install(|| {
            pairs
                .par_iter()
                .map(|&(from, to)| self.link_frames(&spots, from, to, &pool))
                .collect()
        });
        let linked = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        let mut assembler = SegmentAssembler::new(spots.len());
        let mut num_links = 0;
        for (summary, links) in &linked {
            reporter.on_frame_linking_matrix(summary);
            reporter.on_frame_links(links);
            assembler.add_links(links);
            num_links += links.len();
        }
        log::debug!(
            "Frame linking: {} frame pairs, {} links",
            linked.len(),
            num_links
        );

        let segments = assembler.assemble(&spots);
        reporter.on_segments(&segments);
        log::debug!(
            "Assembled {} segments, {} middle points",
            segments.num_segments(),
            segments.num_middle_points()
        );

        // Stage 2: gap closing, merging, splitting
        let segment_links = if self.config.any_segment_event_enabled() {
            let (summary, links) = self.link_segments(&spots, &segments, &pool)?;
            reporter.on_segment_matrix(&summary);
            reporter.on_segment_links(&links);
            links
        } else {
            Vec::new()
        };

        let mut graph = TrackGraph::new(spots);
        for link in linked.iter().flat_map(|(_, links)| &links.links) {
            graph.add_edge(link.source, link.target, EdgeKind::Link, link.cost);
        }
        for link in &segment_links {
            let (source, target, kind) = resolve_event(&segments, link.event);
            graph.add_edge(source, target, kind, link.cost);
        }

        log::info!(
            "Tracking complete: {} links, {} gap closings, {} merges, {} splits",
            num_links,
            graph.edges_of_kind(EdgeKind::GapClosing).count(),
            graph.edges_of_kind(EdgeKind::Merging).count(),
            graph.edges_of_kind(EdgeKind::Splitting).count()
        );
        reporter.on_complete(&graph);

        Ok(TrackingResult { graph, segments })
    }

    /// Build and solve the linking matrix of one frame pair.
    fn link_frames(
        &self,
        spots: &SpotCollection,
        from: usize,
        to: usize,
        pool: &WorkerPool,
    ) -> Result<(MatrixSummary, FrameLinks)> {
        let stage = MatrixStage::FrameLinking { from, to };
        let source: &[Spot] = spots.frame(from);
        let target: &[Spot] = spots.frame(to);

        let builder = FrameLinkingBuilder::new(
            self.config.linking_cost(),
            self.config.blocking_value,
            self.config.max_matrix_elements,
        );
        let top_left = builder.build(from, to, source, target, pool)?;

        let mut summary = MatrixSummary {
            stage,
            rows: top_left.nrows(),
            cols: top_left.ncols(),
            finite: top_left.num_finite(),
            alternative_cost: None,
        };

        // Nothing can link: skip the solver
        if top_left.is_empty() || !top_left.has_finite() {
            log::trace!("{}: no candidate links", stage);
            return Ok((summary, FrameLinks::empty(from, to)));
        }

        let alternative = top_left.alternative_cost(
            self.config.alternative_cost_factor,
            self.config.cutoff_percentile,
        );
        summary.alternative_cost = Some(alternative);

        let lap = LapMatrix::complete(
            &top_left,
            alternative,
            stage,
            self.config.max_matrix_elements,
            pool,
        )?;
        let assignment = self.solve(lap.matrix(), stage)?;

        let source_offset = spots.frame_range(from).start;
        let target_offset = spots.frame_range(to).start;
        let links = assignment
            .pairs()
            .filter(|&(r, c)| lap.is_top_left(r, c))
            .map(|(r, c)| FrameLink {
                source: SpotRef(source_offset + r),
                target: SpotRef(target_offset + c),
                cost: top_left.get(r, c),
            })
            .collect::<Vec<_>>();

        log::trace!(
            "{}: {}x{} block, alternative cost {:.4}, {} links",
            stage,
            summary.rows,
            summary.cols,
            alternative,
            links.len()
        );

        Ok((summary, FrameLinks { from, to, links }))
    }

    /// Build and solve the segment-level matrix.
    fn link_segments(
        &self,
        spots: &SpotCollection,
        segments: &TrackSegments,
        pool: &WorkerPool,
    ) -> Result<(MatrixSummary, Vec<SegmentLink>)> {
        let stage = MatrixStage::SegmentLinking;
        let builder = SegmentLinkingBuilder::new(
            self.config.blocking_value,
            self.config.max_matrix_elements,
        )
        .gap_closing(self.config.gap_closing_cost())
        .merging(self.config.merging_cost())
        .splitting(self.config.splitting_cost());

        let matrix = builder.build(spots, segments, pool)?;
        let top_left = &matrix.top_left;
        let mut summary = MatrixSummary {
            stage,
            rows: top_left.nrows(),
            cols: top_left.ncols(),
            finite: top_left.num_finite(),
            alternative_cost: None,
        };

        if top_left.is_empty() || !top_left.has_finite() {
            log::debug!("Segment linking: no candidate events");
            return Ok((summary, Vec::new()));
        }

        let alternative = top_left.alternative_cost(
            self.config.alternative_cost_factor,
            self.config.cutoff_percentile,
        );
        summary.alternative_cost = Some(alternative);
        log::debug!(
            "Segment linking: {} segments, {} merge and {} split candidates, alternative cost {:.4}",
            matrix.num_segments,
            matrix.merge_candidates.len(),
            matrix.split_candidates.len(),
            alternative
        );

        let lap = LapMatrix::complete(
            top_left,
            alternative,
            stage,
            self.config.max_matrix_elements,
            pool,
        )?;
        let assignment = self.solve(lap.matrix(), stage)?;

        let mut links = Vec::new();
        for (r, c) in assignment.pairs().filter(|&(r, c)| lap.is_top_left(r, c)) {
            match matrix.event(r, c) {
                Some(event) => links.push(SegmentLink {
                    event,
                    cost: top_left.get(r, c),
                }),
                None => {
                    return Err(TrackerError::SolverInfeasible {
                        stage,
                        rows: lap.side(),
                        cols: lap.side(),
                    })
                }
            }
        }

        Ok((summary, links))
    }

    /// Solve a completed matrix and check the result is a finite perfect
    /// matching.
    fn solve(&self, matrix: &CostMatrix, stage: MatrixStage) -> Result<Assignment> {
        let infeasible = || TrackerError::SolverInfeasible {
            stage,
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        };

        let assignment = self.solver.solve(matrix).map_err(|e| {
            log::error!("{} solver failed on {}: {}", self.solver.name(), stage, e);
            infeasible()
        })?;

        if assignment.len() != matrix.nrows() || !assignment.is_permutation() {
            log::error!("{}: solver returned a malformed assignment", stage);
            return Err(infeasible());
        }
        if let Some((r, c)) = assignment.pairs().find(|&(r, c)| matrix.is_blocked(r, c)) {
            log::error!("{}: solver selected blocked cell ({}, {})", stage, r, c);
            return Err(infeasible());
        }
        Ok(assignment)
    }
}

/// Graph edge for a segment-level event.
fn resolve_event(segments: &TrackSegments, event: SegmentEvent) -> (SpotRef, SpotRef, EdgeKind) {
    match event {
        SegmentEvent::GapClosing { from, to } => (
            segments.segments[from].last(),
            segments.segments[to].first(),
            EdgeKind::GapClosing,
        ),
        SegmentEvent::Merging { segment, middle } => (
            segments.segments[segment].last(),
            segments.middle_points[middle].spot,
            EdgeKind::Merging,
        ),
        SegmentEvent::Splitting { middle, segment } => (
            segments.middle_points[middle].spot,
            segments.segments[segment].first(),
            EdgeKind::Splitting,
        ),
    }
}

/// Track `(frame, spots)` groups with the Hungarian solver.
///
/// # Example
///
/// ```
/// use lap_tracker::{track, Spot, TrackerConfig};
///
/// let frames = vec![
///     (0, vec![Spot::from_coords(1, 0, &[0.0, 0.0])]),
///     (1, vec![Spot::from_coords(2, 1, &[1.0, 1.0])]),
/// ];
/// let graph = track(frames, &TrackerConfig::default()).unwrap();
/// assert_eq!(graph.num_edges(), 1);
/// ```
pub fn track<I>(spots_by_frame: I, config: &TrackerConfig) -> Result<TrackGraph>
where
    I: IntoIterator<Item = (usize, Vec<Spot>)>,
{
    let spots = SpotCollection::from_frames(spots_by_frame)?;
    LapTracker::new(config.clone())?.track(spots)
}

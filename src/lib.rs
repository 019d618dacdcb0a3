/*!
# lap-tracker - Two-stage linear assignment tracking

Links detected point objects ("spots") across a time sequence into
trajectories, following the two-stage LAP design of Jaqaman et al.:

1. **Frame linking**: spots of consecutive frames are matched by solving a
   linear assignment problem per frame pair, producing gap-free track
   segments.
2. **Segment linking**: one global assignment problem reconnects segments
   across missed detections (gap closing) and attaches segment ends and
   starts to the interior of other segments (merging and splitting).

Every matrix is completed with alternative "no link" quadrants so a finite
perfect matching always exists.

## Modules

- [`types`] - Spots, segments and the output graph
- [`costs`] - Distance primitives and per-event cost functions
- [`matrix`] - Cost matrices, LAP completion, worker pool and builders
- [`association`] - Assignment solver trait and the Hungarian solver
- [`tracker`] - Configuration, errors, segment assembly and the orchestrator
- [`reporter`] - Observability hooks
- [`common`] - Constants and numeric helpers

## Example

```rust
use lap_tracker::{EdgeKind, LapTracker, Spot, SpotCollection, TrackerConfig};

let spots = SpotCollection::from_frames(vec![
    (0, vec![Spot::from_coords(1, 0, &[0.0, 0.0]), Spot::from_coords(2, 0, &[10.0, 10.0])]),
    (1, vec![Spot::from_coords(3, 1, &[1.0, 1.0]), Spot::from_coords(4, 1, &[11.0, 9.0])]),
])
.unwrap();

let config = TrackerConfig::builder()
    .linking_max_distance(5.0)
    .build()
    .unwrap();
let graph = LapTracker::new(config).unwrap().track(spots).unwrap();

assert_eq!(graph.edges_of_kind(EdgeKind::Link).count(), 2);
assert_eq!(graph.tracks().len(), 2);
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Spots, segments and the track graph
pub mod types;

/// Cost functions for linking, gap closing, merging and splitting
pub mod costs;

/// Cost matrix construction
pub mod matrix;

/// Assignment solvers
pub mod association;

/// Configuration, errors and the tracking pipeline
pub mod tracker;

/// Observability hooks
pub mod reporter;

/// Constants and numeric helpers
pub mod common;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Core types
pub use types::{
    Edge, EdgeKind, Feature, MiddlePoint, MorphologyClass, Spot, SpotCollection, SpotRef,
    TrackGraph, TrackSegment, TrackSegments,
};

// Configuration
pub use tracker::{
    GapClosingConfig, LinkingConfig, MergingConfig, SplittingConfig, TrackerConfig,
    TrackerConfigBuilder,
};

// Errors
pub use tracker::{ConfigError, InputError, MatrixStage, SolverError, TrackerError};

// Tracker
pub use tracker::{track, LapTracker, TrackingResult};

// Solvers
pub use association::{Assignment, AssignmentSolver, HungarianSolver};

// Cost functions
pub use costs::{CostFunction, FeaturePenalties, RatioBounds};

// Matrices
pub use matrix::{CostMatrix, LapMatrix};

// Reporters
pub use reporter::{
    CompositeReporter, DebugReporter, LoggingReporter, MatrixSummary, NoOpReporter,
    TrackerReporter,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

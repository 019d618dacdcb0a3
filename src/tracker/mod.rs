//! Tracking pipeline
//!
//! - [`config`]: [`TrackerConfig`] and its builder
//! - [`errors`]: [`TrackerError`] taxonomy
//! - [`assembler`]: frame links to track segments
//! - [`lap_tracker`]: the two-stage orchestrator

pub mod assembler;
pub mod config;
pub mod errors;
pub mod lap_tracker;

pub use assembler::{FrameLink, FrameLinks, SegmentAssembler};
pub use config::{
    GapClosingConfig, LinkingConfig, MergingConfig, SplittingConfig, TrackerConfig,
    TrackerConfigBuilder,
};
pub use errors::{ConfigError, InputError, MatrixStage, Result, SolverError, TrackerError};
pub use lap_tracker::{track, LapTracker, TrackingResult};

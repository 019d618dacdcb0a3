//! Core data types for the tracker
//!
//! # Types
//!
//! - [`Spot`] - Detected point object with position, frame and features
//! - [`SpotCollection`] - Time-ordered spot store, indexed by [`SpotRef`]
//! - [`TrackSegment`] - Gap-free chain of spots from frame-to-frame linking
//! - [`MiddlePoint`] - Interior spot of a segment, a merge/split candidate
//! - [`TrackGraph`] - Final output: spots linked by typed [`Edge`]s

pub mod graph;
pub mod segment;
pub mod spot;

pub use graph::{Edge, EdgeKind, TrackGraph};
pub use segment::{MiddlePoint, TrackSegment, TrackSegments};
pub use spot::{Feature, MorphologyClass, Spot, SpotCollection, SpotRef};

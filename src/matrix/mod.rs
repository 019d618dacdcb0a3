//! Cost matrix construction
//!
//! - [`CostMatrix`]: dense table plus blocking sentinel
//! - [`LapMatrix`]: square completion with alternative "no link" quadrants
//! - [`FrameLinkingBuilder`]: frame t to frame t+1 costs
//! - [`SegmentLinkingBuilder`]: gap closing, merging and splitting costs
//! - [`WorkerPool`]: the run-scoped threads every builder fills rows on

pub mod cost_matrix;
pub mod lap;
pub mod linking;
pub mod pool;
pub mod segment;

pub use cost_matrix::CostMatrix;
pub use lap::{check_block_size, check_square_size, LapMatrix};
pub use linking::FrameLinkingBuilder;
pub use pool::WorkerPool;
pub use segment::{SegmentCostMatrix, SegmentEvent, SegmentLink, SegmentLinkingBuilder};

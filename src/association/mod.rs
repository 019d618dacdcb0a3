//! Assignment solving
//!
//! [`AssignmentSolver`] is the seam to the linear assignment solver.
//! [`HungarianSolver`] is the built-in implementation.

pub mod hungarian;
pub mod solver;

pub use hungarian::{hungarian, HungarianSolver};
pub use solver::{validate_square, Assignment, AssignmentSolver};

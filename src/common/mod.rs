//! Shared numeric constants and helpers.

pub mod constants;
pub mod utils;

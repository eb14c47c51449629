//! Counters for candidate generation.
//!
//! This module provides a small accumulator recording how many rounds ran,
//! how many graph edges were visited and how many candidate pushes were
//! accepted or rejected.

mod stats;
pub use stats::*;

//! Core of an approximate k-nearest-neighbor graph builder based on neighbor
//! descent: bounded per-point neighbor heaps, a caller-owned deterministic
//! random generator, and the candidate generation step of a descent round.

pub mod candidates;
pub mod error;
pub mod numerics;
pub mod random;
pub mod sets;
pub mod statistics;

pub use error::{DescentError, Result};

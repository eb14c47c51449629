//! Deterministic randomness for neighbor descent.
//!
//! This module provides the tau generator whose state is owned and passed
//! explicitly by the caller, and the rejection sampler built on top of it.

mod sampler;
mod tau_rng;

pub use sampler::*;
pub use tau_rng::*;

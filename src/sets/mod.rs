//! Data structures for neighbor descent.
//!
//! # Submodules
//!
//! - [`heap`]: Bounded per-point candidate heaps with exploration flags
pub mod heap;

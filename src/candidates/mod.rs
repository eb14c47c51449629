//! Candidate generation for neighbor descent rounds.
//!
//! The descent driver owns the long-lived graph heap. Each round it asks a
//! [`CandidateBuilder`] for a fresh heap of candidate edges, evaluates true
//! distances for them and pushes the accepted ones back into the graph.

mod candidate_builder;
mod params;

pub use candidate_builder::*;
pub use params::*;

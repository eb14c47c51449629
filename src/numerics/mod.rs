//! Small numeric helpers over `f32` vectors.

mod f32slice;

pub use f32slice::VectorLike;

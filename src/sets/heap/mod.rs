//! Fixed-capacity neighbor heaps.
//!
//! A [`NeighborHeap`] keeps, for every point, the best candidates found so far
//! together with an "is new" flag telling whether the candidate still has to
//! be used for candidate generation. [`SortedNeighbors`] is its final, sorted
//! read-out.

mod neighbor_heap;
mod row_ops;
mod slot;
mod sorted;

pub use neighbor_heap::*;
pub use slot::*;
pub use sorted::*;

pub(crate) use row_ops::push as push_into_row;

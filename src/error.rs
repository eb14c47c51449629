//! Error type shared by the construction and validation paths of the crate.
//!
//! The hot numeric routines (heap push, flag extraction, random draws) never
//! return errors; they report rejection through their return values. Errors
//! are reserved for malformed shapes and precondition checks that callers can
//! act on.

use thiserror::Error;

use crate::sets::heap::PointId;

#[derive(Debug, Error)]
pub enum DescentError {
    /// A heap needs at least one slot per row, the root is always compared against.
    #[error("heap capacity must be greater than zero")]
    ZeroCapacity,

    /// One of the parallel slot arrays does not match `n_points * capacity`.
    #[error("field `{field}` has {found} entries, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("row {row} holds index {index} more than once")]
    DuplicateIndex { row: usize, index: PointId },

    #[error("row {row} violates the max-heap order at slot {slot}")]
    HeapOrder { row: usize, slot: usize },

    #[error("slot {slot} of row {row} is populated but its weight is NaN")]
    NanWeight { row: usize, slot: usize },

    #[error("slot index {index} in row {row} is negative but not the -1 sentinel")]
    InvalidIndex { row: usize, index: i64 },

    #[error("requested {n_neighbors} neighbors per row, but the graph only holds {capacity}")]
    NeighborsExceedCapacity { n_neighbors: usize, capacity: usize },

    #[error("requested {n_vertices} vertices, but the graph only has {n_points} rows")]
    VerticesExceedRows { n_vertices: usize, n_points: usize },

    #[error("row {row} references neighbor {neighbor}, outside of 0..{n_vertices}")]
    NeighborOutOfRange {
        row: usize,
        neighbor: PointId,
        n_vertices: usize,
    },

    /// Drawing `n` distinct values from a smaller pool can never terminate.
    #[error("cannot draw {n} distinct samples from a pool of {pool}")]
    SampleExceedsPool { n: usize, pool: usize },

    #[error("partitioned strategy needs at least one worker")]
    NoWorkers,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed parameter file, or a failure writing a JSON report.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DescentError>;

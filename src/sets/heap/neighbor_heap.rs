use hashbrown::HashSet;
use rayon::{
    prelude::*,
    slice::{ChunksExactMut, ChunksMut},
};

use crate::{
    error::{DescentError, Result},
    sets::heap::{PointId, Slot, SortedNeighbors, row_ops},
};

/// Bounded candidate lists for every point of a dataset.
///
/// Logically a table of `n_points` rows by `capacity` slots, stored as one
/// contiguous buffer. Each row is a max-heap on weight, so its worst (largest)
/// candidate sits at the root and is the one evicted by a better push.
///
/// # Invariants
/// - Every row satisfies `weight[parent] >= weight[child]`.
/// - No populated index appears twice in the same row.
/// - A row holds the `capacity` smallest-weight distinct candidates ever
///   accepted into it.
///
/// Rows are only mutated through [`push`](Self::push),
/// [`smallest_flagged`](Self::smallest_flagged) and the flag-clearing done by
/// candidate building; there is no raw write access to the slots.
///
/// # Example
/// ```
/// use descent::sets::heap::NeighborHeap;
///
/// let mut heap = NeighborHeap::new(2, 3).unwrap();
/// assert_eq!(heap.push(0, 5.0, 10, true), 1);
/// assert_eq!(heap.push(0, 5.0, 10, true), 0); // duplicate
/// assert_eq!(heap.smallest_flagged(0), Some(10));
/// assert_eq!(heap.smallest_flagged(0), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborHeap {
    slots: Vec<Slot>,
    n_points: usize,
    capacity: usize,
}

impl NeighborHeap {
    /// Allocates `n_points` rows of `capacity` empty slots.
    ///
    /// # Arguments
    /// * `n_points` - Number of rows, one per point
    /// * `capacity` - Maximum number of candidates kept per row
    ///
    /// # Returns
    /// A heap whose slots all hold the empty sentinel: no index, infinite
    /// weight, flag cleared.
    ///
    /// # Errors
    /// [`DescentError::ZeroCapacity`] if `capacity == 0`.
    pub fn new(n_points: usize, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DescentError::ZeroCapacity);
        }
        Ok(NeighborHeap {
            slots: vec![Slot::EMPTY; n_points * capacity],
            n_points,
            capacity,
        })
    }

    /// Rebuilds a heap from three row-major parallel arrays in the flat
    /// convention: index `-1` marks an empty slot (its weight and flag are
    /// ignored).
    ///
    /// # Errors
    /// Fails fast if an array length differs from `n_points * capacity`, if a
    /// negative index other than `-1` appears, if a populated slot carries a
    /// NaN weight, or if a row breaks the heap order or holds a duplicate
    /// index.
    pub fn from_parts(
        n_points: usize,
        capacity: usize,
        indices: &[i64],
        weights: &[f32],
        flags: &[bool],
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(DescentError::ZeroCapacity);
        }
        let expected = n_points * capacity;
        for (field, found) in [
            ("indices", indices.len()),
            ("weights", weights.len()),
            ("flags", flags.len()),
        ] {
            if found != expected {
                return Err(DescentError::ShapeMismatch {
                    field,
                    expected,
                    found,
                });
            }
        }

        let mut slots = Vec::with_capacity(expected);
        for (position, ((&index, &weight), &is_new)) in
            indices.iter().zip(weights).zip(flags).enumerate()
        {
            let slot = match index {
                -1 => Slot::EMPTY,
                i if i < 0 => {
                    return Err(DescentError::InvalidIndex {
                        row: position / capacity,
                        index: i,
                    });
                }
                _ if weight.is_nan() => {
                    return Err(DescentError::NanWeight {
                        row: position / capacity,
                        slot: position % capacity,
                    });
                }
                i => Slot::new(i as PointId, weight, is_new),
            };
            slots.push(slot);
        }

        let heap = NeighborHeap {
            slots,
            n_points,
            capacity,
        };
        heap.check_invariants()?;
        Ok(heap)
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read-only view of one row, in heap order (root first).
    ///
    /// # Panics
    /// Panics if `row >= n_points`.
    pub fn row(&self, row: usize) -> &[Slot] {
        assert!(row < self.n_points, "row {row} out of range");
        &self.slots[row * self.capacity..(row + 1) * self.capacity]
    }

    fn row_mut(&mut self, row: usize) -> &mut [Slot] {
        assert!(row < self.n_points, "row {row} out of range");
        &mut self.slots[row * self.capacity..(row + 1) * self.capacity]
    }

    /// Parallel iterator over every row, each handed to exactly one task.
    pub(crate) fn par_rows_mut(&mut self) -> ChunksExactMut<'_, Slot> {
        self.slots.par_chunks_exact_mut(self.capacity)
    }

    /// Parallel iterator over disjoint blocks of `rows_per_block` consecutive
    /// rows, covering rows `0..n_rows`. The last block may be shorter.
    pub(crate) fn par_row_blocks_mut(
        &mut self,
        rows_per_block: usize,
        n_rows: usize,
    ) -> ChunksMut<'_, Slot> {
        assert!(n_rows <= self.n_points, "row {n_rows} out of range");
        self.slots[..n_rows * self.capacity].par_chunks_mut(rows_per_block * self.capacity)
    }

    pub(crate) fn clear_flag(&mut self, row: usize, slot: usize) {
        self.row_mut(row)[slot].is_new = false;
    }

    /// Offers a candidate to `row`.
    ///
    /// # Arguments
    /// * `row` - Row receiving the candidate
    /// * `weight` - Candidate weight, smaller is better
    /// * `index` - Candidate point
    /// * `is_new` - Flag stored with the candidate
    ///
    /// # Returns
    /// 1 when the candidate was inserted (evicting the row's current
    /// maximum), 0 when it was rejected because its weight is not smaller than
    /// that maximum or because `index` is already in the row. A rejected push
    /// leaves the row unchanged. The return value is meant to be summed by the
    /// caller as an update counter.
    ///
    /// # Panics
    /// Panics if `row >= n_points`.
    pub fn push(&mut self, row: usize, weight: f32, index: PointId, is_new: bool) -> usize {
        row_ops::push(self.row_mut(row), weight, index, is_new)
    }

    /// Returns the unexplored candidate of `row` with the smallest weight and
    /// marks it explored. Returns `None`, without mutating anything, when no
    /// slot of the row is flagged.
    ///
    /// # Panics
    /// Panics if `row >= n_points`.
    pub fn smallest_flagged(&mut self, row: usize) -> Option<PointId> {
        row_ops::take_smallest_flagged(self.row_mut(row))
    }

    /// Number of flagged slots over the whole heap.
    pub fn count_flagged(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_new).count()
    }

    /// Checks the max-heap order and index uniqueness of every row.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.capacity);
        for (row, slots) in self.slots.chunks_exact(self.capacity).enumerate() {
            if let Some(slot) = row_ops::heap_violation(slots) {
                return Err(DescentError::HeapOrder { row, slot });
            }
            seen.clear();
            for index in slots.iter().filter_map(Slot::index) {
                if !seen.insert(index) {
                    return Err(DescentError::DuplicateIndex { row, index });
                }
            }
        }
        Ok(())
    }

    /// Flat row-major copies of the three slot fields in the `-1`/`+inf`
    /// convention.
    pub fn to_parallel_arrays(&self) -> (Vec<i64>, Vec<f32>, Vec<bool>) {
        let indices = self.slots.iter().map(Slot::raw_index).collect();
        let weights = self.slots.iter().map(Slot::weight).collect();
        let flags = self.slots.iter().map(Slot::is_new).collect();
        (indices, weights, flags)
    }

    /// Sorts every row by ascending weight and hands back the result.
    ///
    /// This is the terminal read-out of a graph: the heap is consumed, since
    /// its rows no longer satisfy the heap order afterwards.
    pub fn into_sorted(mut self) -> SortedNeighbors {
        self.par_rows_mut().for_each(row_ops::sort);
        SortedNeighbors::from_sorted_slots(self.slots, self.n_points, self.capacity)
    }
}

use crate::sets::heap::{PointId, Slot};

/// Final neighbor lists of a graph, each row sorted by ascending weight.
///
/// Produced by [`super::NeighborHeap::into_sorted`]. Empty slots come last in
/// their row, as `None` with an infinite weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedNeighbors {
    indices: Vec<Option<PointId>>,
    weights: Vec<f32>,
    n_points: usize,
    capacity: usize,
}

impl SortedNeighbors {
    pub(crate) fn from_sorted_slots(slots: Vec<Slot>, n_points: usize, capacity: usize) -> Self {
        let (indices, weights) = slots.into_iter().map(|s| (s.index, s.weight)).unzip();
        SortedNeighbors {
            indices,
            weights,
            n_points,
            capacity,
        }
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// # Panics
    /// Panics if `row >= n_points`.
    pub fn indices(&self, row: usize) -> &[Option<PointId>] {
        assert!(row < self.n_points, "row {row} out of range");
        &self.indices[row * self.capacity..(row + 1) * self.capacity]
    }

    /// # Panics
    /// Panics if `row >= n_points`.
    pub fn weights(&self, row: usize) -> &[f32] {
        assert!(row < self.n_points, "row {row} out of range");
        &self.weights[row * self.capacity..(row + 1) * self.capacity]
    }

    /// The populated `(index, weight)` pairs of a row, nearest first.
    pub fn iter_row(&self, row: usize) -> impl Iterator<Item = (PointId, f32)> + '_ {
        self.indices(row)
            .iter()
            .zip(self.weights(row))
            .filter_map(|(index, &weight)| index.map(|i| (i, weight)))
    }

    /// Flat row-major `(indices, weights)` with `-1` for empty slots.
    pub fn to_parallel_arrays(&self) -> (Vec<i64>, Vec<f32>) {
        let indices = self
            .indices
            .iter()
            .map(|index| index.map_or(-1, |i| i as i64))
            .collect();
        (indices, self.weights.clone())
    }
}

//! Algorithms on a single heap row.
//!
//! A row is a slice of [`Slot`]s laid out as an implicit binary max-heap on
//! `weight`: the children of slot `i` are `2i + 1` and `2i + 2`. Every public
//! mutator of [`super::NeighborHeap`] funnels through these functions, which
//! is what keeps the heap order and the no-duplicate rule intact.

use crate::sets::heap::{PointId, Slot};

/// Offers `(weight, index, is_new)` to a full row.
///
/// The offer is rejected (returns 0, row untouched) when `weight` is not
/// strictly below the current root, when `weight` is NaN, or when `index` is
/// already present. Otherwise the root is overwritten and sifted down, and 1
/// is returned.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub(crate) fn push(row: &mut [Slot], weight: f32, index: PointId, is_new: bool) -> usize {
    // also rejects NaN, which compares false against everything
    if !(weight < row[0].weight) {
        return 0;
    }

    if row.iter().any(|slot| slot.index == Some(index)) {
        return 0;
    }

    // the root is the evicted maximum: open a hole there and move larger
    // children up until the new entry fits
    let len = row.len();
    let mut hole = 0;
    loop {
        let left = 2 * hole + 1;
        let right = left + 1;

        let child = if left >= len {
            break;
        } else if right >= len || row[left].weight >= row[right].weight {
            left
        } else {
            right
        };

        if weight < row[child].weight {
            row[hole] = row[child];
            hole = child;
        } else {
            break;
        }
    }

    row[hole] = Slot::new(index, weight, is_new);
    1
}

/// Restores the max-heap order of `row[..end]` after its root was replaced.
fn sift_down(row: &mut [Slot], end: usize) {
    let mut root = 0;
    loop {
        let left = 2 * root + 1;
        if left >= end {
            break;
        }
        let right = left + 1;

        let mut swap = root;
        if row[swap].weight < row[left].weight {
            swap = left;
        }
        if right < end && row[swap].weight < row[right].weight {
            swap = right;
        }

        if swap == root {
            break;
        }
        row.swap(root, swap);
        root = swap;
    }
}

/// Second phase of heap sort: leaves `row` ordered by ascending weight, empty
/// slots (infinite weight) last.
pub(crate) fn sort(row: &mut [Slot]) {
    for end in (1..row.len()).rev() {
        row.swap(0, end);
        sift_down(row, end);
    }
}

/// Finds the flagged slot with the smallest weight, clears its flag and
/// returns its index. The first such slot wins ties.
pub(crate) fn take_smallest_flagged(row: &mut [Slot]) -> Option<PointId> {
    let mut best: Option<usize> = None;
    for (position, slot) in row.iter().enumerate() {
        if !slot.is_new {
            continue;
        }
        match best {
            Some(b) if row[b].weight <= slot.weight => {}
            _ => best = Some(position),
        }
    }

    let position = best?;
    row[position].is_new = false;
    row[position].index
}

/// Position of the first slot breaking the max-heap order, if any. A NaN
/// weight on either side of a parent/child pair counts as a violation.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub(crate) fn heap_violation(row: &[Slot]) -> Option<usize> {
    (1..row.len()).find(|&child| !(row[(child - 1) / 2].weight >= row[child].weight))
}

/// Identifier of a point in the dataset, i.e. a row of a [`super::NeighborHeap`].
pub type PointId = usize;

/// One entry of a heap row: a candidate neighbor, its priority and whether it
/// still has to be explored.
///
/// An empty slot has no index, an infinite weight and is never flagged, so it
/// always sits above every populated slot in a max-heap ordered by weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub(crate) index: Option<PointId>,
    pub(crate) weight: f32,
    pub(crate) is_new: bool,
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        index: None,
        weight: f32::INFINITY,
        is_new: false,
    };

    pub(crate) fn new(index: PointId, weight: f32, is_new: bool) -> Self {
        Slot {
            index: Some(index),
            weight,
            is_new,
        }
    }

    pub fn index(&self) -> Option<PointId> {
        self.index
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }

    /// The index in the flat `-1`-sentinel convention.
    pub fn raw_index(&self) -> i64 {
        self.index.map_or(-1, |i| i as i64)
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::EMPTY
    }
}

use std::collections::HashMap;

use ordered_float::OrderedFloat;

/// A dense, monotonically increasing id assigned at insertion time.
///
/// Ids are contiguous `[0, datasize)` (invariant I5); nothing ever reuses
/// or renumbers one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u64);

impl PointId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single floating-point vector of fixed dimension.
pub type Point = Vec<f32>;

/// Adjacency of one point on one layer: neighbor id to cached distance.
///
/// The cached distance equals `dist(point[self], point[neighbor])` as of
/// the last update; small drift from later recomputation is tolerated but
/// the cached value is authoritative for ordering within the algorithm.
pub type LayerNode = HashMap<PointId, f32>;

/// A `(distance, id)` pair, ordered strictly by distance with id as a
/// stable tiebreaker — the ordering every priority queue in this crate
/// relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub distance: OrderedFloat<f32>,
    pub id: PointId,
}

impl Candidate {
    pub fn new(distance: f32, id: PointId) -> Self {
        Candidate {
            distance: OrderedFloat(distance),
            id,
        }
    }
}

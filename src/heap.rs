//! The two bounded priority-queue views over `(distance, id)` candidates
//! used by `search_layer`: a min-heap of unexplored candidates and a
//! max-heap (bounded to `ef`) of the best results found so far.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::types::Candidate;

/// Candidates still to explore, closest first.
#[derive(Default)]
pub(crate) struct MinCandidates {
    heap: BinaryHeap<Reverse<Candidate>>,
}

impl MinCandidates {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, candidate: Candidate) {
        self.heap.push(Reverse(candidate));
    }

    pub(crate) fn pop_smallest(&mut self) -> Option<Candidate> {
        self.heap.pop().map(|Reverse(c)| c)
    }
}

/// The best `ef` results found so far. `push` silently drops anything that
/// wouldn't make the cut once the queue is full.
pub(crate) struct MaxResults {
    heap: BinaryHeap<Candidate>,
    ef: usize,
}

impl MaxResults {
    pub(crate) fn new(ef: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(ef.max(1)),
            ef,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn peek_largest(&self) -> Option<Candidate> {
        self.heap.peek().copied()
    }

    /// Push a new candidate, evicting the current farthest result if the
    /// queue is already at capacity.
    pub(crate) fn push(&mut self, candidate: Candidate) {
        if self.heap.len() < self.ef {
            self.heap.push(candidate);
            return;
        }

        if let Some(farthest) = self.heap.peek().copied() {
            if candidate < farthest {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    /// Drain into a `Vec` sorted nearest-first.
    pub(crate) fn into_sorted_ascending(self) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = self.heap.into_vec();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_candidates_pops_smallest_first() {
        let mut q = MinCandidates::new();
        q.push(Candidate::new(3.0, crate::types::PointId(0)));
        q.push(Candidate::new(1.0, crate::types::PointId(1)));
        q.push(Candidate::new(2.0, crate::types::PointId(2)));
        assert_eq!(q.pop_smallest().unwrap().distance.into_inner(), 1.0);
        assert_eq!(q.pop_smallest().unwrap().distance.into_inner(), 2.0);
        assert_eq!(q.pop_smallest().unwrap().distance.into_inner(), 3.0);
        assert!(q.pop_smallest().is_none());
    }

    #[test]
    fn max_results_evicts_farthest_past_capacity() {
        let mut r = MaxResults::new(2);
        r.push(Candidate::new(5.0, crate::types::PointId(0)));
        r.push(Candidate::new(1.0, crate::types::PointId(1)));
        r.push(Candidate::new(3.0, crate::types::PointId(2)));
        assert_eq!(r.len(), 2);
        let sorted = r.into_sorted_ascending();
        assert_eq!(
            sorted.iter().map(|c| c.distance.into_inner()).collect::<Vec<_>>(),
            vec![1.0, 3.0]
        );
    }

    #[test]
    fn max_results_ties_break_on_id() {
        let mut r = MaxResults::new(1);
        r.push(Candidate::new(1.0, crate::types::PointId(5)));
        r.push(Candidate::new(1.0, crate::types::PointId(1)));
        let sorted = r.into_sorted_ascending();
        assert_eq!(sorted[0].id, crate::types::PointId(1));
    }
}

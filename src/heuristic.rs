//! `select_neighbors`: the diversity heuristic from the HNSW paper's
//! Algorithm 4. Candidates are taken nearest-first, but a candidate is
//! only kept if it is not closer to an already-kept neighbor than it is
//! to the point being connected — this bridges otherwise-separate
//! clusters instead of just keeping the `m` closest points.

use crate::error::Result;
use crate::storage::Storage;
use crate::types::{Candidate, Point};
use crate::vector::Distance;

/// Reduce `candidates` (assumed sorted nearest-first) to at most `m`
/// neighbors for `point`, applying the diversity rule.
///
/// Candidate points are fetched in one batch up front rather than
/// refetched per comparison.
pub(crate) async fn select_neighbors<M, S: Storage<M>>(
    storage: &S,
    distance: Distance,
    point: &Point,
    candidates: &[Candidate],
    m: usize,
) -> Result<Vec<Candidate>> {
    if candidates.len() <= m {
        return Ok(candidates.to_vec());
    }

    let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
    let points = storage.get_points(&ids).await?;

    let mut selected: Vec<Candidate> = Vec::with_capacity(m);
    let mut selected_points: Vec<&Point> = Vec::with_capacity(m);

    for (candidate, candidate_point) in candidates.iter().zip(&points) {
        if selected.len() >= m {
            break;
        }

        let closer_to_a_neighbor = selected_points
            .iter()
            .any(|&kept| distance.compute(candidate_point, kept) < candidate.distance.into_inner());

        if !closer_to_a_neighbor {
            selected.push(*candidate);
            selected_points.push(candidate_point);
        }
    }

    // The diversity rule can legitimately leave fewer than `m` neighbors;
    // no fallback tops the set back up with non-diverse leftovers.
    let _ = point;
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::PointId;

    #[tokio::test]
    async fn keeps_all_candidates_under_the_cap() {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        let a = storage.new_point(vec![0.0]).await.unwrap();
        let b = storage.new_point(vec![1.0]).await.unwrap();
        let candidates = vec![Candidate::new(0.0, a), Candidate::new(1.0, b)];
        let selected = select_neighbors(&storage, Distance::Euclidean, &vec![0.0], &candidates, 5)
            .await
            .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn prunes_down_to_the_cap() {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        let mut candidates = Vec::new();
        for i in 0..5 {
            let id = storage.new_point(vec![i as f32]).await.unwrap();
            candidates.push(Candidate::new(i as f32, id));
        }
        let selected =
            select_neighbors(&storage, Distance::Euclidean, &vec![0.0], &candidates, 2)
                .await
                .unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].id, PointId(0));
    }
}

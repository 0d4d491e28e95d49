//! `search_layer`: greedy best-first traversal of a single HNSW layer,
//! expanding through cached neighbor edges until no unvisited candidate
//! could possibly improve on the current result set.

use std::collections::HashSet;

use crate::error::Result;
use crate::heap::{MaxResults, MinCandidates};
use crate::storage::Storage;
use crate::types::{Candidate, Point, PointId};
use crate::vector::Distance;

/// Explore `layer` starting from `entry_points`, returning up to `ef`
/// results ordered nearest-first.
///
/// Neighbor fetches for an entire expansion round are batched into a
/// single [`Storage::get_points`] call rather than issued one at a time,
/// since a remote backend would otherwise pay one round trip per edge.
pub(crate) async fn search_layer<M, S: Storage<M>>(
    storage: &S,
    distance: Distance,
    query: &Point,
    entry_points: &[PointId],
    ef: usize,
    layer: usize,
) -> Result<Vec<Candidate>> {
    let mut visited: HashSet<PointId> = entry_points.iter().copied().collect();
    let mut candidates = MinCandidates::new();
    let mut results = MaxResults::new(ef.max(1));

    let seeds = storage.get_points(entry_points).await?;
    for (&id, point) in entry_points.iter().zip(&seeds) {
        let c = Candidate::new(distance.compute(query, point), id);
        candidates.push(c);
        results.push(c);
    }

    while let Some(nearest) = candidates.pop_smallest() {
        if let Some(farthest) = results.peek_largest() {
            if results.len() >= ef && nearest.distance > farthest.distance {
                break;
            }
        }

        let neighbors = storage.get_neighbors(layer, nearest.id).await?;
        let unvisited: Vec<PointId> = neighbors
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| visited.insert(*id))
            .collect();
        if unvisited.is_empty() {
            continue;
        }

        let points = storage.get_points(&unvisited).await?;
        for (id, point) in unvisited.into_iter().zip(points) {
            let c = Candidate::new(distance.compute(query, &point), id);
            let farthest = results.peek_largest();
            let room = results.len() < ef;
            if room || farthest.map_or(true, |f| c.distance < f.distance) {
                candidates.push(c);
                results.push(c);
            }
        }
    }

    Ok(results.into_sorted_ascending())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    async fn build_line_graph(n: usize) -> MemoryStorage<()> {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        let mut ids = Vec::new();
        for i in 0..n {
            ids.push(storage.new_point(vec![i as f32]).await.unwrap());
        }
        for (i, &id) in ids.iter().enumerate() {
            let mut neighbors = Vec::new();
            if i > 0 {
                neighbors.push((ids[i - 1], 1.0));
            }
            if i + 1 < n {
                neighbors.push((ids[i + 1], 1.0));
            }
            storage.upsert_neighbors(0, id, neighbors).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn finds_the_nearest_point_on_a_line() {
        let storage = build_line_graph(10).await;
        let query = vec![7.2];
        let results = search_layer(&storage, Distance::Euclidean, &query, &[PointId(0)], 3, 0)
            .await
            .unwrap();
        assert_eq!(results[0].id, PointId(7));
    }

    #[tokio::test]
    async fn respects_ef_bound() {
        let storage = build_line_graph(20).await;
        let query = vec![10.0];
        let results = search_layer(&storage, Distance::Euclidean, &query, &[PointId(0)], 5, 0)
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
    }
}

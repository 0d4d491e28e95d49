//! The incremental HNSW index: insertion and k-nearest-neighbor search over
//! a pluggable [`Storage`] backend.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::heuristic::select_neighbors;
use crate::search::search_layer;
use crate::storage::Storage;
use crate::types::{Candidate, Point, PointId};

/// One result from [`Index::knn_search`]: the point's id and its distance
/// from the query, nearest first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnnResult {
    pub id: PointId,
    pub distance: f32,
}

/// An incremental HNSW index over storage backend `S` holding metadata of
/// type `M` alongside each point.
///
/// `Index` itself holds no points or graph state — all of that lives in
/// `S` — only the tuning parameters and the level-assignment RNG.
pub struct Index<M, S: Storage<M>> {
    storage: S,
    config: Config,
    rng: RefCell<SmallRng>,
    dimension: RefCell<Option<usize>>,
    _metadata: std::marker::PhantomData<M>,
}

impl<M, S: Storage<M>> Index<M, S> {
    pub fn new(storage: S, config: Config) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Index {
            storage,
            config,
            rng: RefCell::new(rng),
            dimension: RefCell::new(None),
            _metadata: std::marker::PhantomData,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn draw_level(&self) -> usize {
        let uniform: f32 = self.rng.borrow_mut().gen();
        let uniform = uniform.max(f32::MIN_POSITIVE);
        (-uniform.ln() * self.config.m_l).floor() as usize
    }

    fn check_dimension(&self, point: &Point) -> Result<()> {
        let mut dimension = self.dimension.borrow_mut();
        match *dimension {
            Some(expected) if expected != point.len() => Err(Error::DimensionMismatch {
                expected,
                actual: point.len(),
            }),
            Some(_) => Ok(()),
            None => {
                *dimension = Some(point.len());
                Ok(())
            }
        }
    }

    /// Insert `point`, optionally with associated `metadata`, returning the
    /// id it was assigned.
    #[instrument(skip(self, point, metadata), fields(dim = point.len()))]
    pub async fn insert(&self, point: Point, metadata: Option<M>) -> Result<PointId> {
        self.check_dimension(&point)?;

        let level = self.draw_level();
        let id = self.storage.new_point(point.clone()).await?;
        if let Some(metadata) = metadata {
            self.storage.set_metadata(id, metadata).await?;
        }

        let ep = self.storage.get_ep().await?;
        let num_layers = self.storage.get_num_layers().await?;

        let Some(mut entry) = ep else {
            self.storage.set_ep(id).await?;
            self.storage.seed_layers(level).await?;
            tracing::debug!(point_id = id.0, level, "seeded first point");
            return Ok(id);
        };

        // Descend greedily from the top layer down to `level + 1`, using a
        // single-candidate beam just to relocate the entry point — no
        // links are created on layers above the new point's own level.
        for layer in (level + 1..num_layers).rev() {
            let nearest = search_layer(&self.storage, self.config.distance, &point, &[entry], 1, layer)
                .await?;
            if let Some(best) = nearest.first() {
                entry = best.id;
            }
        }

        let mut entry_points = vec![entry];
        for layer in (0..=level.min(num_layers.saturating_sub(1))).rev() {
            let candidates = search_layer(
                &self.storage,
                self.config.distance,
                &point,
                &entry_points,
                self.config.ef_construction,
                layer,
            )
            .await?;

            let cap = if layer == 0 {
                self.config.m_max0
            } else {
                self.config.m_max
            };
            let chosen = select_neighbors(&self.storage, self.config.distance, &point, &candidates, cap)
                .await?;

            self.storage
                .upsert_neighbors(
                    layer,
                    id,
                    chosen.iter().map(|c| (c.id, c.distance.into_inner())).collect(),
                )
                .await?;

            self.link_backward(layer, id, &chosen, cap).await?;

            entry_points = chosen.into_iter().map(|c| c.id).collect();
            if entry_points.is_empty() {
                entry_points = vec![entry];
            }
        }

        if level + 1 > num_layers {
            self.storage.set_ep(id).await?;
        }
        self.storage.seed_layers(level).await?;

        tracing::debug!(point_id = id.0, level, "inserted point");
        Ok(id)
    }

    /// Add `id` to the adjacency of every point in `chosen` on `layer`,
    /// re-running the diversity heuristic on any of them pushed over `cap`.
    ///
    /// When pruning drops an edge `n ↔ z`, `z` is also updated to drop `n`
    /// so neither side is left pointing at a neighbor that no longer
    /// points back (invariant I1). All reads and the final write are
    /// batched rather than issued per neighbor.
    async fn link_backward(
        &self,
        layer: usize,
        id: PointId,
        chosen: &[Candidate],
        cap: usize,
    ) -> Result<()> {
        if chosen.is_empty() {
            return Ok(());
        }

        let neighbor_ids: Vec<PointId> = chosen.iter().map(|c| c.id).collect();
        let neighbor_lists = self.storage.get_neighbors_batch(layer, &neighbor_ids).await?;
        let neighbor_points = self.storage.get_points(&neighbor_ids).await?;

        let mut updates: HashMap<PointId, Vec<(PointId, f32)>> = HashMap::new();
        let mut removals: HashMap<PointId, Vec<PointId>> = HashMap::new();

        for (i, &n) in neighbor_ids.iter().enumerate() {
            let mut edges = neighbor_lists[i].clone();
            edges.push((id, chosen[i].distance.into_inner()));

            if edges.len() > cap {
                let candidates: Vec<Candidate> = edges
                    .iter()
                    .map(|&(other, d)| Candidate::new(d, other))
                    .collect();
                let mut sorted = candidates;
                sorted.sort_unstable();
                let pruned = select_neighbors(
                    &self.storage,
                    self.config.distance,
                    &neighbor_points[i],
                    &sorted,
                    cap,
                )
                .await?;

                let kept: HashSet<PointId> = pruned.iter().map(|c| c.id).collect();
                for &(other, _) in &edges {
                    if !kept.contains(&other) {
                        removals.entry(other).or_default().push(n);
                    }
                }
                edges = pruned.into_iter().map(|c| (c.id, c.distance.into_inner())).collect();
            }

            updates.insert(n, edges);
        }

        if !removals.is_empty() {
            let uncached: Vec<PointId> = removals
                .keys()
                .copied()
                .filter(|z| !updates.contains_key(z))
                .collect();
            if !uncached.is_empty() {
                let fetched = self.storage.get_neighbors_batch(layer, &uncached).await?;
                for (z, edges) in uncached.into_iter().zip(fetched) {
                    updates.insert(z, edges);
                }
            }

            for (z, dropped) in &removals {
                if let Some(edges) = updates.get_mut(z) {
                    edges.retain(|(other, _)| !dropped.contains(other));
                }
            }
        }

        self.storage
            .upsert_neighbors_batch(layer, updates.into_iter().collect())
            .await
    }

    /// Return the `k` nearest neighbors of `query`, nearest first.
    #[instrument(skip(self, query), fields(dim = query.len(), k))]
    pub async fn knn_search(&self, query: &Point, k: usize) -> Result<Vec<KnnResult>> {
        self.check_dimension(query)?;

        let Some(mut entry) = self.storage.get_ep().await? else {
            return Ok(Vec::new());
        };
        let num_layers = self.storage.get_num_layers().await?;

        for layer in (1..num_layers).rev() {
            let nearest = search_layer(&self.storage, self.config.distance, query, &[entry], 1, layer)
                .await?;
            if let Some(best) = nearest.first() {
                entry = best.id;
            }
        }

        let ef = self.config.ef_search.max(k);
        let mut results = search_layer(&self.storage, self.config.distance, query, &[entry], ef, 0).await?;
        results.truncate(k);

        Ok(results
            .into_iter()
            .map(|c| KnnResult {
                id: c.id,
                distance: c.distance.into_inner(),
            })
            .collect())
    }

    pub async fn get_vector(&self, id: PointId) -> Result<Point> {
        self.storage.get_point(id).await
    }

    pub async fn get_metadata(&self, id: PointId) -> Result<Option<M>> {
        self.storage.get_metadata(id).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.storage.get_datasize().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Results with their resolved metadata attached, the usual shape a caller
/// actually wants back from a search.
pub async fn knn_search_with_metadata<M: Clone, S: Storage<M>>(
    index: &Index<M, S>,
    query: &Point,
    k: usize,
) -> Result<Vec<(KnnResult, Option<M>)>> {
    let results = index.knn_search(query, k).await?;
    let ids: Vec<PointId> = results.iter().map(|r| r.id).collect();
    let metadatas = index.storage.get_metadatas(&ids).await?;
    Ok(results.into_iter().zip(metadatas).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn test_config() -> Config {
        Config::builder().m(8).ef_construction(32).seed(7).build().unwrap()
    }

    #[tokio::test]
    async fn inserting_into_an_empty_index_sets_the_entry_point() {
        let index: Index<(), MemoryStorage<()>> = Index::new(MemoryStorage::new(), test_config());
        let id = index.insert(vec![1.0, 2.0], None).await.unwrap();
        assert_eq!(index.storage.get_ep().await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn metadata_is_only_stored_when_supplied() {
        let index: Index<&str, MemoryStorage<&str>> = Index::new(MemoryStorage::new(), test_config());
        let with_meta = index.insert(vec![0.0, 0.0], Some("tagged")).await.unwrap();
        let without_meta = index.insert(vec![1.0, 1.0], None).await.unwrap();
        assert_eq!(index.get_metadata(with_meta).await.unwrap(), Some("tagged"));
        assert_eq!(index.get_metadata(without_meta).await.unwrap(), None);
    }

    #[tokio::test]
    async fn search_on_empty_index_returns_no_results() {
        let index: Index<(), MemoryStorage<()>> = Index::new(MemoryStorage::new(), test_config());
        let results = index.knn_search(&vec![0.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index: Index<(), MemoryStorage<()>> = Index::new(MemoryStorage::new(), test_config());
        index.insert(vec![1.0, 2.0], None).await.unwrap();
        let err = index.insert(vec![1.0, 2.0, 3.0], None).await.unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn finds_the_exact_match_among_a_small_cluster() {
        let index: Index<usize, MemoryStorage<usize>> =
            Index::new(MemoryStorage::new(), test_config());
        let mut ids = HashMap::new();
        for i in 0..50 {
            let angle = i as f32 * 0.37;
            let point = vec![angle.cos(), angle.sin()];
            let id = index.insert(point, Some(i)).await.unwrap();
            ids.insert(id, i);
        }

        let query_angle = 10.0 * 0.37;
        let query = vec![query_angle.cos(), query_angle.sin()];
        let results = index.knn_search(&query, 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].distance, 0.0);
    }

    #[tokio::test]
    async fn knn_search_respects_k() {
        let index: Index<(), MemoryStorage<()>> = Index::new(MemoryStorage::new(), test_config());
        for i in 0..30 {
            index.insert(vec![i as f32, 0.0], None).await.unwrap();
        }
        let results = index.knn_search(&vec![0.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }
}

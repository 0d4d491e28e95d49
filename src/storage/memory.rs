use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::Storage;
use crate::error::{Error, Result};
use crate::types::{Point, PointId};

#[derive(Default)]
struct State<M> {
    points: Vec<Point>,
    /// Per-point, per-layer adjacency. A point with no entry for a layer
    /// simply has no neighbors recorded there yet, which is not an error;
    /// a point with no entry in the outer `Vec` at all does not exist.
    neighbors: Vec<HashMap<usize, HashMap<PointId, f32>>>,
    metadata: HashMap<PointId, M>,
    ep: Option<PointId>,
    num_layers: usize,
}

/// The reference [`Storage`] implementation: everything lives behind one
/// `RwLock` in process memory. Good for tests, demos, and anything small
/// enough to fit in RAM; there is no persistence across process restarts.
#[derive(Default)]
pub struct MemoryStorage<M> {
    state: RwLock<State<M>>,
}

impl<M> MemoryStorage<M> {
    pub fn new() -> Self {
        MemoryStorage {
            state: RwLock::new(State {
                points: Vec::new(),
                neighbors: Vec::new(),
                metadata: HashMap::new(),
                ep: None,
                num_layers: 0,
            }),
        }
    }
}

#[async_trait(?Send)]
impl<M: Clone> Storage<M> for MemoryStorage<M> {
    async fn get_ep(&self) -> Result<Option<PointId>> {
        Ok(self.state.read().ep)
    }

    async fn set_ep(&self, id: PointId) -> Result<()> {
        self.state.write().ep = Some(id);
        Ok(())
    }

    async fn get_num_layers(&self) -> Result<usize> {
        Ok(self.state.read().num_layers)
    }

    async fn get_datasize(&self) -> Result<usize> {
        Ok(self.state.read().points.len())
    }

    async fn get_point(&self, id: PointId) -> Result<Point> {
        self.state
            .read()
            .points
            .get(id.index())
            .cloned()
            .ok_or_else(|| Error::missing_point(id))
    }

    async fn get_points(&self, ids: &[PointId]) -> Result<Vec<Point>> {
        let state = self.state.read();
        ids.iter()
            .map(|&id| {
                state
                    .points
                    .get(id.index())
                    .cloned()
                    .ok_or_else(|| Error::missing_point(id))
            })
            .collect()
    }

    async fn new_point(&self, point: Point) -> Result<PointId> {
        let mut state = self.state.write();
        let id = PointId(state.points.len() as u64);
        state.points.push(point);
        state.neighbors.push(HashMap::new());
        Ok(id)
    }

    async fn get_neighbors(&self, layer: usize, id: PointId) -> Result<Vec<(PointId, f32)>> {
        let state = self.state.read();
        let slot = layer_slot(&state.neighbors, id)?;
        Ok(slot
            .get(&layer)
            .map(|m| m.iter().map(|(&id, &d)| (id, d)).collect())
            .unwrap_or_default())
    }

    async fn get_neighbors_batch(
        &self,
        layer: usize,
        ids: &[PointId],
    ) -> Result<Vec<Vec<(PointId, f32)>>> {
        let state = self.state.read();
        ids.iter()
            .map(|&id| {
                let slot = layer_slot(&state.neighbors, id)?;
                Ok(slot
                    .get(&layer)
                    .map(|m| m.iter().map(|(&id, &d)| (id, d)).collect())
                    .unwrap_or_default())
            })
            .collect()
    }

    async fn upsert_neighbors(
        &self,
        layer: usize,
        id: PointId,
        neighbors: Vec<(PointId, f32)>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let entry = state
            .neighbors
            .get_mut(id.index())
            .ok_or_else(|| Error::missing_point(id))?;
        entry.insert(layer, neighbors.into_iter().collect());
        Ok(())
    }

    async fn upsert_neighbors_batch(
        &self,
        layer: usize,
        updates: Vec<(PointId, Vec<(PointId, f32)>)>,
    ) -> Result<()> {
        for (id, neighbors) in updates {
            self.upsert_neighbors(layer, id, neighbors).await?;
        }
        Ok(())
    }

    async fn seed_layers(&self, top_layer: usize) -> Result<()> {
        let mut state = self.state.write();
        state.num_layers = state.num_layers.max(top_layer + 1);
        Ok(())
    }

    async fn get_metadata(&self, id: PointId) -> Result<Option<M>> {
        Ok(self.state.read().metadata.get(&id).cloned())
    }

    async fn get_metadatas(&self, ids: &[PointId]) -> Result<Vec<Option<M>>> {
        let state = self.state.read();
        Ok(ids.iter().map(|id| state.metadata.get(id).cloned()).collect())
    }

    async fn set_metadata(&self, id: PointId, metadata: M) -> Result<()> {
        self.state.write().metadata.insert(id, metadata);
        Ok(())
    }
}

fn layer_slot(
    neighbors: &[HashMap<usize, HashMap<PointId, f32>>],
    id: PointId,
) -> Result<&HashMap<usize, HashMap<PointId, f32>>> {
    neighbors.get(id.index()).ok_or_else(|| Error::missing_point(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_point_assigns_dense_ids() {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        let a = storage.new_point(vec![1.0, 2.0]).await.unwrap();
        let b = storage.new_point(vec![3.0, 4.0]).await.unwrap();
        assert_eq!(a, PointId(0));
        assert_eq!(b, PointId(1));
        assert_eq!(storage.get_datasize().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upsert_neighbors_replaces_the_whole_set() {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        let a = storage.new_point(vec![0.0]).await.unwrap();
        let b = storage.new_point(vec![1.0]).await.unwrap();
        storage
            .upsert_neighbors(0, a, vec![(b, 1.0)])
            .await
            .unwrap();
        assert_eq!(storage.get_neighbors(0, a).await.unwrap(), vec![(b, 1.0)]);

        storage.upsert_neighbors(0, a, vec![]).await.unwrap();
        assert!(storage.get_neighbors(0, a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_layers_only_grows() {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        storage.seed_layers(2).await.unwrap();
        storage.seed_layers(0).await.unwrap();
        assert_eq!(storage.get_num_layers().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn metadata_roundtrips() {
        let storage: MemoryStorage<&'static str> = MemoryStorage::new();
        let a = storage.new_point(vec![0.0]).await.unwrap();
        assert_eq!(storage.get_metadata(a).await.unwrap(), None);
        storage.set_metadata(a, "hello").await.unwrap();
        assert_eq!(storage.get_metadata(a).await.unwrap(), Some("hello"));
    }

    #[tokio::test]
    async fn missing_point_is_an_error_not_a_panic() {
        let storage: MemoryStorage<()> = MemoryStorage::new();
        assert!(storage.get_point(PointId(0)).await.is_err());
    }
}

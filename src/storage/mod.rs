//! The persistence seam the algorithm core runs against. Everything above
//! this trait is pure graph logic; everything below it is someone else's
//! problem — an in-memory map, a remote key-value store, whatever.

mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Point, PointId};

/// Storage for one HNSW index's points, graph, and caller-supplied metadata.
///
/// Implementors only need to guarantee read-your-writes consistency for a
/// single caller; the core never issues concurrent writes to the same
/// index and never retries a failed call. `M` is the metadata type the
/// index was built with.
///
/// `?Send` because the core runs cooperatively on a single executor thread
/// and never moves a call across threads; implementations are free to be
/// `Send` anyway, they're just not required to be.
#[async_trait(?Send)]
pub trait Storage<M> {
    /// The current entry point, if the index has any points.
    async fn get_ep(&self) -> Result<Option<PointId>>;

    /// Replace the entry point.
    async fn set_ep(&self, id: PointId) -> Result<()>;

    /// How many layers exist, counting layer 0. Zero on an empty index.
    async fn get_num_layers(&self) -> Result<usize>;

    /// How many points have ever been inserted.
    async fn get_datasize(&self) -> Result<usize>;

    async fn get_point(&self, id: PointId) -> Result<Point>;

    /// Batched form of [`Storage::get_point`]; implementations should
    /// prefer this when fetching more than one point.
    async fn get_points(&self, ids: &[PointId]) -> Result<Vec<Point>>;

    /// Store a brand new point's vector and return the id assigned to it.
    /// Ids are dense and increasing: the first call returns `PointId(0)`.
    async fn new_point(&self, point: Point) -> Result<PointId>;

    /// The cached `(neighbor, distance)` pairs for `id` on `layer`, or an
    /// empty vec if `id` has no neighbors there yet.
    async fn get_neighbors(&self, layer: usize, id: PointId) -> Result<Vec<(PointId, f32)>>;

    /// Batched form of [`Storage::get_neighbors`] across several ids on the
    /// same layer.
    async fn get_neighbors_batch(
        &self,
        layer: usize,
        ids: &[PointId],
    ) -> Result<Vec<Vec<(PointId, f32)>>>;

    /// Replace `id`'s full neighbor list on `layer`.
    async fn upsert_neighbors(
        &self,
        layer: usize,
        id: PointId,
        neighbors: Vec<(PointId, f32)>,
    ) -> Result<()>;

    /// Batched form of [`Storage::upsert_neighbors`]: replace several
    /// points' neighbor lists on the same layer in one round trip.
    async fn upsert_neighbors_batch(
        &self,
        layer: usize,
        updates: Vec<(PointId, Vec<(PointId, f32)>)>,
    ) -> Result<()>;

    /// Ensure enough layers exist to hold a point inserted up to
    /// `top_layer` (inclusive), i.e. `num_layers = max(num_layers,
    /// top_layer + 1)`. Idempotent; called at most once per insert.
    async fn seed_layers(&self, top_layer: usize) -> Result<()>;

    /// `None` if `id` exists but was never given metadata.
    async fn get_metadata(&self, id: PointId) -> Result<Option<M>>;

    async fn get_metadatas(&self, ids: &[PointId]) -> Result<Vec<Option<M>>>;

    async fn set_metadata(&self, id: PointId, metadata: M) -> Result<()>;
}

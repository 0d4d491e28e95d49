//! Incremental HNSW (Hierarchical Navigable Small World) approximate
//! nearest neighbor index.
//!
//! Points are inserted one at a time into a layered proximity graph;
//! `knn_search` descends the layers greedily to find a good entry point,
//! then does a bounded best-first search of layer 0. All graph state lives
//! behind a [`Storage`] implementation — [`MemoryStorage`] for everything
//! in-process, or a custom backend for anything that needs to live
//! elsewhere.
//!
//! ```no_run
//! # use hnsw_index::{Config, Index, MemoryStorage};
//! # async fn run() -> hnsw_index::Result<()> {
//! let index: Index<&str, MemoryStorage<&str>> =
//!     Index::new(MemoryStorage::new(), Config::builder().build()?);
//!
//! let id = index.insert(vec![0.1, 0.2, 0.3], Some("first point")).await?;
//! let hits = index.knn_search(&vec![0.1, 0.2, 0.3], 5).await?;
//! assert_eq!(hits[0].id, id);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod heap;
mod heuristic;
mod index;
mod search;
mod storage;
mod types;
mod vector;

pub use config::{Builder, Config};
pub use error::{Error, Result};
pub use index::{knn_search_with_metadata, Index, KnnResult};
pub use storage::{MemoryStorage, Storage};
pub use types::{Point, PointId};
pub use vector::Distance;

use crate::types::PointId;

/// Errors surfaced by the core. Per the propagation policy, the core never
/// retries or recovers from these; they bubble straight to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The storage backend failed or was unreachable. Never retried here.
    #[error("storage backend unavailable: {0}")]
    StorageUnavailable(String),

    /// An id, layer, or neighbor record that the algorithm expected to
    /// exist was missing. Indicates an invariant violation or a concurrent
    /// writer stepping on this one.
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// `dist()` was called on two points of unequal length.
    #[error("dimension mismatch: index uses dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Rejected at `Index` construction time.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn missing_point(id: PointId) -> Self {
        Error::MissingRecord(format!("point {id:?}"))
    }

    pub(crate) fn missing_neighbor(layer: usize, id: PointId) -> Self {
        Error::MissingRecord(format!("neighbor record for {id:?} at layer {layer}"))
    }

    pub(crate) fn missing_entry_point() -> Self {
        Error::MissingRecord("entry point on a populated index".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

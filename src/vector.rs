//! Pure vector math. Every function here assumes equal-length operands;
//! dimension checking happens one layer up, in `Index`.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// `1 - (a·b)/(‖a‖‖b‖)`, ranges `[0, 2]`. Zero-norm input is a caller error;
/// this may return a non-finite value rather than guard against it.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot(a, b) / (norm(a) * norm(b))
}

pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Negative dot product, so that "closer" still means "smaller" as every
/// other distance in this crate expects.
pub fn inner_product_distance(a: &[f32], b: &[f32]) -> f32 {
    -dot(a, b)
}

/// The distance function an index is built with. Resolved once at
/// `Config` construction and never mixed within one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub enum Distance {
    #[default]
    Cosine,
    Euclidean,
    InnerProduct,
}

impl Distance {
    pub fn compute(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Distance::Cosine => cosine_distance(a, b),
            Distance::Euclidean => l2_distance(a, b),
            Distance::InnerProduct => inner_product_distance(a, b),
        }
    }
}

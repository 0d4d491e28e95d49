use crate::error::{Error, Result};
use crate::vector::Distance;

/// Default `M`: the number of bidirectional links created per point on
/// every layer above layer 0.
pub const DEFAULT_M: usize = 16;

/// Resolved, validated parameters for an `Index`. Build one with
/// [`Builder`]; there is no public way to construct a `Config` directly,
/// so an `Index` can never be handed an invalid one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub(crate) m: usize,
    pub(crate) m_max: usize,
    pub(crate) m_max0: usize,
    pub(crate) ef_construction: usize,
    pub(crate) ef_search: usize,
    pub(crate) m_l: f32,
    pub(crate) seed: u64,
    pub(crate) distance: Distance,
}

impl Config {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn ef_search(&self) -> usize {
        self.ef_search
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }
}

/// Fluent construction of a [`Config`], mirroring the parameter names from
/// the original HNSW paper.
pub struct Builder {
    m: usize,
    m_max0: Option<usize>,
    ef_construction: usize,
    ef_search: Option<usize>,
    m_l: Option<f32>,
    seed: Option<u64>,
    distance: Distance,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            m: DEFAULT_M,
            m_max0: None,
            ef_construction: 200,
            ef_search: None,
            m_l: None,
            seed: None,
            distance: Distance::default(),
        }
    }
}

impl Builder {
    /// Set `M`, the per-layer link count above layer 0.
    ///
    /// If `m_max0` is not set separately, it defaults to `2 * m`.
    pub fn m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    /// Set `M_max0`, the link count on layer 0.
    ///
    /// Defaults to `2 * m` if left unset.
    pub fn m_max0(mut self, m_max0: usize) -> Self {
        self.m_max0 = Some(m_max0);
        self
    }

    /// Set `efConstruction`, the candidate list size used while inserting.
    pub fn ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    /// Set `ef`, the candidate list size used while searching.
    ///
    /// Defaults to `ef_construction` if left unset.
    pub fn ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = Some(ef_search);
        self
    }

    /// Set `mL`, the level-generation normalization factor.
    ///
    /// Defaults to `1 / ln(m)` if left unset.
    pub fn m_l(mut self, m_l: f32) -> Self {
        self.m_l = Some(m_l);
        self
    }

    /// Seed the level-assignment RNG for reproducible structure.
    ///
    /// If left unset, a seed is drawn from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.m <= 1 {
            return Err(Error::InvalidConfig("m must be greater than 1".to_string()));
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidConfig(
                "ef_construction must be at least 1".to_string(),
            ));
        }
        if let Some(0) = self.ef_search {
            return Err(Error::InvalidConfig(
                "ef_search must be at least 1".to_string(),
            ));
        }

        let m_max0 = self.m_max0.unwrap_or(self.m * 2);
        let ef_search = self.ef_search.unwrap_or(self.ef_construction);
        let m_l = self.m_l.unwrap_or_else(|| 1.0 / (self.m as f32).ln());
        if !m_l.is_finite() || m_l <= 0.0 {
            return Err(Error::InvalidConfig(
                "m_l must be a positive, finite number".to_string(),
            ));
        }

        let seed = self.seed.unwrap_or_else(rand::random);

        Ok(Config {
            m: self.m,
            m_max: self.m,
            m_max0,
            ef_construction: self.ef_construction,
            ef_search,
            m_l,
            seed,
            distance: self.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_m_max0_and_ef_search_from_m() {
        let cfg = Config::builder().m(16).build().unwrap();
        assert_eq!(cfg.m_max0, 32);
        assert_eq!(cfg.ef_search, cfg.ef_construction);
    }

    #[test]
    fn rejects_zero_m() {
        assert!(Config::builder().m(0).build().is_err());
    }

    #[test]
    fn rejects_m_equal_one_even_with_explicit_m_l() {
        assert!(Config::builder().m(1).build().is_err());
        assert!(Config::builder().m(1).m_l(1.0).build().is_err());
    }

    #[test]
    fn rejects_zero_ef_search_when_set_explicitly() {
        assert!(Config::builder().ef_search(0).build().is_err());
    }

    #[test]
    fn seed_is_reproducible_when_set() {
        let a = Config::builder().seed(42).build().unwrap();
        let b = Config::builder().seed(42).build().unwrap();
        assert_eq!(a.seed, b.seed);
    }
}

//! Graph-level parameters.
//!
//! Fixed at creation and persisted in the graph header; a reloaded index
//! always runs with the parameters it was built with.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// HNSW graph parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphParams {
    /// Vector dimension `d`.
    pub dimension: usize,
    /// Maximum connections per node on layers above 0 (M).
    /// Layer 0 allows `2 * M`.
    pub max_connections: usize,
    /// Beam width while inserting.
    pub ef_construction: usize,
    /// Default beam width while searching.
    pub ef_search: usize,
}

impl GraphParams {
    /// Default M.
    pub const DEFAULT_MAX_CONNECTIONS: usize = 32;
    /// Default construction beam width.
    pub const DEFAULT_EF_CONSTRUCTION: usize = 200;
    /// Default search beam width.
    pub const DEFAULT_EF_SEARCH: usize = 50;
    /// Smallest usable M (`ln(1)` would make the level multiplier infinite).
    pub const MIN_MAX_CONNECTIONS: usize = 2;
    /// Largest accepted M.
    pub const MAX_MAX_CONNECTIONS: usize = 256;
    /// Layers are capped so a pathological draw cannot allocate unbounded levels.
    pub const MAX_LEVEL: usize = 15;

    /// Creates parameters with default M / ef values for `dimension`.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            ef_construction: Self::DEFAULT_EF_CONSTRUCTION,
            ef_search: Self::DEFAULT_EF_SEARCH,
        }
    }

    /// Overrides M.
    #[must_use]
    pub fn with_max_connections(mut self, m: usize) -> Self {
        self.max_connections = m;
        self
    }

    /// Overrides the construction beam width.
    #[must_use]
    pub fn with_ef_construction(mut self, ef: usize) -> Self {
        self.ef_construction = ef;
        self
    }

    /// Overrides the default search beam width.
    #[must_use]
    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }

    /// Connection budget for a layer: `2 * M` at layer 0, `M` above.
    #[inline]
    #[must_use]
    pub fn max_connections_at(&self, layer: usize) -> usize {
        if layer == 0 {
            self.max_connections * 2
        } else {
            self.max_connections
        }
    }

    /// Level multiplier `1 / ln(M)` for the geometric layer draw.
    #[must_use]
    pub fn level_mult(&self) -> f64 {
        1.0 / (self.max_connections as f64).ln()
    }

    /// Checks that the parameters describe a buildable graph.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::InvalidArgument(
                "dimension must be at least 1".to_string(),
            ));
        }
        if !(Self::MIN_MAX_CONNECTIONS..=Self::MAX_MAX_CONNECTIONS).contains(&self.max_connections)
        {
            return Err(Error::InvalidArgument(format!(
                "max_connections {} is out of range [{}, {}]",
                self.max_connections,
                Self::MIN_MAX_CONNECTIONS,
                Self::MAX_MAX_CONNECTIONS
            )));
        }
        if self.ef_construction == 0 {
            return Err(Error::InvalidArgument(
                "ef_construction must be at least 1".to_string(),
            ));
        }
        if self.ef_search == 0 {
            return Err(Error::InvalidArgument(
                "ef_search must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GraphParams {
    fn default() -> Self {
        Self::new(384)
    }
}

//! Contiguous, append-only vector storage.
//!
//! All vectors live in a single `Vec<f32>` buffer, each occupying
//! `dimension` consecutive elements. A vector's position is its slot index;
//! positions are assigned in insertion order and never reused.
//!
//! # Memory Layout
//!
//! ```text
//! Buffer: [v0_d0, v0_d1, ..., v0_dn, v1_d0, v1_d1, ..., v1_dn, ...]
//! Index:  |<---- vector 0 ---->|    |<---- vector 1 ---->|
//! ```

use crate::error::{Error, Result};

/// Dense position of a vector in the store (0..N-1).
pub type Position = usize;

/// Append-only flat vector storage.
#[derive(Debug, Clone)]
pub struct VectorStore {
    buffer: Vec<f32>,
    dimension: usize,
}

impl VectorStore {
    /// Creates an empty store for vectors of `dimension` elements.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            buffer: Vec::new(),
            dimension,
        }
    }

    /// Rebuilds a store from a flat buffer (decoder path).
    ///
    /// # Errors
    ///
    /// Returns `CorruptPersistedState` if the buffer is not a whole number
    /// of vectors.
    pub fn from_flat(dimension: usize, buffer: Vec<f32>) -> Result<Self> {
        if dimension == 0 || buffer.len() % dimension != 0 {
            return Err(Error::corrupt(format!(
                "vector buffer of {} floats is not a multiple of dimension {dimension}",
                buffer.len()
            )));
        }
        Ok(Self { buffer, dimension })
    }

    /// Returns the vector dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the number of vectors stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len() / self.dimension
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Reserves room for `additional` more vectors without aborting on OOM.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExhausted` if the allocation fails.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let floats = additional.checked_mul(self.dimension).ok_or_else(|| {
            Error::ResourceExhausted(format!("{additional} vectors overflow capacity"))
        })?;
        self.buffer.try_reserve(floats)?;
        Ok(())
    }

    /// Appends a vector and returns its position.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `vector.len() != dimension`, or
    /// `ResourceExhausted` if the buffer cannot grow.
    pub fn append(&mut self, vector: &[f32]) -> Result<Position> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.try_reserve(1)?;
        let position = self.len();
        self.buffer.extend_from_slice(vector);
        Ok(position)
    }

    /// Returns the vector at `position`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.buffer.get(start..start + self.dimension)
    }

    /// Returns the vector at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of bounds. Graph code only holds
    /// positions it obtained from this store.
    #[inline]
    #[must_use]
    pub fn vector(&self, position: Position) -> &[f32] {
        let start = position * self.dimension;
        &self.buffer[start..start + self.dimension]
    }

    /// Iterates vectors in position order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.buffer.chunks_exact(self.dimension)
    }
}

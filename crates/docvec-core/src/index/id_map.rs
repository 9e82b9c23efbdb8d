//! Position → document id mapping.
//!
//! Parallel to the vector store: slot `i` holds the id of the document whose
//! vector sits at position `i`. A hash index on the side answers the dedup
//! question in O(1).

use super::vector_store::Position;
use crate::error::{Error, Result};
use crate::persistence::checksum::ids_fingerprint;
use rustc_hash::FxHashMap;

/// Insertion-ordered id mapping.
#[derive(Debug, Clone, Default)]
pub struct IdMapping {
    ids: Vec<String>,
    positions: FxHashMap<String, Position>,
}

impl IdMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a mapping from position-ordered ids (decoder path).
    ///
    /// # Errors
    ///
    /// Returns `CorruptPersistedState` if an id repeats.
    pub fn from_ids(ids: Vec<String>) -> Result<Self> {
        let mut positions = FxHashMap::default();
        positions.try_reserve(ids.len())?;
        for (position, id) in ids.iter().enumerate() {
            if positions.insert(id.clone(), position).is_some() {
                return Err(Error::corrupt(format!(
                    "id '{id}' appears more than once in the id mapping"
                )));
            }
        }
        Ok(Self { ids, positions })
    }

    /// Number of mapped ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no ids are mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True if `id` is already indexed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Position of `id`, if indexed.
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Id stored at `position`.
    #[must_use]
    pub fn id_at(&self, position: Position) -> Option<&str> {
        self.ids.get(position).map(String::as_str)
    }

    /// All ids in position order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Reserves room for `additional` ids.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExhausted` if the allocation fails.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.ids.try_reserve(additional)?;
        self.positions.try_reserve(additional)?;
        Ok(())
    }

    /// Appends `id` at the next position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `id` is already mapped. Callers dedup
    /// first; this is the last line that keeps the mapping injective.
    pub fn push(&mut self, id: String) -> Result<Position> {
        if self.positions.contains_key(&id) {
            return Err(Error::InvalidArgument(format!("id '{id}' already indexed")));
        }
        self.try_reserve(1)?;
        let position = self.ids.len();
        self.positions.insert(id.clone(), position);
        self.ids.push(id);
        Ok(position)
    }

    /// Fingerprint of the current id sequence.
    #[must_use]
    pub fn fingerprint(&self) -> u32 {
        ids_fingerprint(&self.ids)
    }
}

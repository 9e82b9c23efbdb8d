//! Insertion: layer draw, greedy descent, beam search, heuristic linking
//! and symmetric pruning.

use super::layer::{Layer, NodeId};
use super::LayeredGraph;
use crate::distance::squared_euclidean;
use crate::error::{Error, Result};

impl LayeredGraph {
    /// Inserts `vector` and returns its position.
    ///
    /// Storage for the new node (its vector, level and adjacency slots on
    /// every layer it joins, including layers it creates) is reserved
    /// before the first mutation, so a `ResourceExhausted` error from that
    /// step leaves the graph exactly as it was. Linking may still grow the
    /// neighbor lists of existing nodes; those lists are bounded by the
    /// layer budget.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `vector.len()` is not the graph dimension.
    /// - `ResourceExhausted` if reserving storage fails.
    pub fn insert(&mut self, vector: &[f32]) -> Result<NodeId> {
        if vector.len() != self.params.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.params.dimension,
                actual: vector.len(),
            });
        }

        let saved_rng = self.rng_state;
        let level = self.random_level();
        let node = self.levels.len();
        let fresh_layers = match self.reserve_node(node, level) {
            Ok(layers) => layers,
            Err(err) => {
                self.rng_state = saved_rng;
                return Err(err);
            }
        };

        // Capacity is reserved above; nothing below reallocates these.
        self.vectors.append(vector)?;
        self.levels.push(level);
        self.layers.extend(fresh_layers);
        for layer in &mut self.layers[..=level] {
            layer.ensure_capacity(node);
        }

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(node);
            self.max_layer = level;
            return Ok(node);
        };

        let query = vector;
        let mut current = entry;
        for layer_idx in (level + 1..=self.max_layer).rev() {
            current = self.greedy_closest(query, current, layer_idx);
        }

        let mut entry_points = vec![current];
        for layer_idx in (0..=level.min(self.max_layer)).rev() {
            let candidates =
                self.search_layer(query, &entry_points, self.params.ef_construction, layer_idx);

            let selected = self.select_neighbors(&candidates, self.params.max_connections, &[]);
            self.layers[layer_idx].set_neighbors(node, selected.clone());
            for &neighbor in &selected {
                self.link_back(neighbor, node, layer_idx, false);
            }

            // Every selected neighbor may have pruned the new node away.
            if self.layers[layer_idx].neighbors(node).is_empty() {
                if let Some(&(nearest, _)) = candidates.first() {
                    if let Some(list) = self.layers[layer_idx].neighbors_mut(node) {
                        list.push(nearest);
                    }
                    self.link_back(nearest, node, layer_idx, true);
                }
            }

            if !candidates.is_empty() {
                entry_points = candidates.iter().map(|&(id, _)| id).collect();
            }
        }

        if level > self.max_layer {
            self.max_layer = level;
            self.entry_point = Some(node);
        }

        Ok(node)
    }

    /// Reserves everything `node` needs and returns the empty layers it
    /// will create above the current top.
    fn reserve_node(&mut self, node: NodeId, level: usize) -> Result<Vec<Layer>> {
        self.vectors.try_reserve(1)?;
        self.levels.try_reserve(1)?;
        let missing = (level + 1).saturating_sub(self.layers.len());
        self.layers.try_reserve(missing)?;
        for layer in self.layers.iter_mut().take(level + 1) {
            layer.try_reserve_for(node)?;
        }

        let mut fresh = Vec::new();
        fresh.try_reserve_exact(missing)?;
        for _ in 0..missing {
            let mut layer = Layer::new();
            layer.try_reserve_for(node)?;
            fresh.push(layer);
        }
        Ok(fresh)
    }

    /// Heuristic neighbor selection.
    ///
    /// `candidates` must be sorted ascending by distance to the base node.
    /// `required` positions are taken first. A candidate is then kept only
    /// if it is strictly closer to the base than to every neighbor already
    /// kept, so edges fan out instead of all pointing into one cluster.
    /// Remaining slots are filled with the closest leftovers.
    ///
    /// At most one candidate at distance zero from the base is taken, so a
    /// run of identical vectors cannot crowd out every other neighbor.
    pub(crate) fn select_neighbors(
        &self,
        candidates: &[(NodeId, f32)],
        max_neighbors: usize,
        required: &[NodeId],
    ) -> Vec<NodeId> {
        let mut selected: Vec<NodeId> = Vec::with_capacity(max_neighbors);
        for &id in required.iter().take(max_neighbors) {
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        let mut exact_taken = candidates
            .iter()
            .any(|&(id, dist)| dist <= 0.0 && selected.contains(&id));

        if candidates.len() <= max_neighbors.saturating_sub(selected.len()) {
            for &(id, dist) in candidates {
                if selected.contains(&id) || (dist <= 0.0 && exact_taken) {
                    continue;
                }
                exact_taken |= dist <= 0.0;
                selected.push(id);
            }
            return selected;
        }

        for &(candidate, candidate_dist) in candidates {
            if selected.len() >= max_neighbors {
                break;
            }
            if selected.contains(&candidate) || (candidate_dist <= 0.0 && exact_taken) {
                continue;
            }
            let candidate_vec = self.vectors.vector(candidate);
            let is_diverse = selected.iter().all(|&kept| {
                candidate_dist < squared_euclidean(candidate_vec, self.vectors.vector(kept))
            });
            if is_diverse {
                exact_taken |= candidate_dist <= 0.0;
                selected.push(candidate);
            }
        }

        for &(candidate, candidate_dist) in candidates {
            if selected.len() >= max_neighbors {
                break;
            }
            if selected.contains(&candidate) || (candidate_dist <= 0.0 && exact_taken) {
                continue;
            }
            exact_taken |= candidate_dist <= 0.0;
            selected.push(candidate);
        }

        selected
    }

    /// Adds `new_node` to `neighbor`'s list on `layer`, pruning back to the
    /// layer budget when it overflows.
    ///
    /// A prune drops exactly one position and keeps edges symmetric: the
    /// dropped position also loses its edge to `neighbor`. It is then
    /// bridged to one of the kept positions, so it stays connected to
    /// `neighbor` through a path of length two. With `force`, `new_node`
    /// is never the one dropped.
    fn link_back(&mut self, neighbor: NodeId, new_node: NodeId, layer: usize, force: bool) {
        let budget = self.params.max_connections_at(layer);
        let current = self.layers[layer].neighbors(neighbor);
        if current.contains(&new_node) {
            return;
        }
        if current.len() < budget {
            if let Some(list) = self.layers[layer].neighbors_mut(neighbor) {
                list.push(new_node);
            }
            return;
        }

        let base = self.vectors.vector(neighbor);
        let mut scored: Vec<(NodeId, f32)> = current
            .iter()
            .copied()
            .chain(std::iter::once(new_node))
            .map(|n| (n, squared_euclidean(base, self.vectors.vector(n))))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let kept = self.prune_neighbors(neighbor, &scored, budget, new_node, force, layer);
        let dropped: Vec<NodeId> = scored
            .iter()
            .map(|&(n, _)| n)
            .filter(|n| !kept.contains(n))
            .collect();

        for &gone in &dropped {
            if let Some(list) = self.layers[layer].neighbors_mut(gone) {
                list.retain(|&n| n != neighbor);
            }
            if gone != new_node {
                self.bridge(gone, &kept, layer);
            }
        }
        self.layers[layer].set_neighbors(neighbor, kept);
    }

    /// Chooses which `budget` of the scored positions `neighbor` keeps.
    ///
    /// Positions whose only link on this layer is `neighbor` are taken
    /// first, then the heuristic runs, then exact duplicates top the list
    /// up so exactly one position is dropped.
    fn prune_neighbors(
        &self,
        neighbor: NodeId,
        scored: &[(NodeId, f32)],
        budget: usize,
        new_node: NodeId,
        force: bool,
        layer: usize,
    ) -> Vec<NodeId> {
        let layer_ref = &self.layers[layer];
        let mut required: Vec<NodeId> = if force { vec![new_node] } else { Vec::new() };
        for &(n, _) in scored {
            if layer_ref.neighbors(n) == [neighbor] && !required.contains(&n) {
                required.push(n);
            }
        }

        let mut kept = self.select_neighbors(scored, budget, &required);
        for &(n, _) in scored {
            if kept.len() >= budget {
                break;
            }
            if !kept.contains(&n) {
                kept.push(n);
            }
        }
        kept
    }

    /// Reconnects `orphan`, which just lost an edge to the owner of `via`,
    /// to the closest position in `via` with room on `layer`.
    ///
    /// Nothing is added if `orphan` already links to one of `via`.
    fn bridge(&mut self, orphan: NodeId, via: &[NodeId], layer: usize) {
        let budget = self.params.max_connections_at(layer);
        let orphan_links = self.layers[layer].neighbors(orphan);
        if orphan_links.len() >= budget || via.iter().any(|n| orphan_links.contains(n)) {
            return;
        }

        let orphan_vec = self.vectors.vector(orphan);
        let mut options: Vec<(NodeId, f32)> = via
            .iter()
            .copied()
            .filter(|&n| n != orphan)
            .map(|n| (n, squared_euclidean(orphan_vec, self.vectors.vector(n))))
            .collect();
        options.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let Some(&(target, _)) = options
            .iter()
            .find(|&&(n, _)| self.layers[layer].neighbors(n).len() < budget)
        else {
            return;
        };
        if let Some(list) = self.layers[layer].neighbors_mut(target) {
            list.push(orphan);
        }
        if let Some(list) = self.layers[layer].neighbors_mut(orphan) {
            list.push(target);
        }
    }
}

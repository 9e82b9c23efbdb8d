//! Binary graph codec and JSON id codec.
//!
//! # Graph format (`graph.dvx`, little-endian)
//!
//! ```text
//! [magic: "DVXG"][version: u32]
//! [dimension: u32][M: u32][ef_construction: u32][ef_search: u32]
//! [node_count: u64][entry_point: u64][max_layer: u32]
//! [rng_state: u64][ids_crc: u32]
//! per node:
//!   [level: u32][vector: dimension x f32]
//!   per layer 0..=level: [count: u32][count x u32 positions]
//! [crc32: u32]   over every preceding byte
//! ```
//!
//! `entry_point` is `u64::MAX` for an empty graph. It is a redundant copy
//! of the first node with the highest level and is checked on decode.
//! `ids_crc` is the fingerprint of the id sequence the graph was saved
//! with, which ties the two artifacts together.

use super::checksum::crc32;
use crate::error::{Error, Result};
use crate::index::{GraphParams, GraphParts, LayeredGraph, NodeId, VectorStore};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Graph file magic.
pub const GRAPH_MAGIC: &[u8; 4] = b"DVXG";
/// Graph file format version.
pub const GRAPH_FORMAT_VERSION: u32 = 1;
/// Id file format version.
pub const IDS_FORMAT_VERSION: u32 = 1;

/// magic + version + 4 params + node_count + entry + max_layer + rng + ids_crc
const HEADER_LEN: usize = 4 + 4 + 4 * 4 + 8 + 8 + 4 + 8 + 4;
const TRAILER_LEN: usize = 4;
const EMPTY_ENTRY: u64 = u64::MAX;

/// A graph decoded from bytes, with the id fingerprint it was saved against.
#[derive(Debug)]
pub struct DecodedGraph {
    /// Validated graph.
    pub graph: LayeredGraph,
    /// Fingerprint of the id sequence at save time.
    pub ids_crc: u32,
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Serialization(format!("{what} {value} exceeds u32")))
}

/// Encodes `graph` into the `graph.dvx` layout.
///
/// # Errors
///
/// - `ResourceExhausted` if the output buffer cannot be allocated.
/// - `Serialization` if a count does not fit the on-disk integer width.
pub fn encode_graph(graph: &LayeredGraph, ids_crc: u32) -> Result<Vec<u8>> {
    let params = graph.params();
    let dimension = params.dimension;

    let mut estimate = HEADER_LEN + TRAILER_LEN;
    for node in 0..graph.len() {
        let level = graph.level_of(node).unwrap_or(0);
        estimate += 4 + dimension * 4;
        for layer in 0..=level {
            estimate += 4 + graph.neighbors(node, layer).len() * 4;
        }
    }
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(estimate)?;

    buf.put_slice(GRAPH_MAGIC);
    buf.put_u32_le(GRAPH_FORMAT_VERSION);
    buf.put_u32_le(to_u32(dimension, "dimension")?);
    buf.put_u32_le(to_u32(params.max_connections, "max_connections")?);
    buf.put_u32_le(to_u32(params.ef_construction, "ef_construction")?);
    buf.put_u32_le(to_u32(params.ef_search, "ef_search")?);
    buf.put_u64_le(graph.len() as u64);
    buf.put_u64_le(graph.entry_point().map_or(EMPTY_ENTRY, |e| e as u64));
    buf.put_u32_le(to_u32(graph.max_layer(), "max_layer")?);
    buf.put_u64_le(graph.rng_state());
    buf.put_u32_le(ids_crc);

    for (node, vector) in graph.vectors().iter().enumerate() {
        let level = graph.level_of(node).unwrap_or(0);
        buf.put_u32_le(to_u32(level, "level")?);
        for &x in vector {
            buf.put_f32_le(x);
        }
        for layer in 0..=level {
            let list = graph.neighbors(node, layer);
            buf.put_u32_le(to_u32(list.len(), "neighbor count")?);
            for &neighbor in list {
                buf.put_u32_le(to_u32(neighbor, "position")?);
            }
        }
    }

    let checksum = crc32(&buf);
    buf.put_u32_le(checksum);
    Ok(buf)
}

/// Bounds-checked little-endian reader.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(Error::corrupt(format!("truncated while reading {what}")));
        }
        Ok(())
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.need(4, what)?;
        Ok(self.buf.get_u32_le())
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        self.need(8, what)?;
        Ok(self.buf.get_u64_le())
    }

    fn usize32(&mut self, what: &str) -> Result<usize> {
        self.u32(what).map(|v| v as usize)
    }

    fn f32(&mut self, what: &str) -> Result<f32> {
        self.need(4, what)?;
        Ok(self.buf.get_f32_le())
    }

    fn bytes(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        self.need(n, what)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }
}

/// Decodes and validates a `graph.dvx` payload.
///
/// Every structural invariant is checked; nothing partially decoded is
/// ever returned.
///
/// # Errors
///
/// - `CorruptPersistedState` on bad magic, version, checksum, truncation,
///   trailing bytes, non-finite vectors or any graph invariant violation.
/// - `ResourceExhausted` if the declared sizes cannot be allocated.
pub fn decode_graph(data: &[u8]) -> Result<DecodedGraph> {
    if data.len() < HEADER_LEN + TRAILER_LEN {
        return Err(Error::corrupt(format!(
            "graph file is {} bytes, shorter than its header",
            data.len()
        )));
    }
    let (body, trailer) = data.split_at(data.len() - TRAILER_LEN);
    let mut trailer_reader = Reader { buf: trailer };
    let stored_crc = trailer_reader.u32("checksum")?;
    let actual_crc = crc32(body);
    if stored_crc != actual_crc {
        return Err(Error::corrupt(format!(
            "graph checksum mismatch: stored {stored_crc:#010x}, computed {actual_crc:#010x}"
        )));
    }

    let mut r = Reader { buf: body };
    if r.bytes(4, "magic")? != GRAPH_MAGIC {
        return Err(Error::corrupt("bad graph magic"));
    }
    let version = r.u32("version")?;
    if version != GRAPH_FORMAT_VERSION {
        return Err(Error::corrupt(format!(
            "unsupported graph format version {version}"
        )));
    }

    let params = GraphParams {
        dimension: r.usize32("dimension")?,
        max_connections: r.usize32("max_connections")?,
        ef_construction: r.usize32("ef_construction")?,
        ef_search: r.usize32("ef_search")?,
    };
    params
        .validate()
        .map_err(|e| Error::corrupt(format!("invalid graph parameters: {e}")))?;
    let node_count = r.u64("node_count")?;
    let stored_entry = r.u64("entry_point")?;
    let stored_max_layer = r.usize32("max_layer")?;
    let rng_state = r.u64("rng_state")?;
    let ids_crc = r.u32("ids_crc")?;

    // Smallest possible node record: level, vector, empty layer-0 list.
    let min_node_len = 4 + params.dimension * 4 + 4;
    let node_count = usize::try_from(node_count)
        .ok()
        .filter(|&n| n.checked_mul(min_node_len).is_some_and(|len| len <= r.buf.len()))
        .ok_or_else(|| Error::corrupt(format!("node count {node_count} exceeds file size")))?;

    let mut flat: Vec<f32> = Vec::new();
    flat.try_reserve_exact(node_count * params.dimension)?;
    let mut links: Vec<Vec<Vec<NodeId>>> = Vec::new();
    links.try_reserve_exact(node_count)?;

    for node in 0..node_count {
        let level = r.usize32("level")?;
        if level > GraphParams::MAX_LEVEL {
            return Err(Error::corrupt(format!("node {node} has level {level}")));
        }
        for _ in 0..params.dimension {
            let x = r.f32("vector")?;
            if !x.is_finite() {
                return Err(Error::corrupt(format!("node {node} has a non-finite component")));
            }
            flat.push(x);
        }
        let mut node_links = Vec::with_capacity(level + 1);
        for layer in 0..=level {
            let count = r.usize32("neighbor count")?;
            let budget = params.max_connections_at(layer);
            if count > budget {
                return Err(Error::corrupt(format!(
                    "node {node} declares {count} links on layer {layer}, budget {budget}"
                )));
            }
            let mut list = Vec::with_capacity(count);
            for _ in 0..count {
                list.push(r.usize32("neighbor")?);
            }
            node_links.push(list);
        }
        links.push(node_links);
    }

    if !r.buf.is_empty() {
        return Err(Error::corrupt(format!(
            "{} trailing bytes after the last node",
            r.buf.len()
        )));
    }

    let graph = LayeredGraph::from_parts(GraphParts {
        params,
        vectors: VectorStore::from_flat(params.dimension, flat)?,
        links,
        rng_state,
    })?;

    let derived_entry = graph.entry_point().map_or(EMPTY_ENTRY, |e| e as u64);
    if derived_entry != stored_entry || graph.max_layer() != stored_max_layer {
        return Err(Error::corrupt(format!(
            "stored entry point {stored_entry} at layer {stored_max_layer} disagrees with \
             derived {derived_entry} at layer {}",
            graph.max_layer()
        )));
    }

    Ok(DecodedGraph { graph, ids_crc })
}

#[derive(Serialize)]
struct IdsFileRef<'a> {
    version: u32,
    ids: &'a [String],
}

#[derive(Deserialize)]
struct IdsFile {
    version: u32,
    ids: Vec<String>,
}

/// Encodes the id sequence as `{"version":1,"ids":[...]}`.
///
/// # Errors
///
/// Returns `Serialization` if JSON encoding fails.
pub fn encode_ids(ids: &[String]) -> Result<Vec<u8>> {
    serde_json::to_vec(&IdsFileRef {
        version: IDS_FORMAT_VERSION,
        ids,
    })
    .map_err(|e| Error::Serialization(e.to_string()))
}

/// Decodes an id file.
///
/// # Errors
///
/// Returns `CorruptPersistedState` if the JSON is malformed or the
/// version is unknown.
pub fn decode_ids(data: &[u8]) -> Result<Vec<String>> {
    let file: IdsFile = serde_json::from_slice(data)
        .map_err(|e| Error::corrupt(format!("malformed id file: {e}")))?;
    if file.version != IDS_FORMAT_VERSION {
        return Err(Error::corrupt(format!(
            "unsupported id file version {}",
            file.version
        )));
    }
    Ok(file.ids)
}

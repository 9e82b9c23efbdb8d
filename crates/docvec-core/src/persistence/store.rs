//! On-disk artifact store.
//!
//! Two files live in the data directory: `ids.json` and `graph.dvx`. Each
//! is written to a temp file, fsynced, then renamed over the old copy. Ids
//! are written first so a crash between the two renames leaves ids that
//! extend the graph's id prefix, which load detects and truncates.

use super::checksum::ids_fingerprint;
use super::codec::{decode_graph, decode_ids};
use crate::error::{Error, Result};
use crate::index::{IdMapping, LayeredGraph};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Graph artifact file name.
pub const GRAPH_FILE: &str = "graph.dvx";
/// Id artifact file name.
pub const IDS_FILE: &str = "ids.json";

/// Encoded artifacts ready to be written outside any lock.
#[derive(Debug)]
pub struct EncodedState {
    /// Generation the bytes were taken at.
    pub generation: u64,
    /// Number of nodes encoded.
    pub node_count: usize,
    /// `ids.json` contents.
    pub ids: Vec<u8>,
    /// `graph.dvx` contents.
    pub graph: Vec<u8>,
}

/// State recovered from disk.
#[derive(Debug)]
pub struct LoadedState {
    /// Validated graph.
    pub graph: LayeredGraph,
    /// Id mapping parallel to the graph.
    pub ids: IdMapping,
    /// True if trailing ids from an interrupted save were dropped.
    pub truncated: bool,
}

/// Reads and writes the persisted artifacts of one index.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    /// Creates a store rooted at `dir`. Nothing is touched until the first
    /// load or save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the graph artifact.
    #[must_use]
    pub fn graph_path(&self) -> PathBuf {
        self.dir.join(GRAPH_FILE)
    }

    /// Path of the id artifact.
    #[must_use]
    pub fn ids_path(&self) -> PathBuf {
        self.dir.join(IDS_FILE)
    }

    /// Writes both artifacts, ids first.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created or a write, fsync or
    /// rename fails. A failed save leaves the previous artifacts readable.
    pub fn save(&self, state: &EncodedState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        atomic_write(&self.ids_path(), &state.ids)?;
        atomic_write(&self.graph_path(), &state.graph)?;
        sync_dir(&self.dir)?;
        info!(
            generation = state.generation,
            nodes = state.node_count,
            bytes = state.ids.len() + state.graph.len(),
            dir = %self.dir.display(),
            "Index persisted"
        );
        Ok(())
    }

    /// Loads persisted state.
    ///
    /// Returns `Ok(None)` when there is nothing to load. When
    /// `expected_dimension` is given, the stored graph must match it.
    ///
    /// # Errors
    ///
    /// - `CorruptPersistedState` if either artifact is unreadable, the two
    ///   disagree, or only one of them exists with content.
    /// - `DimensionMismatch` if the stored graph is intact but was built
    ///   for another dimension (`expected` is the stored one).
    /// - `Io` if a present file cannot be read.
    pub fn load(&self, expected_dimension: Option<usize>) -> Result<Option<LoadedState>> {
        let graph_bytes = read_optional(&self.graph_path())?;
        let id_bytes = read_optional(&self.ids_path())?;

        let (graph_bytes, id_bytes) = match (graph_bytes, id_bytes) {
            (None, None) => {
                warn!(dir = %self.dir.display(), "No persisted index found, starting empty");
                return Ok(None);
            }
            (Some(_), None) => {
                return Err(Error::corrupt(format!(
                    "{GRAPH_FILE} exists without {IDS_FILE}"
                )));
            }
            (None, Some(id_bytes)) => {
                if decode_ids(&id_bytes)?.is_empty() {
                    warn!(dir = %self.dir.display(), "No persisted graph found, starting empty");
                    return Ok(None);
                }
                return Err(Error::corrupt(format!(
                    "{IDS_FILE} lists ids but {GRAPH_FILE} is missing"
                )));
            }
            (Some(g), Some(i)) => (g, i),
        };

        let decoded = decode_graph(&graph_bytes)?;
        let graph = decoded.graph;
        if let Some(expected) = expected_dimension {
            if graph.dimension() != expected {
                return Err(Error::DimensionMismatch {
                    expected: graph.dimension(),
                    actual: expected,
                });
            }
        }

        let mut ids = decode_ids(&id_bytes)?;
        let node_count = graph.len();
        let mut truncated = false;
        if ids.len() < node_count {
            return Err(Error::corrupt(format!(
                "{} ids for {node_count} graph nodes",
                ids.len()
            )));
        }
        if ids_fingerprint(&ids[..node_count]) != decoded.ids_crc {
            return Err(Error::corrupt(
                "id artifact does not match the ids the graph was saved with",
            ));
        }
        if ids.len() > node_count {
            warn!(
                dropped = ids.len() - node_count,
                nodes = node_count,
                "Id artifact is ahead of the graph, truncating to the last complete save"
            );
            ids.truncate(node_count);
            truncated = true;
        }

        let ids = IdMapping::from_ids(ids)?;
        info!(
            nodes = node_count,
            dimension = graph.dimension(),
            dir = %self.dir.display(),
            "Index loaded"
        );
        Ok(Some(LoadedState {
            graph,
            ids,
            truncated,
        }))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes `data` to `path` via a temp file + fsync + rename.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)
}

/// Makes the renames durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

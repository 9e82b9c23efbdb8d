//! Bulk import from JSON Lines.
//!
//! One document per line: `{"id": "doc-1", "text": "..."}`. Blank lines
//! are ignored; malformed lines are counted and skipped.

use anyhow::{Context, Result};
use docvec_core::{Document, DocumentIndex};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::warn;

/// JSON Lines record structure
#[derive(Debug, Deserialize)]
struct JsonRecord {
    id: String,
    text: String,
}

/// Parses one line. Returns `Ok(None)` for blank lines.
pub fn parse_record(line: &str) -> Result<Option<Document>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let record: JsonRecord = serde_json::from_str(trimmed).context("Invalid JSONL record")?;
    Ok(Some(Document::new(record.id, record.text)))
}

/// Streams `path` into `index` in batches of `batch_size`.
///
/// Each batch is indexed (and persisted) atomically before the next one
/// is read.
pub fn import_jsonl(index: &DocumentIndex, path: &Path, batch_size: usize) -> Result<ImportStats> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open JSONL file {}", path.display()))?;
    let reader = BufReader::with_capacity(128 * 1024, file);

    let mut stats = ImportStats::default();
    let start = Instant::now();
    let mut batch: Vec<Document> = Vec::with_capacity(batch_size);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read JSONL file")?;
        match parse_record(&line) {
            Ok(Some(doc)) => {
                stats.records += 1;
                batch.push(doc);
                if batch.len() >= batch_size {
                    stats.add(&index.index_documents(&batch)?);
                    batch.clear();
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "Skipping malformed record");
                stats.errors += 1;
            }
        }
    }

    if !batch.is_empty() {
        stats.add(&index.index_documents(&batch)?);
    }

    stats.total_indexed = index.len();
    stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Import statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub records: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub errors: usize,
    pub total_indexed: usize,
    pub duration_ms: u64,
}

impl ImportStats {
    fn add(&mut self, report: &docvec_core::IngestReport) {
        self.accepted += report.accepted;
        self.skipped += report.skipped;
    }

    /// Records per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.accepted as f64) / (self.duration_ms as f64 / 1000.0)
        }
    }
}

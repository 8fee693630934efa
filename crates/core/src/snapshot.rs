//! Snapshot Codec (C6) — serializes/deserializes the `IndexStore` to a
//! single on-disk artifact, version-gated.
//!
//! Wire format: a self-describing JSON document carrying `FileRecord`s and
//! the file-hash map (spec.md §6, "Snapshot format (semantic)"). The
//! `InvertedIndex` itself is never persisted — it's rebuilt on load by
//! replaying each file's lines through the same tokenizer/scorer path
//! `insert_or_replace_file` uses, so a loaded store is built by exactly the
//! code that builds a freshly scanned one.
//!
//! The first byte on disk distinguishes a plain body (`0x00`) from a
//! gzip-compressed one (`0x01`); compression only kicks in once the
//! serialized body is at least `compression_threshold_bytes` long.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::config::{PrismConfig, SNAPSHOT_VERSION};
use crate::model::{FileRecord, Language, LineRecord};
use crate::store::IndexStore;

const HEADER_PLAIN: u8 = 0x00;
const HEADER_COMPRESSED: u8 = 0x01;

#[derive(Serialize, Deserialize)]
struct SnapshotLine {
    idx: usize,
    text: String,
    length: usize,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFileRecord {
    path: String,
    language: Language,
    line_count: usize,
    lines: Vec<SnapshotLine>,
    content_hash: String,
}

#[derive(Serialize, Deserialize)]
struct SnapshotBody {
    version: String,
    indexed_at: String,
    project_root: String,
    file_count: usize,
    files: Vec<SnapshotFileRecord>,
    file_hashes: std::collections::HashMap<String, String>,
}

/// Writes `store` to `path` atomically (write-to-temp, then rename).
pub fn save(store: &IndexStore, path: &Path, config: &PrismConfig) -> std::io::Result<()> {
    let body = to_body(store);
    let json = serde_json::to_vec(&body).expect("SnapshotBody serialization cannot fail");

    let (header, payload) = if json.len() >= config.compression_threshold_bytes {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        (HEADER_COMPRESSED, encoder.finish()?)
    } else {
        (HEADER_PLAIN, json)
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(&[header])?;
        tmp.write_all(&payload)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Loads the snapshot at `path`. Returns `None` — never an error — when the
/// file is absent, fails to parse, or carries an unexpected version tag;
/// each case is logged and the caller is expected to fall back to a full
/// rebuild.
pub fn load(path: &Path) -> Option<IndexStore> {
    let raw = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no snapshot on disk");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read snapshot file");
            return None;
        }
    };

    let (&header, body_bytes) = match raw.split_first() {
        Some(pair) => pair,
        None => {
            tracing::warn!(path = %path.display(), "snapshot file is empty");
            return None;
        }
    };

    let json_bytes = match header {
        HEADER_PLAIN => body_bytes.to_vec(),
        HEADER_COMPRESSED => {
            let mut decoder = GzDecoder::new(body_bytes);
            let mut out = Vec::new();
            match decoder.read_to_end(&mut out) {
                Ok(_) => out,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "snapshot is corrupt: gzip decode failed");
                    return None;
                }
            }
        }
        other => {
            tracing::warn!(path = %path.display(), header = other, "snapshot is corrupt: unrecognized header byte");
            return None;
        }
    };

    let body: SnapshotBody = match serde_json::from_slice(&json_bytes) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot is corrupt: failed to parse body");
            return None;
        }
    };

    if body.version != SNAPSHOT_VERSION {
        tracing::info!(
            path = %path.display(),
            found = %body.version,
            expected = %SNAPSHOT_VERSION,
            "snapshot is stale, discarding"
        );
        return None;
    }

    Some(from_body(body))
}

fn to_body(store: &IndexStore) -> SnapshotBody {
    let files = store
        .files()
        .iter()
        .map(|f| SnapshotFileRecord {
            path: f.path.clone(),
            language: f.language,
            line_count: f.line_count,
            lines: f
                .lines
                .iter()
                .map(|l| SnapshotLine { idx: l.line_number, text: l.text.clone(), length: l.length })
                .collect(),
            content_hash: f.content_hash.clone(),
        })
        .collect::<Vec<_>>();

    let file_hashes =
        store.files().iter().map(|f| (f.path.clone(), f.content_hash.clone())).collect();

    SnapshotBody {
        version: store.version.clone(),
        indexed_at: store.created_at.clone(),
        project_root: store.project_root.clone(),
        file_count: store.file_count(),
        files,
        file_hashes,
    }
}

fn from_body(body: SnapshotBody) -> IndexStore {
    let mut store = IndexStore::new(body.version, body.indexed_at, body.project_root);

    for file in body.files {
        // Rebuild via the exact FileRecord shape, reusing the same posting
        // emission a fresh `insert_or_replace_file` would — see `replay`.
        let lines = file.lines.into_iter().map(|l| LineRecord::new(l.idx, l.text)).collect();
        store.replay_file(FileRecord {
            path: file.path,
            language: file.language,
            line_count: file.line_count,
            lines,
            content_hash: file.content_hash,
        });
    }

    store
}

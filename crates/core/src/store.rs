//! Index Store (C5) — the in-memory authoritative state: file records, the
//! inverted term index, and the file-hash map used for delta detection.
//!
//! Postings reference files and lines by position (`file_index`,
//! `line_index`) rather than by owning handle, which is what lets a file's
//! postings be bulk-removed on replace without the inverted index knowing
//! anything about `FileRecord` lifetime (spec.md §9, "Cyclic references").

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::extract::extract;
use crate::model::{FileRecord, Language, LineRecord, Posting};
use crate::tokenize::{base_score, tokenize};

/// What changed as a result of [`IndexStore::insert_or_replace_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDelta {
    Added,
    Modified,
}

#[derive(Clone)]
pub struct IndexStore {
    pub version: String,
    pub created_at: String,
    pub project_root: String,
    files: Vec<FileRecord>,
    path_to_file: HashMap<String, usize>,
    inverted: HashMap<String, Vec<Posting>>,
    file_hashes: HashMap<String, String>,
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl IndexStore {
    pub fn new(version: impl Into<String>, created_at: impl Into<String>, project_root: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            created_at: created_at.into(),
            project_root: project_root.into(),
            files: Vec::new(),
            path_to_file: HashMap::new(),
            inverted: HashMap::new(),
            file_hashes: HashMap::new(),
        }
    }

    // -- read-only accessors -------------------------------------------------

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn file_by_index(&self, idx: usize) -> Option<&FileRecord> {
        self.files.get(idx)
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.path_to_file.get(path).copied()
    }

    pub fn get_file(&self, path: &str) -> Option<&FileRecord> {
        self.index_of(path).and_then(|i| self.files.get(i))
    }

    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.inverted.get(term).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.inverted.contains_key(term)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn term_count(&self) -> usize {
        self.inverted.len()
    }

    pub fn posting_count(&self) -> usize {
        self.inverted.values().map(|v| v.len()).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.files.iter().map(|f| f.lines.len()).sum()
    }

    pub fn hash_of(&self, path: &str) -> Option<&str> {
        self.file_hashes.get(path).map(|s| s.as_str())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.path_to_file.keys().map(|s| s.as_str())
    }

    // -- mutation -------------------------------------------------------------

    /// Builds a [`FileRecord`] from `bytes`, replacing any prior record at
    /// `path`. Atomic with respect to readers of the snapshot this store is
    /// swapped into by [`crate::coordinator::Coordinator`].
    pub fn insert_or_replace_file(&mut self, path: &str, bytes: &[u8]) -> FileDelta {
        let delta = if self.path_to_file.contains_key(path) {
            self.remove_file(path);
            FileDelta::Modified
        } else {
            FileDelta::Added
        };

        let ext = Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = Language::from_ext(ext);
        let content_hash = hash_bytes(bytes);
        let (line_count, lines) = extract(bytes);

        self.insert_built_record(FileRecord {
            path: path.to_string(),
            language,
            line_count,
            lines,
            content_hash,
        });

        delta
    }

    /// Inserts a [`FileRecord`] built elsewhere (by [`crate::snapshot::load`]
    /// replaying a stored record) without re-reading or re-hashing bytes.
    /// Shares posting emission with `insert_or_replace_file` so a loaded
    /// store and a freshly scanned one are built by the same code path.
    /// The caller is responsible for ensuring no record already exists at
    /// `record.path` — the snapshot codec only ever calls this once per
    /// path while rebuilding from a freshly-loaded, deduplicated body.
    pub(crate) fn replay_file(&mut self, record: FileRecord) {
        self.insert_built_record(record);
    }

    fn insert_built_record(&mut self, record: FileRecord) {
        let file_index = self.files.len();
        for (line_idx, line) in record.lines.iter().enumerate() {
            self.add_postings(file_index, line_idx, line, record.language);
        }
        self.path_to_file.insert(record.path.clone(), file_index);
        self.file_hashes.insert(record.path.clone(), record.content_hash.clone());
        self.files.push(record);
    }

    /// Removes the `FileRecord` at `path`, all of its postings, and its
    /// hash entry. Returns whether a record existed.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let idx = match self.path_to_file.get(path).copied() {
            Some(i) => i,
            None => return false,
        };

        self.drop_postings_for_file(idx);

        let last_idx = self.files.len() - 1;
        let removed = self.files.swap_remove(idx);
        self.path_to_file.remove(&removed.path);
        self.file_hashes.remove(&removed.path);

        if idx != last_idx {
            // `swap_remove` moved the element that used to live at
            // `last_idx` into `idx` — repoint its path and its postings.
            let moved_path = self.files[idx].path.clone();
            self.path_to_file.insert(moved_path, idx);
            self.retarget_postings(last_idx, idx);
        }

        true
    }

    fn add_postings(&mut self, file_index: usize, line_index: usize, line: &LineRecord, language: Language) {
        let terms = tokenize(&line.text);
        let score = base_score(language, line.length);
        let mut seen = std::collections::HashSet::new();
        for term in terms {
            if !seen.insert(term.clone()) {
                continue;
            }
            self.inverted.entry(term).or_default().push(Posting {
                file_index,
                line_index,
                base_score: score,
                line_number: line.line_number,
            });
        }
    }

    fn drop_postings_for_file(&mut self, file_index: usize) {
        self.inverted.retain(|_, postings| {
            postings.retain(|p| p.file_index != file_index);
            !postings.is_empty()
        });
    }

    fn retarget_postings(&mut self, from: usize, to: usize) {
        for postings in self.inverted.values_mut() {
            for p in postings.iter_mut() {
                if p.file_index == from {
                    p.file_index = to;
                }
            }
        }
    }
}

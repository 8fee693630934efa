//! Delta Planner (C7) — classifies scanned files against stored hashes.
//!
//! Pure function: performs no mutation of the `IndexStore`. The caller
//! (the Coordinator) applies `insert_or_replace_file`/`remove_file` for the
//! classified paths.

use std::collections::HashSet;

use crate::scanner::ScannedFile;
use crate::store::IndexStore;

#[derive(Debug, Default)]
pub struct Delta<'a> {
    pub added: Vec<&'a ScannedFile>,
    pub modified: Vec<&'a ScannedFile>,
    pub deleted: Vec<String>,
    pub unchanged: usize,
}

pub fn classify<'a>(store: &IndexStore, scanned: &'a [ScannedFile]) -> Delta<'a> {
    let mut delta = Delta::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(scanned.len());

    for file in scanned {
        seen.insert(file.rel_path.as_str());
        match store.hash_of(&file.rel_path) {
            None => delta.added.push(file),
            Some(stored_hash) if stored_hash != file.content_hash => delta.modified.push(file),
            Some(_) => delta.unchanged += 1,
        }
    }

    for path in store.paths() {
        if !seen.contains(path) {
            delta.deleted.push(path.to_string());
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(path: &str, bytes: &[u8]) -> ScannedFile {
        ScannedFile {
            rel_path: path.to_string(),
            bytes: bytes.to_vec(),
            content_hash: crate::store::hash_bytes(bytes),
        }
    }

    #[test]
    fn classifies_added_modified_deleted_unchanged() {
        let mut store = IndexStore::new("2.0", "now", "/proj");
        store.insert_or_replace_file("a.ts", b"unchanged\n");
        store.insert_or_replace_file("b.ts", b"will be deleted\n");

        let scan = vec![
            scanned("a.ts", b"unchanged\n"),
            scanned("c.ts", b"brand new\n"),
        ];

        let delta = classify(&store, &scan);
        assert_eq!(delta.unchanged, 1);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].rel_path, "c.ts");
        assert_eq!(delta.deleted, vec!["b.ts".to_string()]);
        assert!(delta.modified.is_empty());
    }

    #[test]
    fn detects_modification_via_hash_mismatch() {
        let mut store = IndexStore::new("2.0", "now", "/proj");
        store.insert_or_replace_file("a.ts", b"old content\n");

        let scan = vec![scanned("a.ts", b"new content\n")];
        let delta = classify(&store, &scan);

        assert_eq!(delta.modified.len(), 1);
        assert!(delta.added.is_empty());
        assert_eq!(delta.unchanged, 0);
    }
}

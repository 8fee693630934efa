//! File Scanner (C2) — walks a project root and streams eligible files.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::config::PrismConfig;
use crate::error::{PrismError, PrismResult};
use crate::filter;
use crate::store::hash_bytes;

/// One file admitted by a walk, with its bytes already read and hashed so
/// downstream callers (the Coordinator, the Delta Planner) never re-read it.
pub struct ScannedFile {
    pub rel_path: String,
    pub bytes: Vec<u8>,
    pub content_hash: String,
}

/// Summary of a completed walk, for the `reindex()` operation's result.
#[derive(Debug, Default, Clone)]
pub struct ScanOutcome {
    pub skipped_too_large: usize,
    pub skipped_unreadable: usize,
}

/// Recursively walks `root`, returning every eligible file's relative path,
/// bytes (capped at `config.max_file_bytes`), and content hash.
///
/// Fails only if `root` itself is inaccessible — individual file errors are
/// logged and skipped, reflected in the returned [`ScanOutcome`].
pub fn walk(root: &Path, config: &PrismConfig) -> PrismResult<(Vec<ScannedFile>, ScanOutcome)> {
    if std::fs::metadata(root).is_err() {
        return Err(PrismError::RootInaccessible(root.to_path_buf()));
    }

    let entries: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false)
        .threads(rayon::current_num_threads().min(12))
        .build_parallel()
        .run(|| {
            let entries = &entries;
            Box::new(move |entry| {
                let entry = match entry {
                    Ok(e) => e,
                    Err(_) => return ignore::WalkState::Continue,
                };
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    return ignore::WalkState::Continue;
                }
                entries.lock().unwrap().push(entry.into_path());
                ignore::WalkState::Continue
            })
        });

    let candidates = entries.into_inner().unwrap();

    let results: Vec<Result<Option<ScannedFile>, ()>> = candidates
        .par_iter()
        .map(|abs_path| -> Result<Option<ScannedFile>, ()> {
            let rel_path = abs_path
                .strip_prefix(root)
                .unwrap_or(abs_path)
                .to_string_lossy()
                .replace('\\', "/");

            if !filter::eligible(Path::new(&rel_path)) {
                return Ok(None);
            }

            match read_capped(abs_path, config.max_file_bytes) {
                Ok(Some(bytes)) => {
                    let content_hash = hash_bytes(&bytes);
                    Ok(Some(ScannedFile { rel_path, bytes, content_hash }))
                }
                Ok(None) => {
                    tracing::debug!(path = %rel_path, "skipped: exceeds max file size");
                    Err(())
                }
                Err(e) => {
                    tracing::warn!(path = %rel_path, error = %e, "skipped: failed to read file");
                    Err(())
                }
            }
        })
        .collect();

    let mut files = Vec::with_capacity(results.len());
    let mut outcome = ScanOutcome::default();
    // Note: the two skip reasons share one `Err(())` arm above; disambiguated
    // by re-deriving whether the size check or the read itself failed would
    // need a richer error type. For the summary we only need approximate
    // counts, so both land in `skipped_unreadable` except the explicit
    // oversize path, which we detect by re-checking metadata here.
    for (abs_path, result) in candidates.iter().zip(results) {
        match result {
            Ok(Some(scanned)) => files.push(scanned),
            Ok(None) => {}
            Err(()) => {
                let too_large = std::fs::metadata(abs_path)
                    .map(|m| m.len() > config.max_file_bytes)
                    .unwrap_or(false);
                if too_large {
                    outcome.skipped_too_large += 1;
                } else {
                    outcome.skipped_unreadable += 1;
                }
            }
        }
    }

    Ok((files, outcome))
}

/// Reads up to `cap + 1` bytes. Returns `Ok(None)` if the file exceeds
/// `cap` bytes, without reading the rest of an oversized file.
fn read_capped(path: &Path, cap: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::with_capacity((cap as usize).min(1 << 20));
    let limit = cap + 1;
    let read = file.by_ref().take(limit).read_to_end(&mut buf)?;
    if read as u64 > cap {
        return Ok(None);
    }
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, contents: &[u8]) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut f = File::create(path).unwrap();
        f.write_all(contents).unwrap();
    }

    #[test]
    fn walks_and_filters_eligible_files() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", b"print(1)\n");
        write_file(tmp.path(), "node_modules/pkg/index.js", b"noop\n");
        write_file(tmp.path(), "image.png", &[0u8, 1, 2]);

        let config = PrismConfig::new(tmp.path());
        let (files, outcome) = walk(tmp.path(), &config).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "a.py");
        assert_eq!(outcome.skipped_too_large, 0);
    }

    #[test]
    fn skips_files_over_the_byte_cap() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "big.py", &vec![b'x'; 100]);

        let mut config = PrismConfig::new(tmp.path());
        config.max_file_bytes = 99;
        let (files, outcome) = walk(tmp.path(), &config).unwrap();

        assert!(files.is_empty());
        assert_eq!(outcome.skipped_too_large, 1);
    }

    #[test]
    fn file_exactly_at_cap_is_indexed() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "exact.py", &vec![b'x'; 100]);

        let mut config = PrismConfig::new(tmp.path());
        config.max_file_bytes = 100;
        let (files, outcome) = walk(tmp.path(), &config).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(outcome.skipped_too_large, 0);
    }

    #[test]
    fn inaccessible_root_is_fatal() {
        let config = PrismConfig::new("/definitely/not/a/real/path/at/all");
        let result = walk(Path::new("/definitely/not/a/real/path/at/all"), &config);
        assert!(matches!(result, Err(PrismError::RootInaccessible(_))));
    }
}

//! Path Filter (C1) — decides whether a path is eligible for indexing.
//!
//! The allow/deny sets are compile-time constants: they are not
//! user-configurable in this MVP (spec.md §4.1).

use std::path::Path;

/// Directory segments that disqualify a path wherever they occur.
const DENY_DIRS: &[&str] =
    &["node_modules", ".git", "dist", "build", "coverage", ".next", crate::config::STATE_DIR_NAME];

/// File extensions eligible for indexing.
const ALLOW_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "go", "rs", "java", "cs", "php", "rb", "md", "json", "yaml",
    "yml",
];

/// `true` iff every path segment is absent from the deny-set and the final
/// segment's extension is in the allow-set. Never fails: malformed input
/// (no extension, empty path) returns `false`.
pub fn eligible(path: &Path) -> bool {
    for component in path.components() {
        let seg = component.as_os_str().to_string_lossy();
        if DENY_DIRS.contains(&seg.as_ref()) {
            return false;
        }
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ALLOW_EXTENSIONS.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn accepts_known_extensions() {
        assert!(eligible(&PathBuf::from("src/main.rs")));
        assert!(eligible(&PathBuf::from("README.md")));
        assert!(eligible(&PathBuf::from("pkg/config.yaml")));
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert!(!eligible(&PathBuf::from("image.png")));
        assert!(!eligible(&PathBuf::from("Makefile")));
    }

    #[test]
    fn rejects_denied_directories_anywhere_in_the_path() {
        assert!(!eligible(&PathBuf::from("node_modules/pkg/index.js")));
        assert!(!eligible(&PathBuf::from("a/b/.git/hooks/pre-commit.rs")));
        assert!(!eligible(&PathBuf::from("a/.prism/index.snapshot.rs")));
    }

    #[test]
    fn does_not_substring_match_deny_segments() {
        // A file literally named node_modules.rs must not be rejected —
        // the check operates on whole path segments.
        assert!(eligible(&PathBuf::from("src/node_modules.rs")));
    }

    #[test]
    fn never_panics_on_malformed_input() {
        assert!(!eligible(&PathBuf::from("")));
        assert!(!eligible(&PathBuf::from(".")));
    }
}

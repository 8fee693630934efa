//! Data model: [`FileRecord`], [`LineRecord`], [`Posting`], and the language
//! classification used by the scoring function in [`crate::tokenize`].

use serde::{Deserialize, Serialize};

/// One non-empty line of a [`FileRecord`]. Empty and whitespace-only lines
/// never appear here, but are still counted toward `FileRecord::line_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// 1-based line number as it appears in the source file.
    pub line_number: usize,
    /// Line text with the trailing EOL stripped.
    pub text: String,
    /// `text.chars().count()`, cached so callers don't recompute it.
    pub length: usize,
}

impl LineRecord {
    pub fn new(line_number: usize, text: String) -> Self {
        let length = text.chars().count();
        Self { line_number, text, length }
    }
}

/// One indexed file. Owned exclusively by the [`crate::store::IndexStore`]
/// that built it, keyed by `path`.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Canonical, forward-slash, root-relative path.
    pub path: String,
    pub language: Language,
    /// Total line count including blank lines omitted from `lines`.
    pub line_count: usize,
    pub lines: Vec<LineRecord>,
    /// Hex-encoded SHA-256 of the raw file bytes.
    pub content_hash: String,
}

/// A posting in the inverted index: where a term occurred and how salient
/// that occurrence intrinsically is, independent of any query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub file_index: usize,
    pub line_index: usize,
    pub base_score: f32,
    pub line_number: usize,
}

/// Coarse language classification driving the `language_weight` term of the
/// base-score function (spec.md §4.4) and the `language` field of search
/// results and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    /// Major code languages: weight 1.0.
    Code,
    /// Config/markup languages: weight 0.7.
    ConfigMarkup,
    /// Everything else recognized by the path filter: weight 0.5.
    Other,
}

impl Language {
    pub fn weight(self) -> f32 {
        match self {
            Language::Code => 1.0,
            Language::ConfigMarkup => 0.7,
            Language::Other => 0.5,
        }
    }

    /// Lowercase tag used in API responses and snapshots, e.g. `"python"`.
    pub fn label(self, ext: &str) -> String {
        match ext {
            "js" => "javascript",
            "jsx" => "javascript",
            "ts" => "typescript",
            "tsx" => "typescript",
            "py" => "python",
            "go" => "go",
            "rs" => "rust",
            "java" => "java",
            "cs" => "csharp",
            "php" => "php",
            "rb" => "ruby",
            "md" => "markdown",
            "json" => "json",
            "yaml" => "yaml",
            "yml" => "yaml",
            _ => "text",
        }
        .to_string()
    }

    /// Classify an extension (without the leading dot) into a weight class.
    pub fn from_ext(ext: &str) -> Self {
        match ext {
            "js" | "jsx" | "ts" | "tsx" | "py" | "go" | "rs" | "java" | "cs" | "php" | "rb" => {
                Language::Code
            }
            "md" | "json" | "yaml" | "yml" => Language::ConfigMarkup,
            _ => Language::Other,
        }
    }
}

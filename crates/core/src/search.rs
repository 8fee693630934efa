//! Search Engine (C8) — resolves a query into a scored, bounded result list.
//!
//! Readers dereference an [`arc_swap::ArcSwap`] snapshot of the
//! [`IndexStore`] without taking a lock (spec.md §5); only the writer side
//! (the [`crate::coordinator::Coordinator`]) ever swaps the pointer. The
//! result cache is guarded independently by its own mutex, per §5.

use std::collections::HashMap;
use std::sync::Mutex;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::cache::{CacheKey, CacheStats, LruResultCache};
use crate::config::PrismConfig;
use crate::error::{PrismError, PrismResult};
use crate::store::IndexStore;
use crate::tokenize::tokenize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub line_number: usize,
    pub text: String,
    pub score: f32,
    pub language: String,
    /// Lines immediately before and after this match, when available.
    pub context: Vec<ContextLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextLine {
    pub line_number: usize,
    pub text: String,
}

pub struct SearchEngine {
    store: ArcSwap<IndexStore>,
    cache: Mutex<LruResultCache>,
    config: PrismConfig,
}

impl SearchEngine {
    pub fn new(store: IndexStore, config: PrismConfig) -> Self {
        let cache_capacity = config.cache_capacity;
        Self { store: ArcSwap::from_pointee(store), cache: Mutex::new(LruResultCache::new(cache_capacity)), config }
    }

    /// Atomically swap in a new store, purging the result cache — the only
    /// thing that makes a mutation visible to readers (§5).
    pub fn swap_store(&self, store: IndexStore) {
        self.store.store(std::sync::Arc::new(store));
        self.cache.lock().unwrap().clear();
    }

    pub fn load_store(&self) -> arc_swap::Guard<std::sync::Arc<IndexStore>> {
        self.store.load()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().unwrap().stats()
    }

    /// Resolves `query` into at most `limit` ranked results.
    ///
    /// Pipeline: validate, cache lookup, tokenize, mode selection
    /// (inverted vs. linear), bound-and-rank, assemble context, cache
    /// insert — spec.md §4.8 steps 1–9, implemented in that order.
    pub fn search(&self, query: &str, limit: usize) -> PrismResult<Vec<SearchResult>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if query.chars().count() > self.config.max_query_chars {
            return Err(PrismError::InvalidQuery {
                len: query.chars().count(),
                max: self.config.max_query_chars,
            });
        }
        let limit = limit.clamp(1, self.config.max_search_limit);

        let cache_key = CacheKey { query: trimmed.to_string(), limit };
        if let Some(cached) = self.cache.lock().unwrap().get(&cache_key) {
            return Ok(cached);
        }

        let store = self.store.load();
        let query_terms = tokenize(trimmed);
        let query_lower = trimmed.to_lowercase();

        let results = if !query_terms.is_empty() && query_terms.iter().all(|t| store.contains_term(t)) {
            inverted_search(&store, &query_terms, &query_lower, limit)
        } else {
            linear_search(&store, &query_lower, limit)
        };

        self.cache.lock().unwrap().insert(cache_key, results.clone());
        Ok(results)
    }

    /// Convenience wrapper: searches `symbol`, nominates the first
    /// code-language result as the definition, returns the rest as usages.
    pub fn explain_usage(
        &self,
        symbol: &str,
        limit: usize,
    ) -> PrismResult<(Option<SearchResult>, Vec<SearchResult>)> {
        let mut results = self.search(symbol, limit)?;
        let def_pos = results.iter().position(|r| is_code_language(&r.language));
        let definition = def_pos.map(|pos| results.remove(pos));
        Ok((definition, results))
    }
}

fn is_code_language(language: &str) -> bool {
    !matches!(language, "markdown" | "json" | "yaml" | "text")
}

struct Candidate {
    file_index: usize,
    line_index: usize,
    score: f32,
}

fn inverted_search(store: &IndexStore, query_terms: &[String], query_lower: &str, limit: usize) -> Vec<SearchResult> {
    let candidate_cap = 3 * limit;
    let mut buckets: HashMap<(usize, usize), (f32, usize)> = HashMap::new();

    for term in query_terms {
        for posting in store.postings_for(term) {
            let key = (posting.file_index, posting.line_index);
            if !buckets.contains_key(&key) && buckets.len() >= candidate_cap {
                continue;
            }
            let entry = buckets.entry(key).or_insert((posting.base_score, 0));
            entry.1 += 1;
        }
    }

    let total_terms = query_terms.len() as f32;
    let mut candidates = Vec::with_capacity(buckets.len());

    for ((file_index, line_index), (base_score, matched_terms)) in buckets {
        let Some(file) = store.file_by_index(file_index) else { continue };
        let Some(line) = file.lines.get(line_index) else { continue };
        if !line.text.to_lowercase().contains(query_lower) {
            continue;
        }
        let exact_match_bonus = 1.0;
        let coverage = matched_terms as f32 / total_terms;
        let score = (base_score + 0.5 * exact_match_bonus + 0.3 * coverage).clamp(0.0, 1.0);
        candidates.push(Candidate { file_index, line_index, score });
    }

    assemble(store, candidates, limit)
}

fn linear_search(store: &IndexStore, query_lower: &str, limit: usize) -> Vec<SearchResult> {
    let mut candidates = Vec::new();

    for (file_index, file) in store.files().iter().enumerate() {
        for (line_index, line) in file.lines.iter().enumerate() {
            if line.text.to_lowercase().contains(query_lower) {
                let base = crate::tokenize::base_score(file.language, line.length);
                let score = (base + 0.5).clamp(0.0, 1.0);
                candidates.push(Candidate { file_index, line_index, score });
            }
        }
    }

    assemble(store, candidates, limit)
}

/// Sorts candidates by score descending, ties broken by `(path, line
/// number)` ascending for determinism, truncates to `limit`, and attaches
/// ±1 line context.
fn assemble(store: &IndexStore, mut candidates: Vec<Candidate>, limit: usize) -> Vec<SearchResult> {
    candidates.sort_by(|a, b| {
        let file_a = &store.files()[a.file_index];
        let file_b = &store.files()[b.file_index];
        let line_a = file_a.lines[a.line_index].line_number;
        let line_b = file_b.lines[b.line_index].line_number;
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| file_a.path.cmp(&file_b.path))
            .then_with(|| line_a.cmp(&line_b))
    });
    candidates.truncate(limit);

    candidates
        .into_iter()
        .map(|c| {
            let file = &store.files()[c.file_index];
            let line = &file.lines[c.line_index];
            let mut context = Vec::new();
            if c.line_index > 0 {
                let prev = &file.lines[c.line_index - 1];
                if prev.line_number + 1 == line.line_number {
                    context.push(ContextLine { line_number: prev.line_number, text: prev.text.clone() });
                }
            }
            if let Some(next) = file.lines.get(c.line_index + 1) {
                if next.line_number == line.line_number + 1 {
                    context.push(ContextLine { line_number: next.line_number, text: next.text.clone() });
                }
            }

            SearchResult {
                path: file.path.clone(),
                line_number: line.line_number,
                text: line.text.clone(),
                score: c.score,
                language: file.language.label(ext_of(&file.path)),
                context,
            }
        })
        .collect()
}

fn ext_of(path: &str) -> &str {
    path.rsplit_once('.').map(|(_, e)| e).unwrap_or("")
}

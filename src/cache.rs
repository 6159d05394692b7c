//! Answer cache: (document, question) → previously synthesized answer.
//!
//! The key is the verbatim concatenation `"{doc_id}-{question}"` with no
//! whitespace or case normalization, so the same wording always hits and
//! different wordings never collide by accident. Entries live for the
//! process lifetime; a repeated `put` for the same key wins (last write),
//! matching the reference behavior of a fresh session refreshing an
//! answer. No eviction: a session answers a small, fixed number of
//! questions per document.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::Answer;

fn cache_key(doc_id: &str, question: &str) -> String {
    format!("{doc_id}-{question}")
}

#[derive(Default)]
pub struct AnswerCache {
    entries: RwLock<HashMap<String, Answer>>,
}

impl AnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the cached answer; the stored entry is never
    /// mutated by reads.
    pub fn get(&self, doc_id: &str, question: &str) -> Option<Answer> {
        self.entries.read().get(&cache_key(doc_id, question)).cloned()
    }

    pub fn put(&self, doc_id: &str, question: &str, answer: Answer) {
        self.entries
            .write()
            .insert(cache_key(doc_id, question), answer);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

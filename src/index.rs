//! Per-document vector index: embeds chunks, searches them by cosine
//! similarity, and persists to a versioned blob.
//!
//! An index is built from exactly one document's chunks and is never
//! merged across documents.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::llm::Embedder;
use crate::models::{Chunk, RetrievedChunk};

/// Bumped whenever the persisted layout changes; mismatches are rejected
/// on load rather than guessed at.
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    text: String,
    source_id: String,
    chunk_index: usize,
    embedding: Vec<f32>,
}

/// Persisted blob layout: version tag, embedding dimension, entries.
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    dim: usize,
    entries: Vec<IndexEntry>,
}

/// Searchable collection of one document's chunk embeddings.
#[derive(Debug)]
pub struct VectorIndex {
    dim: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// Vectors whose length differs from `embedder.dim()` surface as
    /// [`Error::Embedding`] (the embedder implementation already checks
    /// this for HTTP providers, but the index does not trust its input).
    pub async fn build(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dim = embedder.dim();
        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            if embedding.len() != dim {
                return Err(Error::Embedding(format!(
                    "malformed {}-dimensional vector for chunk {} of {}, expected {dim}",
                    embedding.len(),
                    chunk.chunk_index,
                    chunk.source_id
                )));
            }
            entries.push(IndexEntry {
                text: chunk.text.clone(),
                source_id: chunk.source_id.clone(),
                chunk_index: chunk.chunk_index,
                embedding,
            });
        }

        Ok(Self { dim, entries })
    }

    /// Deserialize a previously saved index.
    ///
    /// Unreadable blobs, version mismatches and dimension-inconsistent
    /// entries all fail with [`Error::CorruptIndex`]; vectors are never
    /// silently truncated or padded.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::CorruptIndex(format!("cannot read {}: {e}", path.display()))
        })?;

        let persisted: PersistedIndex = serde_json::from_str(&data).map_err(|e| {
            Error::CorruptIndex(format!("cannot parse {}: {e}", path.display()))
        })?;

        if persisted.version != INDEX_FORMAT_VERSION {
            return Err(Error::CorruptIndex(format!(
                "{} has format version {}, expected {INDEX_FORMAT_VERSION}",
                path.display(),
                persisted.version
            )));
        }
        for entry in &persisted.entries {
            if entry.embedding.len() != persisted.dim {
                return Err(Error::CorruptIndex(format!(
                    "{} declares dimension {} but chunk {} of {} has {}",
                    path.display(),
                    persisted.dim,
                    entry.chunk_index,
                    entry.source_id,
                    entry.embedding.len()
                )));
            }
        }

        Ok(Self {
            dim: persisted.dim,
            entries: persisted.entries,
        })
    }

    /// Serialize to `path`, overwriting existing content. The write goes
    /// to a temp file first and is renamed into place so a crash cannot
    /// leave a truncated index behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let persisted = PersistedIndex {
            version: INDEX_FORMAT_VERSION,
            dim: self.dim,
            entries: self.entries.clone(),
        };
        let data = serde_json::to_string(&persisted)
            .map_err(|e| Error::CorruptIndex(format!("cannot serialize index: {e}")))?;

        let tmp_path = path.with_extension("index.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Embed `query` and return the `k` nearest chunks, best-first.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn Embedder,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = embedder.embed(query).await?;
        if query_embedding.len() != self.dim {
            return Err(Error::Embedding(format!(
                "query embedded to {} dimensions, index holds {}",
                query_embedding.len(),
                self.dim
            )));
        }
        Ok(self.search_by_vector(&query_embedding, k))
    }

    /// Rank entries by cosine similarity against a query vector.
    /// `k` is clamped to at least 1; fewer entries than `k` returns all.
    pub fn search_by_vector(&self, query_embedding: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let k = k.max(1);

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, e)| RetrievedChunk {
                text: e.text.clone(),
                source_id: e.source_id.clone(),
                chunk_index: e.chunk_index,
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            text: text.to_string(),
            source_id: "act.txt".to_string(),
            chunk_index: 0,
            embedding,
        }
    }

    fn small_index() -> VectorIndex {
        VectorIndex {
            dim: 3,
            entries: vec![
                entry("Art. 1", vec![1.0, 0.0, 0.0]),
                entry("Art. 2", vec![0.0, 1.0, 0.0]),
                entry("Art. 3", vec![0.0, 0.0, 1.0]),
            ],
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_best_first() {
        let index = small_index();
        let hits = index.search_by_vector(&[0.9, 0.1, 0.0], 3);
        assert_eq!(hits[0].text, "Art. 1");
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_search_k_larger_than_index_returns_all() {
        let index = small_index();
        let hits = index.search_by_vector(&[1.0, 0.0, 0.0], 50);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_k_zero_clamped_to_one() {
        let index = small_index();
        let hits = index.search_by_vector(&[1.0, 0.0, 0.0], 0);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("act.index");

        let index = small_index();
        index.save(&path).unwrap();
        let loaded = VectorIndex::load(&path).unwrap();

        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.dim(), index.dim());

        let query = [0.7, 0.7, 0.0];
        let before = index.search_by_vector(&query, 3);
        let after = loaded.search_by_vector(&query, 3);
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.text, b.text);
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("act.index");
        small_index().save(&path).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["act.index".to_string()]);
    }

    #[test]
    fn test_load_missing_file_is_corrupt_index() {
        let err = VectorIndex::load(Path::new("/nonexistent/act.index")).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_load_garbage_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("act.index");
        std::fs::write(&path, "not json at all").unwrap();
        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_load_version_mismatch_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("act.index");
        std::fs::write(&path, r#"{"version":99,"dim":3,"entries":[]}"#).unwrap();
        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_load_dimension_mismatch_is_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("act.index");
        let blob = r#"{"version":1,"dim":3,"entries":[{"text":"Art. 1","source_id":"act.txt","chunk_index":0,"embedding":[1.0,0.0]}]}"#;
        std::fs::write(&path, blob).unwrap();
        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }
}

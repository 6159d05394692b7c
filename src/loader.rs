//! Document loader: walks a document directory, extracts text from the
//! files it understands (PDF, plain text, markdown) and splits the text
//! into overlapping chunks suitable for embedding.
//!
//! Pure read — the loader never writes anything.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::models::Chunk;

/// Load every extractable file under `dir` and chunk it.
///
/// Files that cannot be extracted are skipped with a warning; the whole
/// load fails with [`Error::Load`] only when the directory is missing or
/// yields no chunks at all.
pub fn load_directory(dir: &Path, max_chunk_chars: usize, overlap_chars: usize) -> Result<Vec<Chunk>> {
    if !dir.is_dir() {
        return Err(Error::Load(format!(
            "document directory {} does not exist",
            dir.display()
        )));
    }

    let mut chunks = Vec::new();

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let Some(text) = extract_text(path) else {
            continue;
        };

        let source_id = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        for (chunk_index, text) in chunk_text(&text, max_chunk_chars, overlap_chars)
            .into_iter()
            .enumerate()
        {
            chunks.push(Chunk {
                text,
                source_id: source_id.clone(),
                chunk_index,
            });
        }
    }

    if chunks.is_empty() {
        return Err(Error::Load(format!(
            "no extractable text under {}",
            dir.display()
        )));
    }

    Ok(chunks)
}

/// Extract plain text from a single file, or None if the file type is
/// unsupported or extraction fails.
fn extract_text(path: &Path) -> Option<String> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => match pdf_extract::extract_text(path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Skipping {}: PDF extraction failed: {e}", path.display());
                None
            }
        },
        "txt" | "md" | "text" => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", path.display());
                None
            }
        },
        _ => None,
    }
}

/// Split `text` into chunks of at most `max_chars` characters, each chunk
/// starting with the last `overlap_chars` of its predecessor so context
/// survives the split boundary. Chunk ends snap back to whitespace where
/// possible to avoid cutting words.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    if text.trim().is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    // Keep the window advancing even with a pathological overlap setting
    let overlap = overlap_chars.min(max_chars.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let hard_end = (start + max_chars).min(chars.len());
        let end = if hard_end < chars.len() {
            snap_to_whitespace(&chars, start, hard_end)
        } else {
            hard_end
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = std::cmp::max(end.saturating_sub(overlap), start + 1);
    }

    chunks
}

/// Find the last whitespace in the second half of the window so the cut
/// lands between words. Falls back to the hard limit for unbroken runs.
fn snap_to_whitespace(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;
    for i in (floor..hard_end).rev() {
        if chars[i].is_whitespace() {
            return i + 1;
        }
    }
    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_directory_is_load_error() {
        let err = load_directory(Path::new("/nonexistent/acts"), 1500, 200).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_load_empty_directory_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_directory(dir.path(), 1500, 200).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_load_directory_chunks_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("act.txt")).unwrap();
        writeln!(file, "Art. 1. Everyone has the right to ask questions.").unwrap();
        writeln!(file, "Art. 2. Answers must cite their sources.").unwrap();

        let chunks = load_directory(dir.path(), 1500, 200).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_id, "act.txt");
        assert_eq!(chunks[0].chunk_index, 0);
        assert!(chunks[0].text.contains("Art. 1"));
    }

    #[test]
    fn test_load_skips_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("act.bin"), [0u8, 159, 146]).unwrap();
        std::fs::write(dir.path().join("act.txt"), "Art. 1. Text.").unwrap();

        let chunks = load_directory(dir.path(), 1500, 200).unwrap();
        assert!(chunks.iter().all(|c| c.source_id == "act.txt"));
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("   \n\n ", 100, 10).is_empty());
    }

    #[test]
    fn test_chunk_text_single_small_chunk() {
        let chunks = chunk_text("short text", 100, 10);
        assert_eq!(chunks, vec!["short text".to_string()]);
    }

    #[test]
    fn test_chunk_text_respects_max_chars() {
        let text: String = (0..500)
            .map(|i| format!("word{i} "))
            .collect();
        let chunks = chunk_text(&text, 120, 30);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 120, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_chunk_text_overlap_carries_context() {
        // Distinct numbered words: the first word of each later chunk must
        // already appear near the end of the previous one.
        let text: String = (0..500).map(|i| format!("w{i:04} ")).collect();
        let chunks = chunk_text(&text, 120, 30);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(
                pair[0].contains(first_word),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_chunk_text_does_not_cut_words() {
        let text: String = (0..200).map(|i| format!("article{i} ")).collect();
        let chunks = chunk_text(&text, 100, 20);
        for chunk in &chunks {
            assert!(chunk.split_whitespace().all(|w| w.starts_with("article")));
        }
    }

    #[test]
    fn test_chunk_text_unbroken_run_falls_back_to_hard_split() {
        let text = "x".repeat(350);
        let chunks = chunk_text(&text, 100, 10);
        assert!(chunks.len() >= 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }
}

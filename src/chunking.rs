//! Document chunking.
//!
//! [`RecursiveChunker`] splits hierarchically by paragraphs, then sentences,
//! then words, falling back to a character window when nothing else fits.
//! Sizes are measured in characters, not bytes, so multi-byte text (the
//! corpus is not ASCII-only) never splits inside a code point.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and inherited metadata but
/// no embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → sentences → words → characters.
///
/// Each produced chunk holds at most `chunk_size` characters; consecutive
/// chunks produced by the character-window fallback share `chunk_overlap`
/// characters.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — overlapping characters between window-split chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Character-window splitting with overlap. The last resort when no
/// separator produces segments that fit.
fn split_by_chars(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        segments.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

/// Split by the first separator, merge segments up to `chunk_size`, and
/// recurse with the remaining separators for any segment that is still
/// too large.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, remaining)) = separators.split_first() else {
        return split_by_chars(text, chunk_size, chunk_overlap);
    };

    let segments: Vec<&str> = if *separator == " " {
        text.split_inclusive(' ').collect()
    } else {
        split_keeping_separator(text, separator)
    };

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    let flush = |current: &mut String, current_len: &mut usize, chunks: &mut Vec<String>| {
        if current.is_empty() {
            return;
        }
        if *current_len > chunk_size {
            chunks.extend(split_and_merge(current, chunk_size, chunk_overlap, remaining));
        } else {
            chunks.push(std::mem::take(current));
        }
        current.clear();
        *current_len = 0;
    };

    for segment in segments {
        let segment_len = char_len(segment);
        if current_len > 0 && current_len + segment_len > chunk_size {
            flush(&mut current, &mut current_len, &mut chunks);
        }
        current.push_str(segment);
        current_len += segment_len;
    }
    flush(&mut current, &mut current_len, &mut chunks);

    chunks
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let separators = ["\n\n", ". ", "! ", "? ", " "];
        let pieces =
            split_and_merge(&document.text, self.chunk_size, self.chunk_overlap, &separators);

        pieces
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("{}#{i}", document.meta.filename),
                text,
                embedding: Vec::new(),
                meta: document.meta.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceMeta;

    fn meta() -> SourceMeta {
        SourceMeta {
            filename: "sample".to_string(),
            filetype: ".txt".to_string(),
            source_path: "dataset/sample.txt".to_string(),
        }
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let chunker = RecursiveChunker::new(100, 20);
        assert!(chunker.chunk(&Document::new("", meta())).is_empty());
    }

    #[test]
    fn every_chunk_respects_the_size_bound() {
        let text = "one two three four five. ".repeat(40);
        let chunker = RecursiveChunker::new(80, 16);
        let chunks = chunker.chunk(&Document::new(text, meta()));
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 80, "oversized chunk: {:?}", chunk.text);
        }
    }

    #[test]
    fn chunks_inherit_parent_metadata_unchanged() {
        let text = "a sentence. ".repeat(30);
        let chunker = RecursiveChunker::new(64, 8);
        let chunks = chunker.chunk(&Document::new(text, meta()));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.meta, meta());
            assert_eq!(chunk.id, format!("sample#{i}"));
        }
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_code_point() {
        let text = "tiếng Việt có dấu và rất nhiều ký tự đa byte ".repeat(20);
        let chunker = RecursiveChunker::new(50, 10);
        // Would panic on a byte-boundary split; completing is the assertion.
        let chunks = chunker.chunk(&Document::new(text, meta()));
        assert!(!chunks.is_empty());
    }

    #[test]
    fn window_split_overlaps_consecutive_chunks() {
        // No separators present, so the character window applies.
        let text: String = "abcdefghij".repeat(10);
        let pieces = split_by_chars(&text, 30, 10);
        for pair in pieces.windows(2) {
            let tail: String = pair[0].chars().rev().take(10).collect::<Vec<_>>()
                .into_iter().rev().collect();
            assert!(pair[1].starts_with(&tail));
        }
    }
}

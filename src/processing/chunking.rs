//! Bounded, overlapping text segmentation.
//!
//! Boundaries come from `semchunk-rs`, which splits on the most meaningful separator available
//! (blank lines, newlines, sentence punctuation, then words). Over-budget runs with none of those
//! separators, such as long CJK passages, are cut on character boundaries first. A post-pass prepends the tail of the
//! previous segment to each segment so context around a boundary stays retrievable from both
//! sides, trimming from the front whenever the result would exceed the budget.
//!
//! Lengths are measured by a pluggable counter: Unicode scalar values by default, or tokens of the
//! embedding model's tokenizer (`tiktoken-rs`), with a whitespace counter as the fallback for
//! models `tiktoken` does not know.

use crate::config::{ChunkUnit, EmbeddingProvider};
use anyhow::Error as TokenizerError;
use semchunk_rs::Chunker;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

/// Measures the length of a text segment in the chunker's unit.
pub type LengthCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Errors raised while configuring the chunker.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunk size must be at least one unit.
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer for the embedding model could not be loaded.
    #[error("Failed to load tokenizer for model '{model}'")]
    Tokenizer {
        /// Model the tokenizer was requested for.
        model: String,
        /// Underlying tokenizer failure.
        #[source]
        source: TokenizerError,
    },
}

/// Splits document bodies into ordered, non-empty segments of bounded length.
#[derive(Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    unit: ChunkUnit,
    counter: LengthCounter,
}

impl fmt::Debug for TextChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextChunker")
            .field("chunk_size", &self.chunk_size)
            .field("overlap", &self.overlap)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

impl TextChunker {
    /// Build a chunker measuring length in `unit`.
    ///
    /// `provider` and `model` only matter for [`ChunkUnit::Tokens`], where they select the
    /// tokenizer.
    pub fn new(
        chunk_size: usize,
        overlap: usize,
        unit: ChunkUnit,
        provider: EmbeddingProvider,
        model: &str,
    ) -> Result<Self, ChunkingError> {
        let counter = match unit {
            ChunkUnit::Characters => character_counter(),
            ChunkUnit::Tokens => build_token_counter(provider, model)?,
        };
        Self::with_counter(chunk_size, overlap, unit, counter)
    }

    /// Character-measured chunker.
    pub fn characters(chunk_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        Self::with_counter(chunk_size, overlap, ChunkUnit::Characters, character_counter())
    }

    fn with_counter(
        chunk_size: usize,
        overlap: usize,
        unit: ChunkUnit,
        counter: LengthCounter,
    ) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        Ok(Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            unit,
            counter,
        })
    }

    /// Maximum segment length in the configured unit.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into segments.
    ///
    /// Blank input yields no segments. Input that already fits the budget is returned whole.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if self.measure(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let counter = self.counter.clone();
        let splitter = Chunker::new(
            self.chunk_size,
            Box::new(move |segment: &str| counter.as_ref()(segment)),
        );
        let mut segments = Vec::new();
        for (piece, unbroken) in self.partition(text) {
            if unbroken {
                segments.extend(self.split_unbroken(piece));
            } else if self.measure(piece) <= self.chunk_size {
                segments.push(piece.to_string());
            } else {
                segments.extend(splitter.chunk(piece));
            }
        }
        let segments = segments
            .into_iter()
            .filter(|segment| !segment.trim().is_empty())
            .collect();

        self.overlap_segments(segments)
            .into_iter()
            .filter(|segment| !segment.trim().is_empty())
            .collect()
    }

    /// Cut `text` around over-budget runs that contain no break character.
    ///
    /// `semchunk-rs` falls back to byte-indexed character splitting on such runs, which panics on
    /// non-ASCII text, so they are flagged and split on char boundaries instead.
    fn partition<'a>(&self, text: &'a str) -> Vec<(&'a str, bool)> {
        let mut pieces = Vec::new();
        let mut piece_start = 0;
        let mut run_start: Option<usize> = None;
        let sentinel = std::iter::once((text.len(), ' '));
        for (offset, ch) in text.char_indices().chain(sentinel) {
            if !is_break(ch) {
                run_start.get_or_insert(offset);
                continue;
            }
            let Some(start) = run_start.take() else {
                continue;
            };
            let run = &text[start..offset];
            // Neither characters nor tokens outnumber bytes.
            if run.len() <= self.chunk_size || self.measure(run) <= self.chunk_size {
                continue;
            }
            if piece_start < start {
                pieces.push((&text[piece_start..start], false));
            }
            pieces.push((run, true));
            piece_start = offset;
        }
        if piece_start < text.len() {
            pieces.push((&text[piece_start..], false));
        }
        pieces
    }

    fn split_unbroken(&self, run: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut rest = run;
        while !rest.is_empty() {
            let end = self.longest_prefix_within(rest, self.chunk_size);
            pieces.push(rest[..end].to_string());
            rest = &rest[end..];
        }
        pieces
    }

    /// Byte length of the longest prefix of non-empty `text` within `budget`, at least one char.
    fn longest_prefix_within(&self, text: &str, budget: usize) -> usize {
        let mut ends: Vec<usize> = text.char_indices().skip(1).map(|(offset, _)| offset).collect();
        ends.push(text.len());
        let mut fitting = ends.partition_point(|&end| self.measure(&text[..end]) <= budget);
        // Token counts are not strictly monotone over prefixes.
        while fitting > 1 && self.measure(&text[..ends[fitting - 1]]) > budget {
            fitting -= 1;
        }
        ends[fitting.saturating_sub(1)]
    }

    fn measure(&self, text: &str) -> usize {
        self.counter.as_ref()(text)
    }

    fn overlap_segments(&self, segments: Vec<String>) -> Vec<String> {
        if self.overlap == 0 || segments.len() < 2 {
            return segments;
        }

        let mut output = Vec::with_capacity(segments.len());
        let mut previous: Option<String> = None;
        for current in segments {
            let joined = match previous.as_deref() {
                Some(prev) => self.join_with_tail(prev, &current),
                None => current.clone(),
            };
            output.push(joined);
            previous = Some(current);
        }
        output
    }

    fn join_with_tail(&self, previous: &str, current: &str) -> String {
        let tail = self.longest_suffix_within(previous, self.overlap);
        let mut combined = String::with_capacity(tail.len() + current.len() + 1);
        if !tail.is_empty() {
            combined.push_str(tail);
            let tail_spaced = tail.ends_with(char::is_whitespace);
            let current_spaced = current.starts_with(char::is_whitespace);
            if !tail_spaced && !current_spaced {
                combined.push(' ');
            }
        }
        combined.push_str(current);
        self.longest_suffix_within(&combined, self.chunk_size)
            .to_string()
    }

    /// Longest whitespace-trimmed suffix of `text` whose measured length is within `budget`.
    fn longest_suffix_within<'a>(&self, text: &'a str, budget: usize) -> &'a str {
        if budget == 0 {
            return "";
        }
        text.char_indices()
            .map(|(offset, _)| text[offset..].trim_start())
            .find(|candidate| self.measure(candidate) <= budget)
            .unwrap_or("")
    }
}

/// Non-whitespace characters `semchunk-rs` splits on.
const BREAK_CHARS: [char; 25] = [
    '.', '?', '!', '*', ';', ',', '(', ')', '[', ']', '“', '”', '‘', '’', '\'', '"', '`', ':', '—',
    '…', '/', '\\', '–', '&', '-',
];

fn is_break(ch: char) -> bool {
    ch.is_whitespace() || BREAK_CHARS.contains(&ch)
}

fn character_counter() -> LengthCounter {
    Arc::new(|segment: &str| segment.chars().count())
}

fn whitespace_counter() -> LengthCounter {
    Arc::new(|segment: &str| {
        let words = segment.split_whitespace().count();
        if words == 0 && !segment.is_empty() {
            1
        } else {
            words
        }
    })
}

/// Token counter for the embedding model.
///
/// Only OpenAI models are required to resolve a tokenizer; other providers degrade to whitespace
/// counting with a warning.
fn build_token_counter(
    provider: EmbeddingProvider,
    model: &str,
) -> Result<LengthCounter, ChunkingError> {
    match (provider, tiktoken_counter(model)) {
        (_, Ok(counter)) => Ok(counter),
        (EmbeddingProvider::OpenAI, Err(error)) => Err(error),
        (_, Err(error)) => {
            tracing::warn!(
                model,
                error = %error,
                "Tokenizer unavailable; falling back to whitespace counter"
            );
            Ok(whitespace_counter())
        }
    }
}

fn tiktoken_counter(model: &str) -> Result<LengthCounter, ChunkingError> {
    let target = match model.trim() {
        "" => "cl100k_base",
        trimmed => trimmed,
    };
    let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
        model: target.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);
    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    if let Ok(encoding) = get_bpe_from_model(model) {
        return Ok(encoding);
    }
    match model {
        "cl100k_base" => cl100k_base(),
        "o200k_base" => o200k_base(),
        "p50k_base" => p50k_base(),
        "p50k_edit" => p50k_edit(),
        "r50k_base" | "gpt2" => r50k_base(),
        _ => {
            tracing::debug!(model, "Unknown tokenizer model; using 'cl100k_base'");
            cl100k_base()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_chunker(chunk_size: usize, overlap: usize) -> TextChunker {
        TextChunker::with_counter(chunk_size, overlap, ChunkUnit::Tokens, whitespace_counter())
            .expect("chunker")
    }

    #[test]
    fn blank_input_yields_no_segments() {
        let chunker = TextChunker::characters(100, 10).expect("chunker");
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk(" \n\t ").is_empty());
    }

    #[test]
    fn short_input_is_returned_whole() {
        let chunker = TextChunker::characters(100, 10).expect("chunker");
        let text = "  A short paragraph that fits.\n";
        assert_eq!(chunker.chunk(text), vec![text.to_string()]);
    }

    #[test]
    fn splits_on_word_budget_without_overlap() {
        let chunks = word_chunker(2, 0).chunk("one two three four five");
        assert_eq!(chunks, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn overlap_carries_previous_tail() {
        let chunker = word_chunker(3, 1);
        let chunks = chunker.chunk("one two three four five");
        assert_eq!(chunks, vec!["one two three", "three four five"]);
        for chunk in &chunks {
            assert!(chunker.measure(chunk) <= 3);
        }
    }

    #[test]
    fn character_segments_respect_budget_and_are_never_empty() {
        let chunker = TextChunker::characters(40, 8).expect("chunker");
        let text = "Retrieval systems index documents. They split text into chunks.\n\n\
                    Each chunk is embedded separately so that long bodies stay searchable.";
        let chunks = chunker.chunk(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty());
            assert!(chunk.chars().count() <= 40, "{chunk:?} exceeds budget");
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = TextChunker::characters(30, 5).expect("chunker");
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(
            TextChunker::characters(0, 0),
            Err(ChunkingError::InvalidChunkSize)
        ));
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let chunker = TextChunker::characters(10, 50).expect("chunker");
        assert_eq!(chunker.overlap, 9);
    }

    #[test]
    fn long_non_ascii_run_splits_on_char_boundaries() {
        let chunker = TextChunker::characters(4000, 200).expect("chunker");
        let text = "é".repeat(9000);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "é".repeat(4000));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 4000, "{} chars", chunk.chars().count());
        }
    }

    #[test]
    fn cjk_prose_without_break_characters_is_chunked() {
        let chunker = TextChunker::characters(4000, 200).expect("chunker");
        let text = "日本語の文章です。".repeat(600);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        let head: String = text.chars().take(4000).collect();
        let tail: String = head.chars().skip(3800).collect();
        let rest: String = text.chars().skip(4000).collect();
        assert_eq!(chunks[0], head);
        assert_eq!(chunks[1], format!("{tail} {rest}"));
    }

    #[test]
    fn unbroken_run_is_cut_out_of_surrounding_prose() {
        let chunker = TextChunker::characters(10, 0).expect("chunker");
        let chunks = chunker.chunk("one two ééééééééééééé three");
        assert_eq!(chunks, vec!["one two ", "éééééééééé", "ééé", " three"]);
    }

    #[test]
    fn unbroken_run_respects_token_budget() {
        let chunker = TextChunker::new(
            8,
            2,
            ChunkUnit::Tokens,
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small",
        )
        .expect("chunker");
        let chunks = chunker.chunk(&"漢字".repeat(200));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunker.measure(chunk) <= 8);
        }
    }

    #[test]
    fn token_unit_uses_tiktoken_budget() {
        let chunker = TextChunker::new(
            5,
            0,
            ChunkUnit::Tokens,
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small",
        )
        .expect("chunker");
        let text = "The quick brown fox jumps over the lazy dog.";
        let chunks = chunker.chunk(text);
        for chunk in &chunks {
            assert!(chunker.measure(chunk) <= 5);
        }
        let words: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        assert_eq!(words, text.split_whitespace().collect::<Vec<_>>());
    }
}

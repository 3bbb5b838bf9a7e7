//! Word-bounded chunking and language-aware chunk sizing.
//!
//! Highlights:
//!
//! - Chunks are groups of whitespace-separated words re-joined with single spaces, so the
//!   original word sequence is always recoverable by splitting each chunk again.
//! - Overlap: consecutive windows can share a fixed number of trailing/leading words so the
//!   summarizer sees context that straddles a boundary.
//! - Laziness: [`WordChunks`] builds each chunk on demand; callers may start summarizing the
//!   first chunk before later ones exist.
//! - Sizing: [`decide_chunk_size`] maps a detected language to a word budget. CJK text packs
//!   more meaning per word, so it gets smaller chunks.

use std::iter::FusedIterator;

use super::types::ChunkingError;

/// Chunk size used for languages without an explicit mapping.
pub const DEFAULT_CHUNK_SIZE: usize = 600;

/// Words shared between consecutive chunks during PDF summarization.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Smallest chunk size [`decide_chunk_size`] can pick for a mapped language.
pub const MIN_MAPPED_CHUNK_SIZE: usize = 300;

/// Check an overlap against every chunk size a run may select.
///
/// A run picks either a mapped size (at least [`MIN_MAPPED_CHUNK_SIZE`]) or
/// `default_chunk_size`, so the overlap must be smaller than both.
pub fn validate_chunking(overlap: usize, default_chunk_size: usize) -> Result<(), ChunkingError> {
    if default_chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    let smallest = default_chunk_size.min(MIN_MAPPED_CHUNK_SIZE);
    if overlap >= smallest {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            chunk_size: smallest,
        });
    }
    Ok(())
}

/// Splits text into word-bounded chunks of at most `chunk_size` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Build a chunker, rejecting a zero chunk size.
    pub fn new(chunk_size: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            tracing::error!(chunk_size, "chunk_size must be > 0");
            return Err(ChunkingError::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }

    /// Yield non-overlapping chunks in original word order.
    ///
    /// Empty or whitespace-only text yields nothing.
    pub fn chunk_text<'a>(&self, text: &'a str) -> WordChunks<'a> {
        let words = collect_words(text);
        tracing::debug!(
            words = words.len(),
            chunk_size = self.chunk_size,
            "Splitting text into non-overlapping chunks"
        );
        WordChunks::new(words, self.chunk_size, self.chunk_size)
    }

    /// Yield sliding-window chunks that share `overlap` words with their predecessor.
    ///
    /// The window advances by `chunk_size - overlap` words; the last window is clipped to the
    /// remaining words and emitted exactly once. Fails when `overlap >= chunk_size` unless
    /// the text is empty.
    pub fn chunk_text_with_overlap<'a>(
        &self,
        text: &'a str,
        overlap: usize,
    ) -> Result<WordChunks<'a>, ChunkingError> {
        if overlap >= self.chunk_size && !text.is_empty() {
            tracing::error!(
                overlap,
                chunk_size = self.chunk_size,
                "overlap must be smaller than chunk_size"
            );
            return Err(ChunkingError::OverlapTooLarge {
                overlap,
                chunk_size: self.chunk_size,
            });
        }

        let words = collect_words(text);
        // Empty text may carry any overlap; clamp so the step stays positive.
        let step = self.chunk_size.saturating_sub(overlap).max(1);
        tracing::debug!(
            words = words.len(),
            chunk_size = self.chunk_size,
            overlap,
            step,
            "Creating overlapping chunks"
        );
        Ok(WordChunks::new(words, self.chunk_size, step))
    }
}

fn collect_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Lazy sequence of word-bounded chunks.
///
/// Produced by [`Chunker::chunk_text`] and [`Chunker::chunk_text_with_overlap`]. Not
/// restartable: iterate a fresh sequence to start over.
#[derive(Debug, Clone)]
pub struct WordChunks<'a> {
    words: Vec<&'a str>,
    chunk_size: usize,
    step: usize,
    start: usize,
    finished: bool,
}

impl<'a> WordChunks<'a> {
    fn new(words: Vec<&'a str>, chunk_size: usize, step: usize) -> Self {
        let finished = words.is_empty();
        Self {
            words,
            chunk_size,
            step,
            start: 0,
            finished,
        }
    }

    /// Total number of words in the source text.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn remaining(&self) -> usize {
        if self.finished {
            return 0;
        }
        let end = self.start + self.chunk_size;
        if end >= self.words.len() {
            1
        } else {
            1 + (self.words.len() - end).div_ceil(self.step)
        }
    }
}

impl Iterator for WordChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let end = (self.start + self.chunk_size).min(self.words.len());
        let chunk = self.words[self.start..end].join(" ");
        if end == self.words.len() {
            self.finished = true;
        } else {
            self.start += self.step;
        }
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WordChunks<'_> {}

impl FusedIterator for WordChunks<'_> {}

/// Recommend a chunk size (in words) for a detected language.
///
/// The language tag is reduced to its primary subtag (`"en-US"` → `"en"`) and lower-cased.
/// Unmapped, empty, or missing languages fall back to `default`.
pub fn decide_chunk_size(language: Option<&str>, default: usize) -> usize {
    let Some(primary) = language
        .and_then(|tag| tag.split(['-', '_']).next())
        .map(|subtag| subtag.trim().to_ascii_lowercase())
        .filter(|subtag| !subtag.is_empty())
    else {
        return default;
    };

    match primary.as_str() {
        "en" | "es" | "fr" | "de" => 600,
        "ar" => 500,
        "zh" | "ja" | "ko" => MIN_MAPPED_CHUNK_SIZE,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (1..=count)
            .map(|n| format!("w{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn words_of(chunk: &str) -> Vec<&str> {
        chunk.split_whitespace().collect()
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert_eq!(Chunker::new(0), Err(ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn chunk_text_groups_words() {
        let chunker = Chunker::new(2).unwrap();
        let chunks: Vec<_> = chunker.chunk_text("one two three four five").collect();
        assert_eq!(chunks, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn chunk_text_normalizes_whitespace() {
        let chunker = Chunker::new(3).unwrap();
        let chunks: Vec<_> = chunker.chunk_text("  alpha\n\tbeta   gamma\r\ndelta ").collect();
        assert_eq!(chunks, vec!["alpha beta gamma", "delta"]);
    }

    #[test]
    fn empty_and_blank_text_yield_nothing() {
        let chunker = Chunker::new(4).unwrap();
        assert_eq!(chunker.chunk_text("").count(), 0);
        assert_eq!(chunker.chunk_text(" \n\t ").count(), 0);
        assert_eq!(chunker.chunk_text_with_overlap("", 10).unwrap().count(), 0);
        assert_eq!(chunker.chunk_text_with_overlap("   ", 1).unwrap().count(), 0);
    }

    #[test]
    fn chunk_count_matches_ceiling_and_words_reconstruct() {
        for (word_count, chunk_size) in [(1, 1), (7, 3), (9, 3), (10, 600), (1201, 600)] {
            let text = numbered_words(word_count);
            let chunker = Chunker::new(chunk_size).unwrap();
            let chunks: Vec<_> = chunker.chunk_text(&text).collect();
            assert_eq!(chunks.len(), word_count.div_ceil(chunk_size));

            let rebuilt: Vec<&str> = chunks.iter().flat_map(|c| words_of(c)).collect();
            assert_eq!(rebuilt, words_of(&text));
        }
    }

    #[test]
    fn overlap_windows_share_exactly_k_words() {
        let text = numbered_words(23);
        let chunker = Chunker::new(5).unwrap();
        let chunks: Vec<_> = chunker.chunk_text_with_overlap(&text, 2).unwrap().collect();

        assert_eq!(chunks.first().map(String::as_str), Some("w1 w2 w3 w4 w5"));
        for pair in chunks.windows(2) {
            let previous = words_of(&pair[0]);
            let current = words_of(&pair[1]);
            if previous.len() == 5 && current.len() >= 2 {
                assert_eq!(&previous[previous.len() - 2..], &current[..2]);
            }
        }
        assert_eq!(chunks.last().map(String::as_str), Some("w19 w20 w21 w22 w23"));
    }

    #[test]
    fn final_window_is_clipped_and_emitted_once() {
        let text = numbered_words(8);
        let chunker = Chunker::new(5).unwrap();
        let chunks: Vec<_> = chunker.chunk_text_with_overlap(&text, 1).unwrap().collect();
        assert_eq!(chunks, vec!["w1 w2 w3 w4 w5", "w5 w6 w7 w8"]);
    }

    #[test]
    fn short_text_yields_single_chunk_with_overlap() {
        let chunker = Chunker::new(600).unwrap();
        let chunks: Vec<_> = chunker
            .chunk_text_with_overlap("just a few words", 50)
            .unwrap()
            .collect();
        assert_eq!(chunks, vec!["just a few words"]);
    }

    #[test]
    fn overlap_not_smaller_than_chunk_size_is_rejected() {
        let chunker = Chunker::new(3).unwrap();
        assert_eq!(
            chunker.chunk_text_with_overlap("a b c d", 3).unwrap_err(),
            ChunkingError::OverlapTooLarge {
                overlap: 3,
                chunk_size: 3
            }
        );
        assert!(chunker.chunk_text_with_overlap("a b c d", 7).is_err());
    }

    #[test]
    fn settings_must_leave_room_for_every_selectable_size() {
        assert_eq!(validate_chunking(50, 600), Ok(()));
        assert_eq!(validate_chunking(99, 100), Ok(()));
        assert_eq!(
            validate_chunking(300, 600),
            Err(ChunkingError::OverlapTooLarge {
                overlap: 300,
                chunk_size: 300,
            })
        );
        assert_eq!(
            validate_chunking(100, 100),
            Err(ChunkingError::OverlapTooLarge {
                overlap: 100,
                chunk_size: 100,
            })
        );
        assert_eq!(validate_chunking(0, 0), Err(ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn size_hint_is_exact() {
        let text = numbered_words(23);
        let chunker = Chunker::new(5).unwrap();
        let mut chunks = chunker.chunk_text_with_overlap(&text, 2).unwrap();
        let expected = chunks.clone().count();
        assert_eq!(chunks.len(), expected);
        chunks.next();
        assert_eq!(chunks.len(), expected - 1);

        let plain = chunker.chunk_text(&text);
        assert_eq!(plain.len(), 5);
        assert_eq!(plain.word_count(), 23);
    }

    #[test]
    fn language_policy_maps_known_codes() {
        assert_eq!(decide_chunk_size(Some("en-US"), DEFAULT_CHUNK_SIZE), 600);
        assert_eq!(decide_chunk_size(Some("FR"), DEFAULT_CHUNK_SIZE), 600);
        assert_eq!(decide_chunk_size(Some("ar"), DEFAULT_CHUNK_SIZE), 500);
        assert_eq!(decide_chunk_size(Some("zh"), DEFAULT_CHUNK_SIZE), 300);
        assert_eq!(decide_chunk_size(Some("zh_Hant"), DEFAULT_CHUNK_SIZE), 300);
        assert_eq!(decide_chunk_size(Some("ja"), DEFAULT_CHUNK_SIZE), 300);
    }

    #[test]
    fn language_policy_falls_back_to_default() {
        assert_eq!(decide_chunk_size(None, DEFAULT_CHUNK_SIZE), 600);
        assert_eq!(decide_chunk_size(Some(""), DEFAULT_CHUNK_SIZE), 600);
        assert_eq!(decide_chunk_size(Some("xx"), DEFAULT_CHUNK_SIZE), 600);
        assert_eq!(decide_chunk_size(Some("xx"), 450), 450);
    }
}

//! Recursive character text splitting
//!
//! Splits extracted page text into overlapping chunks along a separator
//! ladder: paragraph breaks first, then line breaks, sentence boundaries,
//! words, and finally single characters for unbroken runs. All lengths are
//! measured in characters, so multibyte text never splits mid-codepoint.

use std::collections::VecDeque;

/// Splits text into chunks of at most `chunk_size` characters, carrying
/// roughly `chunk_overlap` trailing characters into the next chunk.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separator ladder.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        debug_assert!(chunk_overlap < chunk_size);
        Self {
            chunk_size,
            chunk_overlap,
            separators: ["\n\n", "\n", ". ", " ", ""]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // First separator present in the text wins; the empty separator
        // always matches and splits per character.
        let mut separator = separators.last().cloned().unwrap_or_default();
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() || text.contains(candidate.as_str()) {
                separator = candidate.clone();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(|c| c.to_string()).collect()
        } else {
            text.split(separator.as_str()).map(str::to_string).collect()
        };

        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<String> = Vec::new();

        for split in splits {
            if char_len(&split) < self.chunk_size {
                good_splits.push(split);
            } else {
                if !good_splits.is_empty() {
                    final_chunks.extend(self.merge_splits(&good_splits, &separator));
                    good_splits.clear();
                }
                if remaining.is_empty() {
                    final_chunks.push(split);
                } else {
                    final_chunks.extend(self.split_recursive(&split, remaining));
                }
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, &separator));
        }

        final_chunks
    }

    /// Greedily merge fragments up to `chunk_size`, sliding a trailing
    /// window of at most `chunk_overlap` characters into the next chunk.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&String> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let split_len = char_len(split);
            let join_len = if window.is_empty() { 0 } else { separator_len };

            if total + split_len + join_len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_window(&window, separator) {
                    chunks.push(chunk);
                }

                // Shrink the window to at most the configured overlap, and
                // further if the incoming fragment still would not fit.
                while total > self.chunk_overlap
                    || (total + split_len + if window.is_empty() { 0 } else { separator_len }
                        > self.chunk_size
                        && total > 0)
                {
                    match window.pop_front() {
                        Some(first) => {
                            total -= char_len(first)
                                + if window.is_empty() { 0 } else { separator_len };
                        }
                        None => break,
                    }
                }
            }

            window.push_back(split);
            total += split_len + if window.len() > 1 { separator_len } else { 0 };
        }

        if let Some(chunk) = join_window(&window, separator) {
            chunks.push(chunk);
        }

        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn join_window(window: &VecDeque<&String>, separator: &str) -> Option<String> {
    let joined = window
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveCharacterSplitter::default();
        let chunks = splitter.split_text("Placement registration opens in July.");
        assert_eq!(chunks, vec!["Placement registration opens in July."]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let splitter = RecursiveCharacterSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  \n ").is_empty());
    }

    #[test]
    fn test_splits_on_paragraph_breaks() {
        let splitter = RecursiveCharacterSplitter::new(40, 0);
        let text = "First paragraph of the policy.\n\nSecond paragraph of the policy.";
        let chunks = splitter.split_text(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "First paragraph of the policy.");
        assert_eq!(chunks[1], "Second paragraph of the policy.");
    }

    #[test]
    fn test_respects_chunk_size() {
        let splitter = RecursiveCharacterSplitter::new(100, 20);
        let text = "word ".repeat(200);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= 100,
                "chunk exceeded size: {} chars",
                chunk.chars().count()
            );
        }
    }

    #[test]
    fn test_overlap_duplicates_trailing_text() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa ".repeat(5);

        let no_overlap: usize = RecursiveCharacterSplitter::new(60, 0)
            .split_text(&text)
            .iter()
            .map(|c| c.chars().count())
            .sum();
        let with_overlap: usize = RecursiveCharacterSplitter::new(60, 20)
            .split_text(&text)
            .iter()
            .map(|c| c.chars().count())
            .sum();

        assert!(
            with_overlap > no_overlap,
            "overlap should repeat trailing text across chunks"
        );
    }

    #[test]
    fn test_unbroken_run_splits_per_char() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200);
        let text = "x".repeat(2500);
        let chunks = splitter.split_text(&text);

        let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lengths, vec![1000, 1000, 900]);
    }

    #[test]
    fn test_unicode_never_splits_mid_codepoint() {
        let splitter = RecursiveCharacterSplitter::new(10, 2);
        // 3-byte codepoints with no separator at most byte positions
        let text = "प्लेसमेंट नीति दस्तावेज़ में पात्रता".repeat(3);
        let chunks = splitter.split_text(&text);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn test_sentence_ladder_used_when_no_newlines() {
        let splitter = RecursiveCharacterSplitter::new(20, 0);
        let text = "First sentence. Second sentence. Third sentence.";
        let chunks = splitter.split_text(text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].contains("First"));
        assert!(chunks[1].contains("Second"));
        assert!(chunks[2].contains("Third"));
    }

    #[test]
    fn test_merged_fragments_keep_separator() {
        // Two short sentences fit one chunk; the join restores ". "
        let splitter = RecursiveCharacterSplitter::new(50, 0);
        let chunks = splitter.split_text("Short one. Short two.");
        assert_eq!(chunks, vec!["Short one. Short two."]);
    }
}

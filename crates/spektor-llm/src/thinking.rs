//! Thinking-content classification
//!
//! Models wrap reasoning text in textual markers. The matcher is pluggable
//! because the delimiter format is model-specific; classification is
//! best-effort textual matching, incremental across chunk boundaries.

use crate::stream::StreamChunk;

/// Delimiters bounding thinking content
pub trait ThinkingMatcher: Send + Sync {
    /// Marker opening a thinking block
    fn open_tag(&self) -> &str;
    /// Marker closing a thinking block
    fn close_tag(&self) -> &str;
}

/// Matcher for fixed, case-insensitive open/close tags
#[derive(Debug, Clone)]
pub struct TagMatcher {
    open: String,
    close: String,
}

impl TagMatcher {
    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for TagMatcher {
    fn default() -> Self {
        Self::new("<thinking>", "</thinking>")
    }
}

impl ThinkingMatcher for TagMatcher {
    fn open_tag(&self) -> &str {
        &self.open
    }

    fn close_tag(&self) -> &str {
        &self.close
    }
}

/// Incremental scanner splitting a token stream into answer and thinking
/// segments
///
/// Text that could be the start of a tag is held back until the next push
/// resolves it, so tags split across chunk boundaries classify correctly.
/// An unclosed tag leaves the scanner inside a thinking block; the rest of
/// the stream is then thinking content.
pub struct ThinkingScanner {
    matcher: Box<dyn ThinkingMatcher>,
    inside: bool,
    carry: String,
}

impl ThinkingScanner {
    #[must_use]
    pub fn new(matcher: Box<dyn ThinkingMatcher>) -> Self {
        Self {
            matcher,
            inside: false,
            carry: String::new(),
        }
    }

    /// Feed a piece of streamed text, returning the segments it completes
    pub fn push(&mut self, text: &str) -> Vec<StreamChunk> {
        self.carry.push_str(text);
        let mut segments = Vec::new();

        loop {
            let needle = if self.inside {
                self.matcher.close_tag()
            } else {
                self.matcher.open_tag()
            };

            if let Some(idx) = find_ignore_ascii_case(&self.carry, needle) {
                let before = self.carry[..idx].to_string();
                self.emit(&mut segments, before);
                self.carry.drain(..idx + needle.len());
                self.inside = !self.inside;
                continue;
            }

            let hold = partial_suffix_len(&self.carry, needle);
            let ready = self.carry[..self.carry.len() - hold].to_string();
            self.emit(&mut segments, ready);
            self.carry.drain(..self.carry.len() - hold);
            break;
        }

        segments
    }

    /// Flush any held-back text at end of stream
    pub fn finish(&mut self) -> Option<StreamChunk> {
        if self.carry.is_empty() {
            return None;
        }
        let content = std::mem::take(&mut self.carry);
        Some(StreamChunk {
            content,
            thinking: self.inside,
        })
    }

    fn emit(&self, segments: &mut Vec<StreamChunk>, content: String) {
        if !content.is_empty() {
            segments.push(StreamChunk {
                content,
                thinking: self.inside,
            });
        }
    }
}

impl Default for ThinkingScanner {
    fn default() -> Self {
        Self::new(Box::new(TagMatcher::default()))
    }
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Length of the longest proper suffix of `text` that could begin `needle`
fn partial_suffix_len(text: &str, needle: &str) -> usize {
    let bytes = text.as_bytes();
    let max = needle.len().saturating_sub(1).min(bytes.len());
    for k in (1..=max).rev() {
        if bytes[bytes.len() - k..].eq_ignore_ascii_case(&needle.as_bytes()[..k]) {
            return k;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(pieces: &[&str]) -> Vec<StreamChunk> {
        let mut scanner = ThinkingScanner::default();
        let mut out = Vec::new();
        for piece in pieces {
            out.extend(scanner.push(piece));
        }
        out.extend(scanner.finish());
        out
    }

    fn answer_text(chunks: &[StreamChunk]) -> String {
        chunks
            .iter()
            .filter(|c| !c.thinking)
            .map(|c| c.content.as_str())
            .collect()
    }

    fn thinking_text(chunks: &[StreamChunk]) -> String {
        chunks
            .iter()
            .filter(|c| c.thinking)
            .map(|c| c.content.as_str())
            .collect()
    }

    #[test]
    fn test_plain_text_is_answer() {
        let chunks = scan(&["hello ", "world"]);
        assert_eq!(answer_text(&chunks), "hello world");
        assert!(thinking_text(&chunks).is_empty());
    }

    #[test]
    fn test_tagged_block_is_thinking() {
        let chunks = scan(&["a<thinking>b</thinking>c"]);
        assert_eq!(answer_text(&chunks), "ac");
        assert_eq!(thinking_text(&chunks), "b");
    }

    #[test]
    fn test_tag_split_across_chunks() {
        let chunks = scan(&["answer <thi", "nking>hidden</thin", "king> more"]);
        assert_eq!(answer_text(&chunks), "answer  more");
        assert_eq!(thinking_text(&chunks), "hidden");
    }

    #[test]
    fn test_case_insensitive_tags() {
        let chunks = scan(&["<THINKING>loud</Thinking>done"]);
        assert_eq!(answer_text(&chunks), "done");
        assert_eq!(thinking_text(&chunks), "loud");
    }

    #[test]
    fn test_unclosed_tag_classifies_rest_as_thinking() {
        let chunks = scan(&["before<thinking>never closed"]);
        assert_eq!(answer_text(&chunks), "before");
        assert_eq!(thinking_text(&chunks), "never closed");
    }

    #[test]
    fn test_false_prefix_is_flushed() {
        // "<th" at end of stream never became a tag
        let chunks = scan(&["value <th"]);
        assert_eq!(answer_text(&chunks), "value <th");
    }

    #[test]
    fn test_angle_bracket_without_tag() {
        let chunks = scan(&["a < b and a <> b"]);
        assert_eq!(answer_text(&chunks), "a < b and a <> b");
    }

    #[test]
    fn test_multiple_blocks() {
        let chunks = scan(&["<thinking>one</thinking>x<thinking>two</thinking>y"]);
        assert_eq!(answer_text(&chunks), "xy");
        assert_eq!(thinking_text(&chunks), "onetwo");
    }

    #[test]
    fn test_custom_matcher() {
        let mut scanner = ThinkingScanner::new(Box::new(TagMatcher::new("<think>", "</think>")));
        let mut chunks = scanner.push("<think>a</think>b");
        chunks.extend(scanner.finish());
        assert_eq!(answer_text(&chunks), "b");
        assert_eq!(thinking_text(&chunks), "a");
    }

    #[test]
    fn test_empty_stream() {
        assert!(scan(&[]).is_empty());
    }
}

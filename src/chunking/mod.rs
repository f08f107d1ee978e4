//! Diff chunking for breaking commits into retrievable units.
//!
//! A commit payload is split on unified-diff hunk markers (`@@ -a,b +c,d @@`).
//! The markers are removed from chunk text and kept as metadata.

use crate::history::Commit;
use regex::Regex;

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4000;

const HUNK_MARKER_PATTERN: &str = r"(?m)^@@.*?@@";

/// Provenance carried by every chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Author name.
    pub author: String,
    /// Commit date, verbatim from the stream.
    pub date: String,
    /// Commit subject line.
    pub subject: String,
    /// Hunk marker that preceded this segment, if any.
    pub hunk: Option<String>,
}

/// A bounded piece of a commit's diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `<commit>_<ordinal>`, unique within an index.
    pub id: String,
    /// Commit this chunk was cut from.
    pub commit: String,
    pub metadata: ChunkMetadata,
    /// Trimmed, truncated diff text.
    pub text: String,
}

/// One piece of a payload between hunk markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkSegment<'a> {
    /// Marker that opened this segment; `None` for the text before the first marker.
    pub marker: Option<&'a str>,
    /// Raw, untrimmed segment text.
    pub text: &'a str,
}

/// Splits commits on hunk markers.
pub struct HunkChunker {
    max_chars: usize,
    marker: Regex,
}

impl HunkChunker {
    /// Create a chunker with the given maximum chunk length.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            marker: Regex::new(HUNK_MARKER_PATTERN).expect("Invalid regex"),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split a payload into segments, in order.
    ///
    /// There is always one more segment than there are markers.
    pub fn split_hunks<'a>(&self, payload: &'a str) -> Vec<HunkSegment<'a>> {
        let mut segments = Vec::new();
        let mut last = 0;
        let mut marker = None;

        for m in self.marker.find_iter(payload) {
            segments.push(HunkSegment {
                marker,
                text: &payload[last..m.start()],
            });
            marker = Some(m.as_str());
            last = m.end();
        }
        segments.push(HunkSegment {
            marker,
            text: &payload[last..],
        });

        segments
    }

    /// Chunk a commit.
    ///
    /// The ordinal in a chunk id is the segment's position in the split, so
    /// ids stay stable when empty segments are dropped.
    pub fn chunk_commit<'a>(&'a self, commit: &'a Commit) -> impl Iterator<Item = Chunk> + 'a {
        self.split_hunks(&commit.payload)
            .into_iter()
            .enumerate()
            .filter_map(move |(ordinal, segment)| {
                let text = segment.text.trim();
                if text.is_empty() {
                    return None;
                }
                Some(Chunk {
                    id: format!("{}_{}", commit.commit, ordinal),
                    commit: commit.commit.clone(),
                    metadata: ChunkMetadata {
                        author: commit.author.name.clone(),
                        date: commit.date.clone(),
                        subject: commit.subject.clone(),
                        hunk: segment.marker.map(str::to_string),
                    },
                    text: truncate_chars(text, self.max_chars).to_string(),
                })
            })
    }
}

impl Default for HunkChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

/// Cut `text` to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

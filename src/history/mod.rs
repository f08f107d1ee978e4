//! Commit history input.
//!
//! The build phase consumes a stream of commits exported from git: records are
//! separated by `\0`, each record is a single JSON header line followed by the
//! raw diff text of the commit.

mod reader;

pub use reader::{parse_record, CommitReader};

use serde::Deserialize;

/// Commit author as found in the record header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The JSON header line of a record.
#[derive(Debug, Clone, Deserialize)]
struct CommitHeader {
    commit: String,
    author: Author,
    date: String,
    subject: String,
}

/// A single commit read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Commit hash.
    pub commit: String,
    pub author: Author,
    /// ISO-8601 commit date, kept verbatim.
    pub date: String,
    /// First line of the commit message.
    pub subject: String,
    /// Raw diff text.
    pub payload: String,
}

impl Commit {
    fn from_header(header: CommitHeader, payload: String) -> Self {
        Self {
            commit: header.commit,
            author: header.author,
            date: header.date,
            subject: header.subject,
            payload,
        }
    }
}

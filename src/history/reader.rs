//! Streaming reader for `\0`-separated commit records.

use super::{Commit, CommitHeader};
use crate::error::{GitRagError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, instrument};

const RECORD_SEPARATOR: u8 = b'\0';

/// Lazily yields commits from a record stream.
///
/// Blank records are skipped. A header that fails to parse yields a
/// [`GitRagError::MalformedRecord`] and ends the iteration.
pub struct CommitReader<R> {
    reader: R,
    buf: Vec<u8>,
    record: usize,
    finished: bool,
}

impl CommitReader<BufReader<File>> {
    /// Open a commit stream file.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        debug!("Opened commit stream {:?}", path);
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> CommitReader<R> {
    /// Wrap any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            record: 0,
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for CommitReader<R> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buf.clear();
            let read = match self.reader.read_until(RECORD_SEPARATOR, &mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            };
            if read == 0 {
                self.finished = true;
                break;
            }
            if self.buf.last() == Some(&RECORD_SEPARATOR) {
                self.buf.pop();
            }

            self.record += 1;
            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let parsed = parse_record(&self.buf, self.record);
            if parsed.is_err() {
                self.finished = true;
            }
            return Some(parsed);
        }
        None
    }
}

/// Parse one non-blank record into a commit.
///
/// `record` is the 1-based position of the record in the stream, used for
/// error reporting.
pub fn parse_record(block: &[u8], record: usize) -> Result<Commit> {
    let start = block
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(block.len());
    let block = &block[start..];

    let (header, body) = match block.iter().position(|&b| b == b'\n') {
        Some(i) => (&block[..i], &block[i + 1..]),
        None => (block, &block[block.len()..]),
    };

    let header = std::str::from_utf8(header).map_err(|e| GitRagError::MalformedRecord {
        record,
        message: format!("header is not valid UTF-8: {}", e),
    })?;

    let header: CommitHeader =
        serde_json::from_str(header.trim_end()).map_err(|e| GitRagError::MalformedRecord {
            record,
            message: e.to_string(),
        })?;

    let payload = String::from_utf8_lossy(body).into_owned();
    Ok(Commit::from_header(header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(data: &[u8]) -> Vec<Result<Commit>> {
        CommitReader::new(Cursor::new(data.to_vec())).collect()
    }

    #[test]
    fn test_single_record() {
        let data = b"{\"commit\":\"abc\",\"author\":{\"name\":\"A\"},\"date\":\"2024-01-01\",\"subject\":\"fix bug\"}\n@@ -1,1 +1,1 @@\nfoo\0";
        let commits: Vec<Commit> = read_all(data).into_iter().map(|c| c.unwrap()).collect();

        assert_eq!(commits.len(), 1);
        let commit = &commits[0];
        assert_eq!(commit.commit, "abc");
        assert_eq!(commit.author.name, "A");
        assert_eq!(commit.author.email, None);
        assert_eq!(commit.date, "2024-01-01");
        assert_eq!(commit.subject, "fix bug");
        assert_eq!(commit.payload, "@@ -1,1 +1,1 @@\nfoo");
    }

    #[test]
    fn test_blank_records_are_skipped() {
        let data = b"\0  \n\0{\"commit\":\"a\",\"author\":{\"name\":\"x\",\"email\":\"x@y\"},\"date\":\"d\",\"subject\":\"s\"}\nbody\0\n\0{\"commit\":\"b\",\"author\":{\"name\":\"y\"},\"date\":\"d\",\"subject\":\"t\"}\n\0";
        let commits: Vec<Commit> = read_all(data).into_iter().map(|c| c.unwrap()).collect();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].commit, "a");
        assert_eq!(commits[0].author.email.as_deref(), Some("x@y"));
        assert_eq!(commits[1].commit, "b");
        assert_eq!(commits[1].payload, "");
    }

    #[test]
    fn test_count_matches_non_empty_records() {
        let header = |id: &str| {
            format!(
                "{{\"commit\":\"{}\",\"author\":{{\"name\":\"n\"}},\"date\":\"d\",\"subject\":\"s\"}}\n",
                id
            )
        };
        let mut data = Vec::new();
        for i in 0..5 {
            data.extend_from_slice(header(&i.to_string()).as_bytes());
            data.extend_from_slice(b"diff text");
            data.push(0);
            data.push(0);
        }
        let commits = read_all(&data);
        assert_eq!(commits.len(), 5);
        assert!(commits.iter().all(|c| c.is_ok()));
    }

    #[test]
    fn test_header_without_body() {
        let data = b"{\"commit\":\"c\",\"author\":{\"name\":\"n\"},\"date\":\"d\",\"subject\":\"s\"}";
        let commits = read_all(data);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].as_ref().unwrap().payload, "");
    }

    #[test]
    fn test_leading_newline_before_header() {
        let data = b"\n{\"commit\":\"c\",\"author\":{\"name\":\"n\"},\"date\":\"d\",\"subject\":\"s\"}\nx\0";
        let commit = read_all(data).remove(0).unwrap();
        assert_eq!(commit.commit, "c");
        assert_eq!(commit.payload, "x");
    }

    #[test]
    fn test_malformed_header_is_fatal() {
        let data = b"not json\nbody\0{\"commit\":\"c\",\"author\":{\"name\":\"n\"},\"date\":\"d\",\"subject\":\"s\"}\n\0";
        let results = read_all(data);

        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(GitRagError::MalformedRecord { record, .. }) => assert_eq!(*record, 1),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let data = b"{\"commit\":\"c\",\"date\":\"d\",\"subject\":\"s\"}\nbody\0";
        assert!(matches!(
            read_all(data).remove(0),
            Err(GitRagError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_invalid_body_bytes_are_replaced() {
        let mut data = b"{\"commit\":\"c\",\"author\":{\"name\":\"n\"},\"date\":\"d\",\"subject\":\"s\"}\nok ".to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        data.push(0);

        let commit = read_all(&data).remove(0).unwrap();
        assert!(commit.payload.starts_with("ok "));
        assert!(commit.payload.contains('\u{FFFD}'));
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.stream");
        std::fs::write(
            &path,
            b"{\"commit\":\"f\",\"author\":{\"name\":\"n\"},\"date\":\"d\",\"subject\":\"s\"}\nbody\0",
        )
        .unwrap();

        let commits: Vec<_> = CommitReader::open(&path).unwrap().collect();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].as_ref().unwrap().commit, "f");
    }
}

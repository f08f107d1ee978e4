//! Single-file persistence for index artifacts.
//!
//! The artifact is a SQLite database holding one row per chunk (with its
//! normalized vector as a little-endian `f32` blob) and a small metadata
//! table. Saving always writes a fresh database next to the target and
//! renames it into place, so readers never observe a partial index.

use super::{FlatIndex, IndexArtifact};
use crate::chunking::{Chunk, ChunkMetadata};
use crate::error::{GitRagError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// On-disk format version written into every artifact.
pub const FORMAT_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE chunks (
    position INTEGER PRIMARY KEY,
    id TEXT NOT NULL,
    commit_id TEXT NOT NULL,
    author TEXT NOT NULL,
    date TEXT NOT NULL,
    subject TEXT NOT NULL,
    hunk TEXT,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL
);
"#;

/// Reads and writes the index artifact at a fixed path.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the artifact, replacing any existing file at the path.
    #[instrument(skip_all, fields(path = %self.path.display(), chunks = artifact.len()))]
    pub fn save(&self, artifact: &IndexArtifact) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let tmp = tempfile::Builder::new()
            .prefix(".gitrag-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;

        let mut conn = Connection::open(tmp.path())?;
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params!["format_version", FORMAT_VERSION.to_string()])?;
            meta.execute(params!["model", artifact.model()])?;
            meta.execute(params!["dimensions", artifact.dimensions().to_string()])?;
            meta.execute(params!["chunk_count", artifact.len().to_string()])?;
            meta.execute(params!["built_at", artifact.built_at().to_rfc3339()])?;

            let mut insert = tx.prepare(
                r#"
                INSERT INTO chunks
                    (position, id, commit_id, author, date, subject, hunk, text, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;

            for (position, chunk) in artifact.chunks().iter().enumerate() {
                let vector = artifact.index().vector(position).ok_or_else(|| {
                    GitRagError::InvalidIndex(format!("no vector at position {}", position))
                })?;
                insert.execute(params![
                    position as i64,
                    chunk.id,
                    chunk.commit,
                    chunk.metadata.author,
                    chunk.metadata.date,
                    chunk.metadata.subject,
                    chunk.metadata.hunk,
                    chunk.text,
                    vector_to_bytes(vector),
                ])?;
            }
        }
        tx.commit()?;
        conn.close().map_err(|(_, e)| e)?;

        tmp.persist(&self.path).map_err(|e| e.error)?;
        info!("Saved index with {} chunks to {:?}", artifact.len(), self.path);
        Ok(())
    }

    /// Load the artifact.
    ///
    /// Returns [`GitRagError::IndexNotFound`] when nothing has been built yet.
    /// The file is opened read-only.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<IndexArtifact> {
        if !self.path.is_file() {
            return Err(GitRagError::IndexNotFound(self.path.clone()));
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let version: u32 = parse_meta(&conn, "format_version")?;
        if version != FORMAT_VERSION {
            return Err(GitRagError::InvalidIndex(format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }
        let model = read_meta(&conn, "model")?;
        let dimensions: usize = parse_meta(&conn, "dimensions")?;
        let chunk_count: usize = parse_meta(&conn, "chunk_count")?;
        let built_at = DateTime::parse_from_rfc3339(&read_meta(&conn, "built_at")?)
            .map_err(|e| GitRagError::InvalidIndex(format!("bad built_at: {}", e)))?
            .with_timezone(&Utc);

        let mut stmt = conn.prepare(
            r#"
            SELECT id, commit_id, author, date, subject, hunk, text, embedding
            FROM chunks
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let chunk = Chunk {
                id: row.get(0)?,
                commit: row.get(1)?,
                metadata: ChunkMetadata {
                    author: row.get(2)?,
                    date: row.get(3)?,
                    subject: row.get(4)?,
                    hunk: row.get(5)?,
                },
                text: row.get(6)?,
            };
            let bytes: Vec<u8> = row.get(7)?;
            Ok((chunk, bytes))
        })?;

        let mut index = FlatIndex::new();
        let mut chunks = Vec::with_capacity(chunk_count);
        for row in rows {
            let (chunk, bytes) = row?;
            if bytes.len() != dimensions * 4 {
                return Err(GitRagError::InvalidIndex(format!(
                    "vector for '{}' has {} bytes, expected {}",
                    chunk.id,
                    bytes.len(),
                    dimensions * 4
                )));
            }
            index.push_normalized(&bytes_to_vector(&bytes))?;
            chunks.push(chunk);
        }

        if chunks.len() != chunk_count {
            return Err(GitRagError::InvalidIndex(format!(
                "metadata lists {} chunks, found {}",
                chunk_count,
                chunks.len()
            )));
        }

        debug!("Loaded {} chunks ({} dimensions, model {})", chunks.len(), dimensions, model);
        IndexArtifact::from_parts(model, built_at, index, chunks)
    }
}

fn read_meta(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| GitRagError::InvalidIndex(format!("missing metadata '{}'", key)))
}

fn parse_meta<T: std::str::FromStr>(conn: &Connection, key: &str) -> Result<T> {
    let value = read_meta(conn, key)?;
    value
        .parse()
        .map_err(|_| GitRagError::InvalidIndex(format!("bad metadata '{}': {}", key, value)))
}

/// Serialize a vector to little-endian bytes.
fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize a vector from little-endian bytes.
fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

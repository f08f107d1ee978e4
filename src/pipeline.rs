//! Build pipeline for gitrag.
//!
//! Reads a commit stream, chunks every commit, embeds the chunks and writes
//! the index artifact once everything has succeeded.

use crate::chunking::{Chunk, HunkChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, EmbeddingBatcher};
use crate::error::Result;
use crate::history::{Commit, CommitReader};
use crate::index::{IndexArtifact, IndexStore};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Builds an index artifact from a commit stream.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    chunker: HunkChunker,
    batch_size: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, settings: &Settings) -> Self {
        Self {
            embedder,
            chunker: HunkChunker::new(settings.chunking.max_chunk_chars),
            batch_size: settings.embedding.batch_size,
        }
    }

    /// Chunk a sequence of commits, counting them on the way.
    ///
    /// Stops at the first reader error.
    pub fn chunk_commits<I>(&self, commits: I) -> Result<(usize, Vec<Chunk>)>
    where
        I: IntoIterator<Item = Result<Commit>>,
    {
        let mut commit_count = 0usize;
        let mut chunks = Vec::new();
        for commit in commits {
            let commit = commit?;
            commit_count += 1;
            chunks.extend(self.chunker.chunk_commit(&commit));
        }
        Ok((commit_count, chunks))
    }

    /// Embed chunks and assemble the in-memory artifact.
    pub async fn embed(&self, chunks: Vec<Chunk>, progress: Option<ProgressBar>) -> Result<IndexArtifact> {
        let mut batcher =
            EmbeddingBatcher::new(self.embedder.clone()).with_batch_size(self.batch_size);
        if let Some(progress) = progress {
            batcher = batcher.with_progress(progress);
        }

        let records = batcher.embed_chunks(&chunks).await?;
        IndexArtifact::from_records(self.embedder.model(), chunks, records)
    }

    /// Run the whole build and persist the artifact.
    ///
    /// Nothing is written unless every step succeeds.
    #[instrument(skip(self, store, progress), fields(stream = %stream.display(), index = %store.path().display()))]
    pub async fn build(
        &self,
        stream: &Path,
        store: &IndexStore,
        progress: Option<ProgressBar>,
    ) -> Result<BuildReport> {
        info!("Parsing commit stream");
        let (commits, chunks) = self.chunk_commits(CommitReader::open(stream)?)?;
        info!("Read {} commits, {} chunks", commits, chunks.len());

        if chunks.is_empty() {
            warn!("No chunks found in {:?}; the index will be empty", stream);
        }
        if let Some(progress) = &progress {
            progress.set_length(chunks.len() as u64);
        }

        let artifact = self.embed(chunks, progress).await?;
        store.save(&artifact)?;

        Ok(BuildReport {
            commits,
            chunks: artifact.len(),
            dimensions: artifact.dimensions(),
        })
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Commits read from the stream.
    pub commits: usize,
    /// Chunks indexed.
    pub chunks: usize,
    /// Embedding dimension.
    pub dimensions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitRagError;
    use crate::testing::RecordingEmbedder;
    use std::sync::Mutex;

    const STREAM: &[u8] = b"{\"commit\":\"abc\",\"author\":{\"name\":\"A\"},\"date\":\"2024-01-01\",\"subject\":\"fix bug\"}\n@@ -1,1 +1,1 @@\nfoo\0{\"commit\":\"def\",\"author\":{\"name\":\"B\"},\"date\":\"2024-01-02\",\"subject\":\"add feature\"}\ndiff --git a/x b/x\n@@ -1 +1 @@\n-old\n+new\n@@ -9 +9 @@\n+more\n\0";

    fn settings(batch_size: usize) -> Settings {
        let mut settings = Settings::default();
        settings.embedding.batch_size = batch_size;
        settings
    }

    #[tokio::test]
    async fn test_build_writes_index() {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("repo.stream");
        std::fs::write(&stream, STREAM).unwrap();
        let store = IndexStore::new(dir.path().join("git.index"));

        let embedder = Arc::new(RecordingEmbedder::new());
        let builder = IndexBuilder::new(embedder.clone(), &settings(2));
        let report = builder.build(&stream, &store, None).await.unwrap();

        assert_eq!(
            report,
            BuildReport {
                commits: 2,
                chunks: 4,
                dimensions: 3
            }
        );
        assert_eq!(*embedder.calls.lock().unwrap(), vec![2, 2]);

        let loaded = store.load().unwrap();
        let ids: Vec<&str> = loaded.chunks().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["abc_1", "def_0", "def_1", "def_2"]);
        assert_eq!(loaded.chunks()[0].text, "foo");
        assert_eq!(loaded.model(), "recording");
        for i in 0..loaded.index().len() {
            let v = loaded.index().vector(i).unwrap();
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_failed_embedding_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("repo.stream");
        std::fs::write(&stream, STREAM).unwrap();
        let store = IndexStore::new(dir.path().join("git.index"));

        let embedder = Arc::new(RecordingEmbedder {
            calls: Mutex::new(Vec::new()),
            fail_on_call: Some(2),
        });
        let builder = IndexBuilder::new(embedder, &settings(2));

        let err = builder.build(&stream, &store, None).await.unwrap_err();
        assert!(matches!(err, GitRagError::EmbeddingService(_)));
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_malformed_record_aborts_build() {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("repo.stream");
        let mut data = STREAM.to_vec();
        data.extend_from_slice(b"{broken\nbody\0");
        std::fs::write(&stream, data).unwrap();
        let store = IndexStore::new(dir.path().join("git.index"));

        let embedder = Arc::new(RecordingEmbedder::new());
        let builder = IndexBuilder::new(embedder.clone(), &settings(1000));

        let err = builder.build(&stream, &store, None).await.unwrap_err();
        assert!(matches!(err, GitRagError::MalformedRecord { record: 3, .. }));
        assert!(embedder.calls.lock().unwrap().is_empty());
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_missing_stream_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("git.index"));
        let builder = IndexBuilder::new(Arc::new(RecordingEmbedder::new()), &Settings::default());

        let err = builder
            .build(&dir.path().join("missing"), &store, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GitRagError::Io(_)));
    }
}

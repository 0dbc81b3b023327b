use async_trait::async_trait;
use async_zip::{Compression, DeflateOption, ZipEntryBuilder, tokio::write::ZipFileWriter};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{info, warn};

use crate::{
    concurrency::map_with_concurrency,
    error::{Error, Result},
    management::SpotifyFetcher,
    types::{CollectionTracks, TrackDetails},
    utils,
};

/// Destination of an archive export, written entry by entry.
#[async_trait]
pub trait ArchiveSink: Send {
    async fn append(&mut self, name: &str, data: Vec<u8>) -> Result<()>;

    /// Finalizes the archive. No entries may be appended afterwards.
    async fn finish(&mut self) -> Result<()>;
}

/// Streams a deflate-compressed ZIP archive into any tokio writer.
pub struct ZipSink<W: AsyncWrite + Unpin> {
    writer: Option<ZipFileWriter<W>>,
}

impl<W: AsyncWrite + Unpin> ZipSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Some(ZipFileWriter::with_tokio(inner)),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ArchiveSink for ZipSink<W> {
    async fn append(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::Archive("archive already finalized".into()))?;

        let entry = ZipEntryBuilder::new(name.to_string().into(), Compression::Deflate)
            .deflate_option(DeflateOption::Maximum);
        writer
            .write_entry_whole(entry, &data)
            .await
            .map_err(|e| Error::Archive(e.to_string()))
    }

    async fn finish(&mut self) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };

        let mut inner = writer
            .close()
            .await
            .map_err(|e| Error::Archive(e.to_string()))?
            .into_inner();
        inner.shutdown().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTrack {
    pub collection: String,
    pub track: String,
    pub reason: String,
}

/// Outcome of an archive export: the entries written and the tracks left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveReport {
    pub entries: Vec<String>,
    pub skipped: Vec<SkippedTrack>,
}

enum TrackOutcome {
    Added(String),
    Skipped(SkippedTrack),
}

impl SpotifyFetcher {
    /// Resolves, fetches and appends the audio of every track to `sink`.
    ///
    /// Collections are processed one after another; within a collection up to
    /// `archive_concurrency` tracks are in flight. A track whose audio cannot
    /// be resolved or fetched is logged and skipped without disturbing the
    /// others. A failing sink aborts the export. The sink is finalized once
    /// every collection is done.
    pub async fn export_archive<S: ArchiveSink>(
        &self,
        collections: &[CollectionTracks],
        sink: S,
    ) -> Result<ArchiveReport> {
        let sink = Mutex::new(sink);
        let mut report = ArchiveReport::default();

        for collection in collections {
            info!(
                name = %collection.name,
                tracks = collection.tracks.len(),
                "archiving collection"
            );

            let outcomes = map_with_concurrency(
                &collection.tracks,
                self.settings().archive_concurrency,
                |track| self.archive_track(&collection.name, track, &sink),
            )
            .await?;

            for outcome in outcomes {
                match outcome {
                    TrackOutcome::Added(entry) => report.entries.push(entry),
                    TrackOutcome::Skipped(skipped) => report.skipped.push(skipped),
                }
            }
        }

        sink.into_inner().finish().await?;
        info!(
            entries = report.entries.len(),
            skipped = report.skipped.len(),
            "archive finalized"
        );

        Ok(report)
    }

    async fn archive_track<S: ArchiveSink>(
        &self,
        collection: &str,
        track: &TrackDetails,
        sink: &Mutex<S>,
    ) -> Result<TrackOutcome> {
        let data = match self.download_track_from_info(track).await {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    collection,
                    track = %track.name,
                    error = %e,
                    "skipping track"
                );
                return Ok(TrackOutcome::Skipped(SkippedTrack {
                    collection: collection.to_string(),
                    track: track.name.clone(),
                    reason: e.to_string(),
                }));
            }
        };

        let entry = utils::archive_entry_name(collection, track);
        sink.lock().await.append(&entry, data).await?;
        Ok(TrackOutcome::Added(entry))
    }
}

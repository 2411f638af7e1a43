//! Archive-level orchestration: the entry loop, the central directory,
//! and the path-based boundary operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::entry;
use super::structures::{
    CentralDirectoryHeader, DosDateTime, EndOfCentralDirectory, EntryRecord,
    Zip64EndOfCentralDirectory, Zip64EocdLocator,
};
use crate::error::{Result, ZipError};
use crate::io::{ArchiveSink, EntrySource, LocalFileSource};
use crate::progress::{DEFAULT_EMIT_INTERVAL, ProgressTracker};

/// What to do with a partially written output file when a run fails.
///
/// The engine never leaves ambiguity: either the file is removed (the
/// default) or it is knowingly retained for the caller to inspect. A
/// retained partial file is never reported as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialOutputPolicy {
    /// Delete the output file on failure (default).
    Remove,
    /// Leave the partial output file in place on failure.
    Keep,
}

/// Incremental ZIP writer over an arbitrary sink.
///
/// Drives one entry at a time in caller order, accumulates the resulting
/// [`EntryRecord`]s, and on [`finish`](ZipWriter::finish) appends the
/// central directory and end-of-archive record. All output bytes flow
/// through the single sink, so entry offsets match the byte layout
/// exactly.
pub struct ZipWriter<W: ArchiveSink> {
    sink: W,
    entries: Vec<EntryRecord>,
    level: u32,
    timestamp: DosDateTime,
    tracker: ProgressTracker,
    high_water: u64,
}

impl<W: ArchiveSink> ZipWriter<W> {
    pub fn new(sink: W, level: u32, timestamp: DosDateTime, tracker: ProgressTracker) -> Self {
        Self {
            sink,
            entries: Vec::new(),
            level,
            timestamp,
            tracker,
            high_water: 0,
        }
    }

    /// Encode one source as the next archive entry.
    pub async fn add_entry<S: EntrySource>(&mut self, source: &mut S, name: &str) -> Result<()> {
        let written = entry::write_entry(
            &mut self.sink,
            source,
            name,
            self.timestamp,
            self.level,
            &mut self.tracker,
        )
        .await?;
        debug!(
            name,
            method = written.record.method.as_u16(),
            compressed = written.record.compressed_size,
            uncompressed = written.record.uncompressed_size,
            offset = written.record.lfh_offset,
            "entry written"
        );
        self.high_water = self.high_water.max(written.high_water);
        self.entries.push(written.record);
        Ok(())
    }

    /// Number of entries written so far.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Write the central directory and end-of-archive record, flush, and
    /// return the sink.
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = self.sink.stream_position().map_err(ZipError::SinkWrite)?;
        for record in &self.entries {
            CentralDirectoryHeader { record }
                .write_to(&mut self.sink)
                .map_err(ZipError::SinkWrite)?;
        }
        let cd_end = self.sink.stream_position().map_err(ZipError::SinkWrite)?;
        let cd_size = cd_end - cd_offset;

        let eocd = EndOfCentralDirectory {
            total_entries: self.entries.len() as u64,
            cd_size,
            cd_offset,
        };
        if eocd.is_zip64() {
            Zip64EndOfCentralDirectory {
                total_entries: self.entries.len() as u64,
                cd_size,
                cd_offset,
            }
            .write_to(&mut self.sink)
            .map_err(ZipError::SinkWrite)?;
            Zip64EocdLocator { eocd64_offset: cd_end }
                .write_to(&mut self.sink)
                .map_err(ZipError::SinkWrite)?;
        }
        eocd.write_to(&mut self.sink).map_err(ZipError::SinkWrite)?;

        // Drop any stale DEFLATE tail left past the archive end by a
        // STORE fallback on a late entry.
        let end = self.sink.stream_position().map_err(ZipError::SinkWrite)?;
        if end < self.high_water {
            self.sink.truncate_to(end).map_err(ZipError::SinkWrite)?;
        }
        self.sink.flush().map_err(ZipError::SinkWrite)?;
        self.sink.sync().map_err(ZipError::SinkWrite)?;

        debug!(
            entries = self.entries.len(),
            cd_offset, cd_size, "central directory written"
        );
        // Only a fully durable archive reports completion.
        self.tracker.complete();
        Ok(self.sink)
    }
}

/// An input that passed the up-front sizing pass.
struct SizedInput {
    path: PathBuf,
    name: String,
    size: u64,
}

/// The archive-creation boundary.
///
/// One call to [`create`](ZipArchiver::create) bundles an ordered list of
/// files into a single ZIP archive, reporting progress as a monotonic
/// fraction in [0, 1]. The call either fully succeeds or fails as a
/// whole; no entry is retried.
///
/// ## Example
///
/// ```no_run
/// use std::path::PathBuf;
/// use rzip::ZipArchiver;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let inputs = vec![PathBuf::from("a.txt"), PathBuf::from("b.jpg")];
///     ZipArchiver::new()
///         .create(&inputs, "bundle.zip".as_ref(), |fraction| {
///             eprintln!("{:3.0}%", fraction * 100.0);
///         })
///         .await?;
///     Ok(())
/// }
/// ```
pub struct ZipArchiver {
    level: u32,
    timestamp: DosDateTime,
    partial_output: PartialOutputPolicy,
    progress_interval: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self {
            level: 6,
            timestamp: DosDateTime::EPOCH,
            partial_output: PartialOutputPolicy::Remove,
            progress_interval: DEFAULT_EMIT_INTERVAL,
            cancel: None,
        }
    }
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compression level for DEFLATE entries (0-9, default 6).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Timestamp stamped on every entry. Defaults to the DOS epoch so
    /// repeated runs over the same inputs produce byte-identical archives.
    pub fn with_timestamp(mut self, timestamp: DosDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Retain a partially written archive when the run fails, instead of
    /// removing it.
    pub fn keep_partial_output(mut self) -> Self {
        self.partial_output = PartialOutputPolicy::Keep;
        self
    }

    /// Advisory cancellation flag, checked between entries. A cancelled
    /// run fails with [`ZipError::Cancelled`] and the partial-output
    /// policy applies.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Bundle `inputs`, in order, into a ZIP archive at `output`.
    ///
    /// Every input is stat-ed before the first byte is written, so a
    /// missing or unreadable input fails the call without creating any
    /// output file, and the progress denominator is fixed for the whole
    /// run. `on_progress` is invoked synchronously on the worker context
    /// and must be cheap.
    pub async fn create<F>(&self, inputs: &[PathBuf], output: &Path, on_progress: F) -> Result<()>
    where
        F: FnMut(f32) + Send + 'static,
    {
        if inputs.is_empty() {
            return Err(ZipError::InvalidRequest("input list is empty".to_string()));
        }

        debug!(inputs = inputs.len(), "sizing inputs");
        let mut sized = Vec::with_capacity(inputs.len());
        let mut total: u64 = 0;
        for path in inputs {
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|e| ZipError::source_read(path, e))?;
            if meta.is_dir() {
                return Err(ZipError::InvalidRequest(format!(
                    "{} is a directory, not a file",
                    path.display()
                )));
            }
            let name = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    ZipError::InvalidRequest(format!("{} has no file name", path.display()))
                })?;
            total += meta.len();
            sized.push(SizedInput {
                path: path.clone(),
                name,
                size: meta.len(),
            });
        }

        let file = std::fs::File::create(output).map_err(|e| {
            ZipError::InvalidRequest(format!("cannot create output {}: {e}", output.display()))
        })?;
        let tracker =
            ProgressTracker::with_interval(total, self.progress_interval, Box::new(on_progress));
        let writer = ZipWriter::new(file, self.level, self.timestamp, tracker);

        debug!(total_bytes = total, "writing entries");
        // Every failure, including one at the final sync inside finish,
        // goes through the partial-output policy below.
        match self.write_entries(writer, &sized).await {
            Ok(_file) => Ok(()),
            Err(e) => {
                if self.partial_output == PartialOutputPolicy::Remove {
                    // Best effort: the original failure is what matters.
                    let _ = std::fs::remove_file(output);
                }
                Err(e)
            }
        }
    }

    async fn write_entries(
        &self,
        mut writer: ZipWriter<std::fs::File>,
        sized: &[SizedInput],
    ) -> Result<std::fs::File> {
        for input in sized {
            if self.is_cancelled() {
                return Err(ZipError::Cancelled);
            }
            let mut source = LocalFileSource::open(&input.path)?;
            debug!(path = %input.path.display(), size = input.size, "adding entry");
            writer.add_entry(&mut source, &input.name).await?;
        }
        writer.finish()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

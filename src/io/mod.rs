mod local;

pub use local::LocalFileSource;

use std::io::{self, Cursor, Seek, Write};
use std::path::Path;

use async_trait::async_trait;

/// Trait for sequential reading from an archive input.
///
/// A source is consumed once per entry, in bounded chunks. [`rewind`]
/// exists for the STORE fallback: when DEFLATE did not shrink an entry,
/// the entry writer re-reads the source from the start and copies it raw.
///
/// [`rewind`]: EntrySource::rewind
#[async_trait]
pub trait EntrySource: Send {
    /// Read the next chunk into the buffer, returning the number of bytes
    /// read. Zero means end of stream.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Reposition the source to its first byte.
    async fn rewind(&mut self) -> io::Result<()>;

    /// Declared size of the source in bytes, known before reading starts.
    fn size(&self) -> u64;

    /// Path used to name this source in error reports.
    fn path(&self) -> &Path;
}

/// In-memory source, mainly useful for embedding generated data.
#[async_trait]
impl EntrySource for Cursor<Vec<u8>> {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }

    async fn rewind(&mut self) -> io::Result<()> {
        self.set_position(0);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.get_ref().len() as u64
    }

    fn path(&self) -> &Path {
        Path::new("<memory>")
    }
}

/// Trait for the single archive output stream.
///
/// All writes go through one logical writer so that entry offsets match
/// the byte layout exactly. Seeking is required for header patching, and
/// [`truncate_to`] drops the stale tail left behind when the last entry's
/// STORE fallback rewrote shorter data over its DEFLATE attempt.
///
/// [`truncate_to`]: ArchiveSink::truncate_to
pub trait ArchiveSink: Write + Seek + Send {
    /// Shrink the sink to exactly `len` bytes.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;

    /// Make all written bytes durable. Called once, as the last step of a
    /// successful run; a failure here fails the whole run.
    fn sync(&mut self) -> io::Result<()>;
}

impl ArchiveSink for std::fs::File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl ArchiveSink for Cursor<Vec<u8>> {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().truncate(len as usize);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

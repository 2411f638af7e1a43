//! Per-entry encoding: one input stream becomes a local header followed
//! by encoded data, yielding an [`EntryRecord`] for the central directory.

use std::io::{self, SeekFrom};

use tracing::warn;

use super::checksum::Crc32;
use super::codec::Encoder;
use super::structures::{
    CompressionMethod, DosDateTime, EntryRecord, LocalFileHeader, ZIP64_SENTINEL_U32,
};
use crate::error::{Result, ZipError};
use crate::io::{ArchiveSink, EntrySource};
use crate::progress::ProgressTracker;

/// Input read chunk size. Each chunk is observed by the checksum unit and
/// the codec simultaneously, so memory use stays bounded for any entry.
const READ_CHUNK: usize = 64 * 1024;

/// Result of writing one entry: its directory record plus the highest
/// output offset touched, which can exceed the entry's final end when the
/// STORE fallback rewrote shorter data over the DEFLATE attempt.
pub(crate) struct WrittenEntry {
    pub record: EntryRecord,
    pub high_water: u64,
}

/// Stream one input into the archive.
///
/// Header strategy: the local header is written first with zeroed
/// CRC/size fields, the data is streamed through the codec and checksum
/// unit, and the header is then rewritten in place with final values.
/// Both passes have identical length, so the data offset never moves and
/// no data-descriptor flag is needed.
///
/// Method policy: empty inputs are stored outright; everything else is
/// deflated, and if DEFLATE failed to shrink the data the entry is
/// rewritten with STORE so the archive never grows past its inputs by
/// more than header overhead.
pub(crate) async fn write_entry<S: EntrySource, W: ArchiveSink>(
    sink: &mut W,
    source: &mut S,
    name: &str,
    timestamp: DosDateTime,
    level: u32,
    tracker: &mut ProgressTracker,
) -> Result<WrittenEntry> {
    if name.len() > u16::MAX as usize {
        return Err(ZipError::InvalidRequest(format!(
            "entry name exceeds {} bytes: {name}",
            u16::MAX
        )));
    }

    let declared = source.size();
    // The fallback guarantees compressed <= uncompressed, so the declared
    // size alone decides whether ZIP64 fields must be reserved.
    let zip64 = declared >= ZIP64_SENTINEL_U32 as u64;

    let lfh_offset = sink.stream_position().map_err(ZipError::SinkWrite)?;
    let placeholder = LocalFileHeader {
        name,
        method: if declared == 0 {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflate
        },
        timestamp,
        crc32: 0,
        compressed_size: 0,
        uncompressed_size: 0,
        zip64,
    };
    placeholder.write_to(sink).map_err(ZipError::SinkWrite)?;
    let header_len = placeholder.encoded_len();
    let data_start = lfh_offset + header_len;

    let mut encoder = if declared == 0 {
        Encoder::store()
    } else {
        Encoder::deflate(level)
    };
    let mut crc = Crc32::new();
    let mut read_buf = vec![0u8; READ_CHUNK];
    let mut staged = Vec::with_capacity(READ_CHUNK + 1024);

    loop {
        let n = source
            .read_chunk(&mut read_buf)
            .await
            .map_err(|e| ZipError::source_read(source.path(), e))?;
        if n == 0 {
            break;
        }
        crc.update(&read_buf[..n]);
        staged.clear();
        encoder.encode_chunk(&read_buf[..n], &mut staged)?;
        sink.write_all(&staged).map_err(ZipError::SinkWrite)?;
        tracker.add(n as u64);
    }
    staged.clear();
    encoder.finish(&mut staged)?;
    sink.write_all(&staged).map_err(ZipError::SinkWrite)?;

    let uncompressed = crc.bytes_seen();
    let crc32 = crc.finalize();
    let mut compressed = encoder.total_out();
    let mut method = encoder.method();
    let mut high_water = data_start + compressed;

    if method == CompressionMethod::Deflate && compressed >= uncompressed && uncompressed > 0 {
        // Incompressible data: re-copy the source raw over the DEFLATE
        // attempt. The sink tail beyond the new end stays stale until the
        // archive writer truncates at finish.
        warn!(name, compressed, uncompressed, "deflate did not shrink entry, storing raw");
        sink.seek(SeekFrom::Start(data_start))
            .map_err(ZipError::SinkWrite)?;
        source
            .rewind()
            .await
            .map_err(|e| ZipError::source_read(source.path(), e))?;
        let mut copied = 0u64;
        loop {
            let n = source
                .read_chunk(&mut read_buf)
                .await
                .map_err(|e| ZipError::source_read(source.path(), e))?;
            if n == 0 {
                break;
            }
            sink.write_all(&read_buf[..n])
                .map_err(ZipError::SinkWrite)?;
            copied += n as u64;
        }
        if copied != uncompressed {
            return Err(ZipError::source_read(
                source.path(),
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "input changed size during archiving",
                ),
            ));
        }
        compressed = uncompressed;
        method = CompressionMethod::Stored;
    }

    if !zip64
        && (compressed >= ZIP64_SENTINEL_U32 as u64 || uncompressed >= ZIP64_SENTINEL_U32 as u64)
    {
        // No ZIP64 extra was reserved in the header; the only way to get
        // here is an input that grew past 4 GiB after the sizing pass.
        return Err(ZipError::source_read(
            source.path(),
            io::Error::new(
                io::ErrorKind::InvalidData,
                "input grew past the 4 GiB boundary during archiving",
            ),
        ));
    }

    let record = EntryRecord {
        name: name.to_string(),
        method,
        timestamp,
        crc32,
        compressed_size: compressed,
        uncompressed_size: uncompressed,
        lfh_offset,
        header_len,
    };

    // Patch the local header with final CRC, sizes, and method, then put
    // the cursor back at the end of this entry's data.
    let end_pos = data_start + compressed;
    sink.seek(SeekFrom::Start(lfh_offset))
        .map_err(ZipError::SinkWrite)?;
    let patched = LocalFileHeader {
        name,
        method,
        timestamp,
        crc32,
        compressed_size: compressed,
        uncompressed_size: uncompressed,
        zip64,
    };
    patched.write_to(sink).map_err(ZipError::SinkWrite)?;
    sink.seek(SeekFrom::Start(end_pos))
        .map_err(ZipError::SinkWrite)?;
    tracker.checkpoint();

    high_water = high_water.max(end_pos);
    Ok(WrittenEntry { record, high_water })
}

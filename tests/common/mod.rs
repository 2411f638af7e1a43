//! Minimal independent ZIP reader used to verify produced archives.
//!
//! Deliberately separate from the writer: it re-derives every offset from
//! the central directory the way an external tool would, so structural
//! bugs in the writer cannot cancel themselves out.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use rzip::CompressionMethod;

pub struct ArchiveEntry {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
}

pub struct ParsedArchive {
    pub entries: Vec<ArchiveEntry>,
    data: Vec<u8>,
}

impl ParsedArchive {
    /// Parse an archive from its raw bytes, asserting structural
    /// validity along the way.
    pub fn parse(data: Vec<u8>) -> ParsedArchive {
        assert!(data.len() >= 22, "archive shorter than an end record");
        let eocd = &data[data.len() - 22..];
        assert_eq!(&eocd[0..4], b"PK\x05\x06", "end record signature");

        let mut cursor = Cursor::new(&eocd[4..]);
        let _disk = cursor.read_u16::<LittleEndian>().unwrap();
        let _disk_with_cd = cursor.read_u16::<LittleEndian>().unwrap();
        let disk_entries = cursor.read_u16::<LittleEndian>().unwrap();
        let total_entries = cursor.read_u16::<LittleEndian>().unwrap();
        let cd_size = cursor.read_u32::<LittleEndian>().unwrap();
        let cd_offset = cursor.read_u32::<LittleEndian>().unwrap();
        let comment_len = cursor.read_u16::<LittleEndian>().unwrap();
        assert_eq!(comment_len, 0);
        assert_eq!(disk_entries, total_entries);
        // The suite never produces ZIP64-sized archives.
        assert_ne!(total_entries, 0xFFFF, "unexpected ZIP64 end record");

        let cd = &data[cd_offset as usize..(cd_offset + cd_size) as usize];
        let mut cursor = Cursor::new(cd);
        let mut entries = Vec::with_capacity(total_entries as usize);
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor));
        }
        assert_eq!(
            cursor.position(),
            cd_size as u64,
            "central directory has trailing bytes"
        );

        ParsedArchive { entries, data }
    }

    /// Raw (still compressed) bytes of one entry, located through its
    /// local header.
    pub fn entry_data(&self, entry: &ArchiveEntry) -> &[u8] {
        let off = entry.lfh_offset as usize;
        assert_eq!(&self.data[off..off + 4], b"PK\x03\x04", "local header signature");
        let name_len =
            u16::from_le_bytes([self.data[off + 26], self.data[off + 27]]) as usize;
        let extra_len =
            u16::from_le_bytes([self.data[off + 28], self.data[off + 29]]) as usize;
        let data_start = off + 30 + name_len + extra_len;
        &self.data[data_start..data_start + entry.compressed_size as usize]
    }

    /// Decompressed payload of one entry.
    pub fn extract(&self, entry: &ArchiveEntry) -> Vec<u8> {
        let raw = self.entry_data(entry);
        let payload = match entry.method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                let mut decoder = flate2::bufread::DeflateDecoder::new(raw);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).unwrap();
                out
            }
            CompressionMethod::Unknown(v) => panic!("unexpected method {v}"),
        };
        assert_eq!(payload.len() as u64, entry.uncompressed_size);
        assert_eq!(crc32fast::hash(&payload), entry.crc32, "stored CRC mismatch");
        payload
    }
}

fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> ArchiveEntry {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).unwrap();
    assert_eq!(&sig, b"PK\x01\x02", "central directory signature");

    let _version_made_by = cursor.read_u16::<LittleEndian>().unwrap();
    let _version_needed = cursor.read_u16::<LittleEndian>().unwrap();
    let _flags = cursor.read_u16::<LittleEndian>().unwrap();
    let method = cursor.read_u16::<LittleEndian>().unwrap();
    let _time = cursor.read_u16::<LittleEndian>().unwrap();
    let _date = cursor.read_u16::<LittleEndian>().unwrap();
    let crc32 = cursor.read_u32::<LittleEndian>().unwrap();
    let compressed_size = cursor.read_u32::<LittleEndian>().unwrap() as u64;
    let uncompressed_size = cursor.read_u32::<LittleEndian>().unwrap() as u64;
    let name_len = cursor.read_u16::<LittleEndian>().unwrap();
    let extra_len = cursor.read_u16::<LittleEndian>().unwrap();
    let comment_len = cursor.read_u16::<LittleEndian>().unwrap();
    let _disk = cursor.read_u16::<LittleEndian>().unwrap();
    let _internal = cursor.read_u16::<LittleEndian>().unwrap();
    let _external = cursor.read_u32::<LittleEndian>().unwrap();
    let lfh_offset = cursor.read_u32::<LittleEndian>().unwrap() as u64;

    let mut name_bytes = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name_bytes).unwrap();
    let name = String::from_utf8(name_bytes).expect("entry name is UTF-8");

    cursor.set_position(cursor.position() + extra_len as u64 + comment_len as u64);

    ArchiveEntry {
        name,
        method: CompressionMethod::from_u16(method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
    }
}

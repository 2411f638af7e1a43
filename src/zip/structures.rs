use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// General-purpose flag bit 11: entry name is UTF-8 encoded.
const FLAG_UTF8_NAME: u16 = 0x0800;

/// Sentinel stored in 32-bit size/offset fields when the real value lives
/// in a ZIP64 extra field.
pub const ZIP64_SENTINEL_U32: u32 = 0xFFFF_FFFF;

/// Sentinel stored in 16-bit entry-count fields when ZIP64 is in effect.
pub const ZIP64_SENTINEL_U16: u16 = 0xFFFF;

/// Extra-field header ID for ZIP64 extended information.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// MS-DOS date/time pair as stored in ZIP headers.
///
/// The default for produced archives is the DOS epoch (1980-01-01
/// 00:00:00) so that encoding the same inputs twice yields byte-identical
/// archives; callers wanting real timestamps supply their own value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable DOS timestamp.
    pub const EPOCH: DosDateTime = DosDateTime {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// Build a DOS timestamp from calendar components.
    ///
    /// Years before 1980 clamp to 1980; seconds have 2-second resolution.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let y = year.saturating_sub(1980).min(127);
        let date = (y << 9) | ((month as u16 & 0x0F) << 5) | (day as u16 & 0x1F);
        let time = ((hour as u16 & 0x1F) << 11)
            | ((minute as u16 & 0x3F) << 5)
            | ((second as u16 / 2) & 0x1F);
        DosDateTime { date, time }
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        DosDateTime::EPOCH
    }
}

/// Metadata recorded for one finished entry.
///
/// Created by the entry writer once an input's bytes are fully encoded,
/// never mutated afterwards, and consumed exactly once when the central
/// directory is serialized.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub name: String,
    pub method: CompressionMethod,
    pub timestamp: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Byte offset of this entry's local header in the output stream.
    pub lfh_offset: u64,
    /// Length of the local header (fixed part + name + extra field).
    pub header_len: u64,
}

impl EntryRecord {
    /// Whether this record needs ZIP64 extra fields in the central
    /// directory.
    pub fn needs_zip64(&self) -> bool {
        self.compressed_size >= ZIP64_SENTINEL_U32 as u64
            || self.uncompressed_size >= ZIP64_SENTINEL_U32 as u64
            || self.lfh_offset >= ZIP64_SENTINEL_U32 as u64
    }
}

/// Local File Header (LFH) - 30 bytes fixed part
///
/// Written once with zeroed CRC/size fields before the entry data, then
/// rewritten in place with final values after the data is on disk. Both
/// passes produce the same byte length, so the data offset never moves.
pub struct LocalFileHeader<'a> {
    pub name: &'a str,
    pub method: CompressionMethod,
    pub timestamp: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Reserve a ZIP64 extra field for sizes beyond 32 bits. Decided from
    /// the declared input size before the first pass and kept identical in
    /// the patch pass.
    pub zip64: bool,
}

impl<'a> LocalFileHeader<'a> {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    /// ZIP64 extended information: header ID + size + two u64 sizes.
    const ZIP64_EXTRA_LEN: u16 = 2 + 2 + 8 + 8;

    /// Total encoded length: fixed part, name, and optional extra field.
    pub fn encoded_len(&self) -> u64 {
        let extra = if self.zip64 { Self::ZIP64_EXTRA_LEN as u64 } else { 0 };
        Self::SIZE as u64 + self.name.len() as u64 + extra
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let version_needed: u16 = if self.zip64 { 45 } else { 20 };
        let (compressed, uncompressed) = if self.zip64 {
            (ZIP64_SENTINEL_U32, ZIP64_SENTINEL_U32)
        } else {
            (self.compressed_size as u32, self.uncompressed_size as u32)
        };
        let extra_len = if self.zip64 { Self::ZIP64_EXTRA_LEN } else { 0 };

        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(version_needed)?;
        w.write_u16::<LittleEndian>(FLAG_UTF8_NAME)?;
        w.write_u16::<LittleEndian>(self.method.as_u16())?;
        w.write_u16::<LittleEndian>(self.timestamp.time)?;
        w.write_u16::<LittleEndian>(self.timestamp.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(compressed)?;
        w.write_u32::<LittleEndian>(uncompressed)?;
        w.write_u16::<LittleEndian>(self.name.len() as u16)?;
        w.write_u16::<LittleEndian>(extra_len)?;
        w.write_all(self.name.as_bytes())?;

        if self.zip64 {
            w.write_u16::<LittleEndian>(ZIP64_EXTRA_ID)?;
            w.write_u16::<LittleEndian>(16)?;
            w.write_u64::<LittleEndian>(self.uncompressed_size)?;
            w.write_u64::<LittleEndian>(self.compressed_size)?;
        }

        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes fixed part
pub struct CentralDirectoryHeader<'a> {
    pub record: &'a EntryRecord,
}

impl<'a> CentralDirectoryHeader<'a> {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";
    pub const SIZE: usize = 46;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let r = self.record;
        let zip64 = r.needs_zip64();

        // ZIP64 extra field carries only the fields whose 32-bit slots
        // overflowed, in the order mandated by the format: uncompressed
        // size, compressed size, local header offset.
        let mut extra = Vec::new();
        if zip64 {
            let mut data = Vec::new();
            if r.uncompressed_size >= ZIP64_SENTINEL_U32 as u64 {
                data.write_u64::<LittleEndian>(r.uncompressed_size)?;
            }
            if r.compressed_size >= ZIP64_SENTINEL_U32 as u64 {
                data.write_u64::<LittleEndian>(r.compressed_size)?;
            }
            if r.lfh_offset >= ZIP64_SENTINEL_U32 as u64 {
                data.write_u64::<LittleEndian>(r.lfh_offset)?;
            }
            extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID)?;
            extra.write_u16::<LittleEndian>(data.len() as u16)?;
            extra.extend_from_slice(&data);
        }

        let field_u32 = |v: u64| -> u32 {
            if v >= ZIP64_SENTINEL_U32 as u64 {
                ZIP64_SENTINEL_U32
            } else {
                v as u32
            }
        };
        let version: u16 = if zip64 { 45 } else { 20 };

        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(version)?; // version made by
        w.write_u16::<LittleEndian>(version)?; // version needed
        w.write_u16::<LittleEndian>(FLAG_UTF8_NAME)?;
        w.write_u16::<LittleEndian>(r.method.as_u16())?;
        w.write_u16::<LittleEndian>(r.timestamp.time)?;
        w.write_u16::<LittleEndian>(r.timestamp.date)?;
        w.write_u32::<LittleEndian>(r.crc32)?;
        w.write_u32::<LittleEndian>(field_u32(r.compressed_size))?;
        w.write_u32::<LittleEndian>(field_u32(r.uncompressed_size))?;
        w.write_u16::<LittleEndian>(r.name.len() as u16)?;
        w.write_u16::<LittleEndian>(extra.len() as u16)?;
        w.write_u16::<LittleEndian>(0)?; // file comment length
        w.write_u16::<LittleEndian>(0)?; // disk number start
        w.write_u16::<LittleEndian>(0)?; // internal attributes
        w.write_u32::<LittleEndian>(0)?; // external attributes
        w.write_u32::<LittleEndian>(field_u32(r.lfh_offset))?;
        w.write_all(r.name.as_bytes())?;
        w.write_all(&extra)?;

        Ok(())
    }
}

/// End of Central Directory (EOCD) - 22 bytes
pub struct EndOfCentralDirectory {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Whether the classic record cannot hold these values and a ZIP64
    /// EOCD must precede it.
    pub fn is_zip64(&self) -> bool {
        self.total_entries >= ZIP64_SENTINEL_U16 as u64
            || self.cd_size >= ZIP64_SENTINEL_U32 as u64
            || self.cd_offset >= ZIP64_SENTINEL_U32 as u64
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let entries = if self.total_entries >= ZIP64_SENTINEL_U16 as u64 {
            ZIP64_SENTINEL_U16
        } else {
            self.total_entries as u16
        };
        let cd_size = if self.cd_size >= ZIP64_SENTINEL_U32 as u64 {
            ZIP64_SENTINEL_U32
        } else {
            self.cd_size as u32
        };
        let cd_offset = if self.cd_offset >= ZIP64_SENTINEL_U32 as u64 {
            ZIP64_SENTINEL_U32
        } else {
            self.cd_offset as u32
        };

        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(0)?; // disk number
        w.write_u16::<LittleEndian>(0)?; // disk with central directory
        w.write_u16::<LittleEndian>(entries)?;
        w.write_u16::<LittleEndian>(entries)?;
        w.write_u32::<LittleEndian>(cd_size)?;
        w.write_u32::<LittleEndian>(cd_offset)?;
        w.write_u16::<LittleEndian>(0)?; // comment length
        Ok(())
    }
}

/// ZIP64 End of Central Directory - 56 bytes
pub struct Zip64EndOfCentralDirectory {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u64::<LittleEndian>(44)?; // size of remaining record
        w.write_u16::<LittleEndian>(45)?; // version made by
        w.write_u16::<LittleEndian>(45)?; // version needed
        w.write_u32::<LittleEndian>(0)?; // disk number
        w.write_u32::<LittleEndian>(0)?; // disk with central directory
        w.write_u64::<LittleEndian>(self.total_entries)?;
        w.write_u64::<LittleEndian>(self.total_entries)?;
        w.write_u64::<LittleEndian>(self.cd_size)?;
        w.write_u64::<LittleEndian>(self.cd_offset)?;
        Ok(())
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EocdLocator {
    pub eocd64_offset: u64,
}

impl Zip64EocdLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u32::<LittleEndian>(0)?; // disk with the ZIP64 EOCD
        w.write_u64::<LittleEndian>(self.eocd64_offset)?;
        w.write_u32::<LittleEndian>(1)?; // total number of disks
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_epoch_encodes_1980_01_01() {
        assert_eq!(DosDateTime::EPOCH, DosDateTime::new(1980, 1, 1, 0, 0, 0));
        assert_eq!(DosDateTime::EPOCH.date, 0x0021);
        assert_eq!(DosDateTime::EPOCH.time, 0);
    }

    #[test]
    fn dos_time_has_two_second_resolution() {
        let t = DosDateTime::new(2024, 6, 15, 13, 37, 59);
        assert_eq!(t.time & 0x1F, 29); // 58 seconds stored as 29
        assert_eq!((t.time >> 5) & 0x3F, 37);
        assert_eq!((t.time >> 11) & 0x1F, 13);
        assert_eq!(t.date & 0x1F, 15);
        assert_eq!((t.date >> 5) & 0x0F, 6);
        assert_eq!((t.date >> 9) + 1980, 2024);
    }

    #[test]
    fn method_codes_round_trip() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::Stored.as_u16(), 0);
        assert_eq!(CompressionMethod::Deflate.as_u16(), 8);
    }

    #[test]
    fn lfh_encoded_len_matches_bytes_written() {
        let header = LocalFileHeader {
            name: "файл.txt",
            method: CompressionMethod::Deflate,
            timestamp: DosDateTime::EPOCH,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            zip64: false,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, header.encoded_len());
        assert_eq!(&buf[0..4], LocalFileHeader::SIGNATURE);
    }

    #[test]
    fn lfh_zip64_reserves_extra_field() {
        let header = LocalFileHeader {
            name: "big.bin",
            method: CompressionMethod::Deflate,
            timestamp: DosDateTime::EPOCH,
            crc32: 0xDEADBEEF,
            compressed_size: 5_000_000_000,
            uncompressed_size: 6_000_000_000,
            zip64: true,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, header.encoded_len());
        // 32-bit size fields hold the sentinel, real values in the extra
        assert_eq!(&buf[18..22], &ZIP64_SENTINEL_U32.to_le_bytes());
        assert_eq!(&buf[22..26], &ZIP64_SENTINEL_U32.to_le_bytes());
    }

    #[test]
    fn cdfh_zip64_sizes_use_sentinels_and_extra_field() {
        let record = EntryRecord {
            name: "big.bin".to_string(),
            method: CompressionMethod::Deflate,
            timestamp: DosDateTime::EPOCH,
            crc32: 0xCAFE_BABE,
            compressed_size: 5_000_000_000,
            uncompressed_size: 6_000_000_000,
            lfh_offset: 1024,
            header_len: 37,
        };
        assert!(record.needs_zip64());

        let mut buf = Vec::new();
        CentralDirectoryHeader { record: &record }.write_to(&mut buf).unwrap();

        // Fixed part layout: compressed at 20, uncompressed at 24,
        // extra-field length at 30, local header offset at 42.
        assert_eq!(&buf[20..24], &ZIP64_SENTINEL_U32.to_le_bytes());
        assert_eq!(&buf[24..28], &ZIP64_SENTINEL_U32.to_le_bytes());
        assert_eq!(u16::from_le_bytes([buf[30], buf[31]]), 20);
        // The offset fits in 32 bits, so it stays inline.
        assert_eq!(u32::from_le_bytes(buf[42..46].try_into().unwrap()), 1024);

        // Extra field after the name: header ID 0x0001, 16 data bytes,
        // uncompressed then compressed size.
        let extra = &buf[CentralDirectoryHeader::SIZE + record.name.len()..];
        assert_eq!(u16::from_le_bytes([extra[0], extra[1]]), 0x0001);
        assert_eq!(u16::from_le_bytes([extra[2], extra[3]]), 16);
        assert_eq!(
            u64::from_le_bytes(extra[4..12].try_into().unwrap()),
            6_000_000_000
        );
        assert_eq!(
            u64::from_le_bytes(extra[12..20].try_into().unwrap()),
            5_000_000_000
        );
        assert_eq!(buf.len(), CentralDirectoryHeader::SIZE + record.name.len() + 20);
    }

    #[test]
    fn cdfh_zip64_offset_only_carries_one_field() {
        let record = EntryRecord {
            name: "late.bin".to_string(),
            method: CompressionMethod::Stored,
            timestamp: DosDateTime::EPOCH,
            crc32: 1,
            compressed_size: 10,
            uncompressed_size: 10,
            lfh_offset: 5_000_000_000,
            header_len: 38,
        };
        assert!(record.needs_zip64());

        let mut buf = Vec::new();
        CentralDirectoryHeader { record: &record }.write_to(&mut buf).unwrap();

        // Sizes fit inline; only the offset moves to the extra field.
        assert_eq!(u32::from_le_bytes(buf[20..24].try_into().unwrap()), 10);
        assert_eq!(u32::from_le_bytes(buf[24..28].try_into().unwrap()), 10);
        assert_eq!(&buf[42..46], &ZIP64_SENTINEL_U32.to_le_bytes());

        let extra = &buf[CentralDirectoryHeader::SIZE + record.name.len()..];
        assert_eq!(u16::from_le_bytes([extra[0], extra[1]]), 0x0001);
        assert_eq!(u16::from_le_bytes([extra[2], extra[3]]), 8);
        assert_eq!(
            u64::from_le_bytes(extra[4..12].try_into().unwrap()),
            5_000_000_000
        );
    }

    #[test]
    fn zip64_end_records_have_fixed_layout() {
        let eocd64 = Zip64EndOfCentralDirectory {
            total_entries: 70_000,
            cd_size: 8_000_000,
            cd_offset: 6_000_000_000,
        };
        let mut buf = Vec::new();
        eocd64.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 56);
        assert_eq!(&buf[0..4], Zip64EndOfCentralDirectory::SIGNATURE);
        // Record size field counts everything after itself.
        assert_eq!(u64::from_le_bytes(buf[4..12].try_into().unwrap()), 44);
        assert_eq!(u64::from_le_bytes(buf[24..32].try_into().unwrap()), 70_000);
        assert_eq!(u64::from_le_bytes(buf[32..40].try_into().unwrap()), 70_000);
        assert_eq!(u64::from_le_bytes(buf[40..48].try_into().unwrap()), 8_000_000);
        assert_eq!(
            u64::from_le_bytes(buf[48..56].try_into().unwrap()),
            6_000_000_000
        );

        let mut loc = Vec::new();
        Zip64EocdLocator {
            eocd64_offset: 6_008_000_000,
        }
        .write_to(&mut loc)
        .unwrap();
        assert_eq!(loc.len(), 20);
        assert_eq!(&loc[0..4], Zip64EocdLocator::SIGNATURE);
        assert_eq!(
            u64::from_le_bytes(loc[8..16].try_into().unwrap()),
            6_008_000_000
        );
    }

    #[test]
    fn classic_eocd_saturates_to_sentinels_when_zip64() {
        let eocd = EndOfCentralDirectory {
            total_entries: 70_000,
            cd_size: 8_000_000,
            cd_offset: 6_000_000_000,
        };
        assert!(eocd.is_zip64());

        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        // Entry counts overflow 16 bits, offset overflows 32 bits.
        assert_eq!(&buf[8..10], &ZIP64_SENTINEL_U16.to_le_bytes());
        assert_eq!(&buf[10..12], &ZIP64_SENTINEL_U16.to_le_bytes());
        assert_eq!(u32::from_le_bytes(buf[12..16].try_into().unwrap()), 8_000_000);
        assert_eq!(&buf[16..20], &ZIP64_SENTINEL_U32.to_le_bytes());
    }

    #[test]
    fn eocd_is_22_bytes() {
        let eocd = EndOfCentralDirectory {
            total_entries: 3,
            cd_size: 150,
            cd_offset: 1024,
        };
        assert!(!eocd.is_zip64());
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(&buf[0..4], EndOfCentralDirectory::SIGNATURE);
    }
}

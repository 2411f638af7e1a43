//! ZIP archive creation.
//!
//! This module implements a streaming ZIP writer: N input files go in,
//! one standards-conforming archive comes out.
//!
//! ## Architecture
//!
//! The module is organized around the stages of one archive run:
//!
//! - [`structures`]: Data structures representing ZIP format elements
//!   (local headers, central directory records, end records) and their
//!   wire serialization
//! - [`checksum`]: Running CRC-32 over each entry's uncompressed bytes
//! - [`codec`]: Streaming DEFLATE/STORE encoding in bounded chunks
//! - `entry`: One input becomes a local header plus encoded data
//! - [`writer`]: Orchestration across all inputs, the central directory,
//!   and the path-based boundary operation
//!
//! ## ZIP Format Overview
//!
//! A produced archive consists of:
//! 1. A local file header and compressed data for each input, in caller
//!    order
//! 2. A Central Directory with metadata for all entries
//! 3. An End of Central Directory (EOCD) record at the end
//!
//! Local headers are written with placeholder CRC/size fields and patched
//! in place once the entry's bytes are encoded, so the general-purpose
//! data-descriptor flag stays clear and the archive is readable by any
//! conforming tool.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for archives and entries > 4GB
//! - STORED (no compression) and DEFLATE methods, with automatic STORE
//!   fallback for incompressible or empty input
//! - UTF-8 entry names
//! - Deterministic output (fixed timestamps by default)
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod checksum;
mod codec;
mod entry;
mod structures;
mod writer;

pub use checksum::Crc32;
pub use codec::Encoder;
pub use structures::*;
pub use writer::{PartialOutputPolicy, ZipArchiver, ZipWriter};

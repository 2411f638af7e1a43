//! # rzip
//!
//! A Rust zip utility that bundles files into a ZIP archive.
//!
//! This library provides a streaming archive-creation engine: it reads any
//! number of input files of arbitrary size, encodes them into a standard
//! ZIP container (DEFLATE with automatic STORE fallback), and reports
//! progress as a monotonic fraction in [0, 1]. Memory use is bounded and
//! independent of input size, so archiving files much larger than
//! available memory works fine.
//!
//! ## Features
//!
//! - Stream inputs through compression and checksumming in bounded chunks
//! - DEFLATE compression with STORE fallback for incompressible or empty
//!   files
//! - ZIP64 support for archives and entries larger than 4GB
//! - Deterministic output: the same inputs produce byte-identical archives
//! - Fail-fast validation: every input is checked before any output byte
//!   is written
//! - Monotonic progress reporting across the whole batch
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use rzip::ZipArchiver;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let inputs = vec![PathBuf::from("notes.txt"), PathBuf::from("photo.jpg")];
//!
//!     ZipArchiver::new()
//!         .create(&inputs, "bundle.zip".as_ref(), |fraction| {
//!             eprintln!("progress: {:3.0}%", fraction * 100.0);
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod progress;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{ArchiveSink, EntrySource, LocalFileSource};
pub use progress::{ProgressFn, ProgressTracker};
pub use zip::{
    CompressionMethod, DosDateTime, EntryRecord, PartialOutputPolicy, ZipArchiver, ZipWriter,
};

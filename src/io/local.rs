use super::EntrySource;
use crate::error::{Result, ZipError};
use async_trait::async_trait;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Local file source read sequentially in bounded chunks.
pub struct LocalFileSource {
    file: std::fs::File,
    size: u64,
    path: PathBuf,
}

impl LocalFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            std::fs::File::open(path).map_err(|e| ZipError::source_read(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| ZipError::source_read(path, e))?
            .len();
        Ok(Self {
            file,
            size,
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl EntrySource for LocalFileSource {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    async fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::{AppendError, Result};

/// The one file currently receiving lines
#[derive(Debug)]
pub struct ActiveFile {
    path: PathBuf,
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl ActiveFile {
    /// Open `path` for appending, creating it if needed.
    ///
    /// The byte counter starts at the file's current size so that a restart,
    /// or a file left behind by another tool, keeps its place against the
    /// rotation threshold.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AppendError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let bytes_written = file
            .metadata()
            .map_err(|source| AppendError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            bytes_written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write `line` plus a newline and push it to the OS, returning the
    /// number of bytes added to the file.
    pub fn write_line(&mut self, line: &[u8]) -> Result<u64> {
        self.write_and_flush(line).map_err(|source| AppendError::Write {
            path: self.path.clone(),
            source,
        })?;

        let written = line.len() as u64 + 1;
        self.bytes_written += written;
        Ok(written)
    }

    fn write_and_flush(&mut self, line: &[u8]) -> io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// Flush, sync and release the file
    pub fn close(self) -> Result<()> {
        let path = self.path;
        let close_err = |source| AppendError::Close {
            path: path.clone(),
            source,
        };

        let file = self
            .writer
            .into_inner()
            .map_err(|e| close_err(e.into_error()))?;
        file.sync_data().map_err(close_err)?;
        Ok(())
    }
}

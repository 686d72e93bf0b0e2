//! Atomic file output
//!
//! Record files are written to `<dest>.tmp` and renamed into place once
//! complete, so a failed export never leaves a partial record behind.

use battlerec_core::{Error, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffer size for record output streams (1 MiB)
pub const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// A destination file being written under a temporary name
///
/// Dropping a `StagedFile` without calling [`StagedFile::commit`] removes the
/// temporary file.
pub struct StagedFile {
    target: PathBuf,
    temp: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl StagedFile {
    /// Open `<target>.tmp` for writing, creating parent directories
    pub fn create(target: &Path) -> Result<Self> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = temp_path(target);
        let file = File::create(&temp)?;
        Ok(Self {
            target: target.to_path_buf(),
            temp,
            writer: Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)),
        })
    }

    /// Final location of the file
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Output stream for the file's content
    pub fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("staged file already committed"))
    }

    /// Flush, sync and move the file into place; returns its size
    pub fn commit(mut self) -> Result<u64> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::invalid_operation("staged file already committed"))?;
        let file = writer.into_inner().map_err(|e| Error::IoError(e.into_error()))?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.temp, &self.target)?;
        Ok(fs::metadata(&self.target)?.len())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Write `path` atomically with the content produced by `write`
///
/// Returns the value produced by `write` and the final file size.
pub fn write_atomically<T>(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<T>,
) -> Result<(T, u64)> {
    let mut staged = StagedFile::create(path)?;
    let value = write(staged.writer()?)?;
    let size = staged.commit()?;
    Ok((value, size))
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

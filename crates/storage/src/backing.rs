//! Transient backing file shared by the write channel and readers
//!
//! The file is owned by a `SpoolBacking` behind an `Arc`. The store holds one
//! reference and every reader holds another; the file is deleted when the
//! last reference goes away.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const SPOOL_PREFIX: &str = "battlerec-spool-";
const SPOOL_SUFFIX: &str = ".tmp";

/// Uniquely named temporary spool file
#[derive(Debug)]
pub struct SpoolBacking {
    file: NamedTempFile,
}

impl SpoolBacking {
    /// Create an empty spool file in `dir`, or in the system temp dir
    pub fn create(dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SPOOL_PREFIX).suffix(SPOOL_SUFFIX);
        let file = match dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        debug!(target: "battlerec::spool", path = %file.path().display(), "Created spool file");
        Ok(Self { file })
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open a handle for appending at the start of the file
    pub fn open_write(&self) -> io::Result<File> {
        let file = self.file.reopen()?;
        file.set_len(0)?;
        Ok(file)
    }

    /// Open an independent handle positioned at the start of the file
    pub fn open_read(&self) -> io::Result<File> {
        self.file.reopen()
    }

    /// Current size of the file on disk
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }

    /// True if nothing has reached the file yet
    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Drop for SpoolBacking {
    fn drop(&mut self) {
        debug!(target: "battlerec::spool", path = %self.file.path().display(), "Releasing spool file");
    }
}

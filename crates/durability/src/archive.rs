//! Single-entry compressed archives
//!
//! `BINARY_ZIP` and `XML_ZIP` records are a tar stream holding exactly one
//! entry, compressed with zstd. The entry is named
//! `<yyyyMMdd-HHmmss>-robocode.<br|xml>`. Readers take the first regular
//! entry and ignore the name.

use battlerec_core::{Error, RecordFormat, Result};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use tar::{Archive, Builder, Header};
use tracing::debug;

/// Default zstd compression level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Entry name for a record of `format` created now
pub fn entry_name(format: RecordFormat) -> String {
    format!(
        "{}-robocode.{}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        format.entry_extension()
    )
}

/// Write a one-entry archive to `out`
///
/// `produce` writes the entry's content. It is staged in an anonymous
/// temporary file first, since a tar header needs the entry size up front.
pub fn write_single_entry<W: Write, T>(
    out: W,
    name: &str,
    level: i32,
    produce: impl FnOnce(&mut dyn Write) -> Result<T>,
) -> Result<(W, T)> {
    let mut staging = tempfile::tempfile()?;
    let value = {
        let mut buffered = BufWriter::new(&mut staging);
        let value = produce(&mut buffered)?;
        buffered.flush()?;
        value
    };
    let size = staging.seek(SeekFrom::End(0))?;
    staging.seek(SeekFrom::Start(0))?;

    let encoder = zstd::Encoder::new(out, level)
        .map_err(|e| Error::compression(format!("zstd encoder: {}", e)))?;
    let mut builder = Builder::new(encoder);

    let mut header = Header::new_gnu();
    header
        .set_path(name)
        .map_err(|e| Error::archive(format!("set path '{}': {}", name, e)))?;
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
    header.set_cksum();
    builder
        .append(&header, &mut staging)
        .map_err(|e| Error::archive(format!("append '{}': {}", name, e)))?;

    let encoder = builder
        .into_inner()
        .map_err(|e| Error::archive(format!("tar finish: {}", e)))?;
    let out = encoder
        .finish()
        .map_err(|e| Error::compression(format!("zstd finish: {}", e)))?;

    debug!(target: "battlerec::format", entry = name, size, level, "Archive entry written");
    Ok((out, value))
}

/// Read the first regular entry of a one-entry archive
pub fn read_single_entry<R: Read, T>(
    input: R,
    consume: impl FnOnce(&mut dyn Read) -> Result<T>,
) -> Result<T> {
    let decoder = zstd::Decoder::new(input)
        .map_err(|e| Error::compression(format!("zstd decoder: {}", e)))?;
    let mut archive = Archive::new(decoder);
    let entries = archive
        .entries()
        .map_err(|e| Error::archive(format!("read entries: {}", e)))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| Error::archive(format!("read entry: {}", e)))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        debug!(target: "battlerec::format", entry = %name, size = entry.size(), "Archive entry opened");
        return consume(&mut entry);
    }
    Err(Error::archive("archive contains no record entry"))
}

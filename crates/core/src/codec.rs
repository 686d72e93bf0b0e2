//! Frame encoding shared by the spool and the binary record format
//!
//! ## Frame Format
//!
//! ```text
//! [length: u32 LE][payload: bytes][crc32: u32 LE]
//! ```
//!
//! - **length**: size of the payload only
//! - **payload**: MessagePack-serialized value
//! - **crc32**: CRC32 over the payload
//!
//! A clean end of stream at a frame boundary reads as `Ok(None)`; a stream
//! that ends inside a frame is reported as corruption.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};

/// Per-frame overhead: length prefix plus CRC trailer
pub const FRAME_OVERHEAD: usize = 8;

/// Largest payload accepted by [`read_frame`]
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Serialize a value to MessagePack
pub fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(value)?)
}

/// Deserialize a value from MessagePack
pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Write one frame, returning the number of bytes written
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<u64> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(Error::invalid_input(format!(
            "frame payload of {} bytes exceeds maximum of {}",
            payload.len(),
            MAX_FRAME_SIZE
        )));
    }
    writer.write_u32::<LittleEndian>(payload.len() as u32)?;
    writer.write_all(payload)?;
    writer.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    Ok((payload.len() + FRAME_OVERHEAD) as u64)
}

/// Serialize `value` and write it as one frame
pub fn write_value_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<u64> {
    let payload = encode_value(value)?;
    write_frame(writer, &payload)
}

/// Read one frame
///
/// Returns `Ok(None)` at a clean end of stream.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    if !fill_or_eof(reader, &mut len_buf)? {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(Error::corruption(format!(
            "frame length {} exceeds maximum of {}",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(truncated)?;
    let expected = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    let actual = crc32fast::hash(&payload);
    if expected != actual {
        return Err(Error::corruption(format!(
            "frame checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }
    Ok(Some(payload))
}

/// Read one frame and deserialize it
pub fn read_value_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>> {
    match read_frame(reader)? {
        Some(payload) => decode_value(&payload).map(Some),
        None => Ok(None),
    }
}

/// Fill `buf` completely, or report a clean EOF if nothing could be read
fn fill_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(Error::corruption(format!(
                    "truncated frame header: {} of {} bytes",
                    filled,
                    buf.len()
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

fn truncated(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::corruption("truncated frame")
    } else {
        Error::IoError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_round_trip() {
        let mut buf = Vec::new();
        let written = write_frame(&mut buf, b"hello").unwrap();
        assert_eq!(written, 5 + FRAME_OVERHEAD as u64);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap().unwrap(), b"hello");
        assert!(read_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_crc_detects_bit_flip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"payload").unwrap();
        buf[6] ^= 0xFF;

        let err = read_frame(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
    }

    #[test]
    fn test_truncated_frame_is_corruption() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"payload").unwrap();
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            read_frame(&mut Cursor::new(buf)),
            Err(Error::Corruption(_))
        ));

        let partial_len = vec![1u8, 0];
        assert!(matches!(
            read_frame(&mut Cursor::new(partial_len)),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn test_value_frames() {
        let mut buf = Vec::new();
        write_value_frame(&mut buf, &(7u32, "seven".to_string())).unwrap();
        let mut cursor = Cursor::new(buf);
        let value: (u32, String) = read_value_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(value, (7, "seven".to_string()));
    }
}

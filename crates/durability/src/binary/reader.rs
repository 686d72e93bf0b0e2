//! Binary record reader

use super::{FORMAT_VERSION, LEGACY_STREAM_MAGIC, MAGIC};
use battlerec_core::{codec, BattleRecordHeader, Error, Result, TurnSink, TurnSnapshot};
use std::io::{ErrorKind, Read};
use tracing::{debug, trace};

/// Reads a binary record: validates the preamble, then yields turns
pub struct BinaryRecordReader<R: Read> {
    reader: R,
    header: BattleRecordHeader,
}

impl<R: Read> BinaryRecordReader<R> {
    /// Validate the preamble and read the header
    ///
    /// # Errors
    ///
    /// - `FormatIncompatible` for 1.x serialized records and older layouts
    /// - `InvalidFormat` for unknown content or a newer layout
    pub fn open(mut reader: R) -> Result<Self> {
        let mut preamble = [0u8; 11];
        let filled = read_prefix(&mut reader, &mut preamble)?;
        if filled >= 2 && preamble[..2] == LEGACY_STREAM_MAGIC {
            return Err(Error::incompatible(
                "record was written by the legacy 1.x serializer",
            ));
        }
        if filled < preamble.len() || &preamble[..MAGIC.len()] != MAGIC {
            return Err(Error::invalid_format("not a binary battle record"));
        }

        let version = u16::from_le_bytes([preamble[9], preamble[10]]);
        if version < FORMAT_VERSION {
            return Err(Error::incompatible(format!(
                "binary record layout version {} is no longer supported (current {})",
                version, FORMAT_VERSION
            )));
        }
        if version > FORMAT_VERSION {
            return Err(Error::invalid_format(format!(
                "binary record layout version {} is newer than supported version {}",
                version, FORMAT_VERSION
            )));
        }

        let header: BattleRecordHeader = codec::read_value_frame(&mut reader)?
            .ok_or_else(|| Error::corruption("binary record ends before its header"))?;
        header.validate()?;
        debug!(
            target: "battlerec::format",
            battle_id = %header.battle_id,
            rounds = header.rules.num_rounds,
            "Binary record header read"
        );
        Ok(Self { reader, header })
    }

    /// Header of the record
    pub fn header(&self) -> &BattleRecordHeader {
        &self.header
    }

    /// Read the next turn, or `None` at the end of the record
    pub fn next_turn(&mut self) -> Result<Option<TurnSnapshot>> {
        codec::read_value_frame(&mut self.reader)
    }

    /// Re-append every turn into `sink`, preserving round and turn index
    ///
    /// Reads exactly as many turns per round as the header lists. Returns
    /// the header, frozen.
    pub fn import_into(mut self, sink: &mut dyn TurnSink) -> Result<BattleRecordHeader> {
        let counts = self
            .header
            .turns_in_rounds
            .clone()
            .ok_or_else(|| Error::invalid_format("binary record has no per-round turn counts"))?;

        sink.begin_write()?;
        for (round, &count) in counts.iter().enumerate() {
            let round = round as u32;
            for expected in 0..count {
                let turn = self.next_turn()?.ok_or_else(|| {
                    Error::corruption(format!(
                        "binary record ends at round {} turn {} of {}",
                        round, expected, count
                    ))
                })?;
                if turn.round != round {
                    return Err(Error::corruption(format!(
                        "expected a turn of round {} but read one of round {}",
                        round, turn.round
                    )));
                }
                sink.append(&turn, turn.round, turn.turn)?;
                trace!(target: "battlerec::format", round, turn = turn.turn, "Binary turn imported");
            }
        }
        sink.finish_write()?;

        let mut header = self.header;
        header.freeze();
        debug!(
            target: "battlerec::format",
            turns = header.total_turns(),
            "Binary record imported"
        );
        Ok(header)
    }
}

/// Fill as much of `buf` as the stream allows; returns the bytes read
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

//! Binary record writer

use super::{FORMAT_VERSION, MAGIC};
use battlerec_core::{
    codec, BattleRecordHeader, OutputOptions, Result, TurnSnapshot, TurnSource,
};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use std::ops::ControlFlow;
use tracing::trace;

/// Counters for one written record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryStats {
    /// Turns written
    pub turns: u64,
    /// Bytes written, preamble and header included
    pub bytes: u64,
}

/// Streams a header followed by turns into the binary layout
pub struct BinaryRecordWriter<W: Write> {
    writer: W,
    options: OutputOptions,
    stats: BinaryStats,
}

impl<W: Write> BinaryRecordWriter<W> {
    /// Write the preamble and `header`
    ///
    /// Turns passed to [`BinaryRecordWriter::write_turn`] are reduced
    /// according to `options` before they are framed.
    pub fn new(mut writer: W, header: &BattleRecordHeader, options: OutputOptions) -> Result<Self> {
        writer.write_all(MAGIC)?;
        writer.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        let header_bytes = codec::write_value_frame(&mut writer, header)?;
        Ok(Self {
            writer,
            options,
            stats: BinaryStats {
                turns: 0,
                bytes: MAGIC.len() as u64 + 2 + header_bytes,
            },
        })
    }

    /// Append one turn
    pub fn write_turn(&mut self, mut turn: TurnSnapshot) -> Result<()> {
        if self.options.trim_precision || self.options.skip_debug {
            turn.strip_details(&self.options);
        }
        let bytes = codec::write_value_frame(&mut self.writer, &turn)?;
        self.stats.turns += 1;
        self.stats.bytes += bytes;
        trace!(target: "battlerec::format", round = turn.round, turn = turn.turn, bytes, "Binary turn written");
        Ok(())
    }

    /// Append every turn `source` replays
    pub fn write_from(&mut self, source: &dyn TurnSource) -> Result<()> {
        source.replay_turns(&mut |turn| {
            self.write_turn(turn)?;
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(())
    }

    /// Counters so far
    pub fn stats(&self) -> BinaryStats {
        self.stats
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<(W, BinaryStats)> {
        self.writer.flush()?;
        Ok((self.writer, self.stats))
    }
}

/// Write a complete binary record
pub fn write_record<W: Write>(
    out: W,
    header: &BattleRecordHeader,
    source: &dyn TurnSource,
    options: OutputOptions,
) -> Result<BinaryStats> {
    let mut writer = BinaryRecordWriter::new(out, header, options)?;
    writer.write_from(source)?;
    let (_, stats) = writer.finish()?;
    Ok(stats)
}

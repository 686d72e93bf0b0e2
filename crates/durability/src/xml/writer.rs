//! XML record writer

use super::entities::TURN;
use super::tree::{XmlSerializable, XmlTreeWriter};
use super::{ROOT, SCHEMA_FULL, SCHEMA_SHORT, TURNS, XSI_NAMESPACE};
use battlerec_core::{BattleRecordHeader, OutputOptions, Result, TurnSource};
use std::io::Write;
use std::ops::ControlFlow;
use tracing::trace;

/// Counters for one written document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmlStats {
    /// Turn elements written
    pub turns: u64,
}

/// Write a complete XML record
///
/// `indent` pretty-prints the document; archived documents are written
/// compact.
pub fn write_xml_record<W: Write>(
    out: W,
    header: &BattleRecordHeader,
    source: &dyn TurnSource,
    options: OutputOptions,
    indent: bool,
) -> Result<XmlStats> {
    let mut xml = XmlTreeWriter::new(out, indent);
    xml.start_document()?;
    xml.start(ROOT)?;
    xml.attribute("xmlns:xsi", XSI_NAMESPACE)?;
    let schema = if options.short_attributes {
        SCHEMA_SHORT
    } else {
        SCHEMA_FULL
    };
    xml.attribute("xsi:noNamespaceSchemaLocation", schema)?;

    header.write_xml(&mut xml, &options)?;

    xml.start(TURNS)?;
    let summary = source.replay_turns(&mut |turn| {
        turn.write_xml(&mut xml, &options)?;
        trace!(target: "battlerec::format", element = TURN, round = turn.round, turn = turn.turn, "XML turn written");
        Ok(ControlFlow::Continue(()))
    })?;
    xml.end()?;
    xml.end()?;

    let mut out = xml.finish()?;
    out.flush()?;
    Ok(XmlStats {
        turns: summary.turns,
    })
}

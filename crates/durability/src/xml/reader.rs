//! Streaming XML record reader

use super::entities::{RECORD_INFO, TURN};
use super::tree::{xml_err, XmlNode, XmlSerializable};
use super::{LEGACY_ROOT, ROOT, TURNS};
use crate::binary::{BinaryRecordWriter, BinaryStats};
use battlerec_core::{
    BattleRecordHeader, Error, OutputOptions, Result, TurnSink, TurnSnapshot,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// Outcome of an XML import
#[derive(Debug, Clone, PartialEq)]
pub struct XmlImport {
    /// Header read from `recordInfo`, frozen
    pub header: BattleRecordHeader,
    /// Turns appended to the sink
    pub turns: u64,
    /// Counters of the binary copy, if one was requested
    pub binary: Option<BinaryStats>,
}

/// Import an XML record into `sink`
///
/// Each completed `turn` element is appended to `sink` as soon as it has
/// been parsed, and also written to `binary_copy` in the binary layout when
/// given.
///
/// # Errors
///
/// - `FormatIncompatible` for the legacy `battleRecord` layout
/// - `InvalidFormat` for a missing `record` root, `turns` before
///   `recordInfo`, or turns that disagree with the header's counts
pub fn import_xml<R: BufRead>(
    input: R,
    sink: &mut dyn TurnSink,
    binary_copy: Option<&mut dyn Write>,
) -> Result<XmlImport> {
    sink.begin_write()?;
    let mut stream = ImportStream {
        sink,
        copy_target: binary_copy,
        copy: None,
        header: None,
        appended: Vec::new(),
        turns: 0,
        path: Vec::new(),
        capture: Vec::new(),
        root_seen: false,
    };

    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => stream.open(start_node(&e)?)?,
            Event::Empty(e) => {
                stream.open(start_node(&e)?)?;
                stream.close()?;
            }
            Event::End(_) => stream.close()?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    stream.finish()
}

/// Parse one standalone element and its descendants into a tree
pub fn parse_element<R: BufRead>(input: R) -> Result<XmlNode> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    loop {
        let completed = match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => {
                stack.push(start_node(&e)?);
                None
            }
            Event::Empty(e) => Some(start_node(&e)?),
            Event::End(_) => Some(
                stack
                    .pop()
                    .ok_or_else(|| Error::xml("closing tag without an open element"))?,
            ),
            Event::Eof => return Err(Error::invalid_format("document has no root element")),
            _ => None,
        };
        if let Some(node) = completed {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => return Ok(node),
            }
        }
        buf.clear();
    }
}

fn start_node(start: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(xml_err)?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

enum Placement {
    /// Start of a subtree built in full
    Capture,
    /// Container element; only its name is kept
    Track,
}

struct ImportStream<'s, 'w> {
    sink: &'s mut dyn TurnSink,
    copy_target: Option<&'w mut dyn Write>,
    copy: Option<BinaryRecordWriter<&'w mut dyn Write>>,
    header: Option<BattleRecordHeader>,
    appended: Vec<u32>,
    turns: u64,
    /// Open elements outside any captured subtree
    path: Vec<String>,
    /// Subtree being built (a `recordInfo` or one `turn`)
    capture: Vec<XmlNode>,
    root_seen: bool,
}

impl ImportStream<'_, '_> {
    fn open(&mut self, node: XmlNode) -> Result<()> {
        if !self.capture.is_empty() {
            self.capture.push(node);
            return Ok(());
        }

        let placement = match (self.path.last().map(String::as_str), node.name.as_str()) {
            (None, ROOT) => Placement::Track,
            (None, LEGACY_ROOT) => {
                return Err(Error::incompatible(
                    "XML record uses the legacy 1.x 'battleRecord' layout",
                ))
            }
            (None, other) => {
                return Err(Error::invalid_format(format!(
                    "expected a '{}' root element, found '{}'",
                    ROOT, other
                )))
            }
            (Some(ROOT), RECORD_INFO) | (Some(TURNS), TURN) => Placement::Capture,
            (Some(ROOT), TURNS) if self.header.is_none() => {
                return Err(Error::invalid_format(format!(
                    "'{}' appears before '{}'",
                    TURNS, RECORD_INFO
                )))
            }
            _ => Placement::Track,
        };

        match placement {
            Placement::Capture => self.capture.push(node),
            Placement::Track => {
                if self.path.is_empty() {
                    self.root_seen = true;
                }
                self.path.push(node.name);
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.capture.pop() {
            Some(node) => match self.capture.last_mut() {
                Some(parent) => {
                    parent.children.push(node);
                    Ok(())
                }
                None => self.complete(node),
            },
            None => {
                self.path.pop();
                Ok(())
            }
        }
    }

    fn complete(&mut self, node: XmlNode) -> Result<()> {
        if node.name == RECORD_INFO {
            self.complete_header(&node)
        } else {
            let turn = TurnSnapshot::from_xml(&node)?;
            self.complete_turn(turn)
        }
    }

    fn complete_header(&mut self, node: &XmlNode) -> Result<()> {
        if self.header.is_some() {
            return Err(Error::invalid_format(format!(
                "document has more than one '{}'",
                RECORD_INFO
            )));
        }
        let header = BattleRecordHeader::from_xml(node)?;
        let rounds = header
            .turn_counts()
            .ok_or_else(|| Error::invalid_format("XML record has no per-round turn counts"))?
            .len();
        header.validate()?;

        if let Some(target) = self.copy_target.take() {
            self.copy = Some(BinaryRecordWriter::new(
                target,
                &header,
                OutputOptions::default(),
            )?);
        }
        debug!(
            target: "battlerec::format",
            battle_id = %header.battle_id,
            rounds,
            "XML record header read"
        );
        self.appended = vec![0; rounds];
        self.header = Some(header);
        Ok(())
    }

    fn complete_turn(&mut self, turn: TurnSnapshot) -> Result<()> {
        let slot = self.appended.get_mut(turn.round as usize).ok_or_else(|| {
            Error::invalid_format(format!(
                "turn of round {} is outside the record's rounds",
                turn.round
            ))
        })?;
        self.sink.append(&turn, turn.round, turn.turn)?;
        *slot += 1;
        self.turns += 1;
        trace!(target: "battlerec::format", round = turn.round, turn = turn.turn, "XML turn imported");
        if let Some(copy) = self.copy.as_mut() {
            copy.write_turn(turn)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<XmlImport> {
        if !self.root_seen {
            return Err(Error::invalid_format(format!(
                "document has no '{}' root element",
                ROOT
            )));
        }
        let mut header = self
            .header
            .ok_or_else(|| Error::invalid_format(format!("document has no '{}'", RECORD_INFO)))?;

        let expected = header.turn_counts().unwrap_or_default();
        if let Some((round, (&listed, &found))) = expected
            .iter()
            .zip(self.appended.iter())
            .enumerate()
            .find(|(_, (listed, found))| listed != found)
        {
            return Err(Error::invalid_format(format!(
                "round {} lists {} turns but the document holds {}",
                round, listed, found
            )));
        }

        self.sink.finish_write()?;
        let binary = match self.copy {
            Some(copy) => Some(copy.finish()?.1),
            None => None,
        };
        header.freeze();
        debug!(target: "battlerec::format", turns = self.turns, "XML record imported");
        Ok(XmlImport {
            header,
            turns: self.turns,
            binary,
        })
    }
}

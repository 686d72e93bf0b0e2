//! Element tree protocol shared by every XML entity
//!
//! Writing goes through [`XmlTreeWriter`]: `start(name)`, any number of
//! `attribute(key, value)` calls, nested children, then `end()`. Elements
//! without children are emitted as empty tags.
//!
//! Reading builds an [`XmlNode`] per entity subtree; entities pick the
//! attributes and children they know and ignore the rest.

use battlerec_core::{Error, OutputOptions, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

/// An attribute name in its full and compact spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    /// Full, readable name
    pub long: &'static str,
    /// Compact name used with short attributes
    pub short: &'static str,
}

impl Attr {
    /// Name to write under `options`
    pub fn name(&self, options: &OutputOptions) -> &'static str {
        if options.short_attributes {
            self.short
        } else {
            self.long
        }
    }
}

/// Declare an attribute name pair
pub const fn attr(long: &'static str, short: &'static str) -> Attr {
    Attr { long, short }
}

pub(crate) fn xml_err(e: impl Display) -> Error {
    Error::xml(e.to_string())
}

/// An entity that maps to one XML element subtree
pub trait XmlSerializable: Sized {
    /// Emit this entity as an element
    fn write_xml<W: Write>(&self, w: &mut XmlTreeWriter<W>, options: &OutputOptions)
        -> Result<()>;

    /// Build the entity from its element
    fn from_xml(node: &XmlNode) -> Result<Self>;
}

/// Event-level XML writer that exposes the element tree protocol
pub struct XmlTreeWriter<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
}

impl<W: Write> XmlTreeWriter<W> {
    /// Wrap `inner`; `indent` pretty-prints with two spaces
    pub fn new(inner: W, indent: bool) -> Self {
        let writer = if indent {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };
        Self {
            writer,
            pending: None,
            open: Vec::new(),
        }
    }

    /// Write the XML declaration
    pub fn start_document(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)
    }

    /// Open a child element of the current element
    pub fn start(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.pending = Some(BytesStart::new(name.to_string()));
        self.open.push(name.to_string());
        Ok(())
    }

    /// Add an attribute to the element just started
    pub fn attribute(&mut self, key: &str, value: &str) -> Result<()> {
        let pending = self.pending.as_mut().ok_or_else(|| {
            Error::xml(format!(
                "attribute '{}' written after the start tag was closed",
                key
            ))
        })?;
        pending.push_attribute((key, value));
        Ok(())
    }

    /// Add a named attribute, choosing the spelling from `options`
    pub fn attr(&mut self, attr: Attr, value: &str, options: &OutputOptions) -> Result<()> {
        self.attribute(attr.name(options), value)
    }

    /// Add a float attribute formatted according to `options`
    pub fn attr_f64(&mut self, attr: Attr, value: f64, options: &OutputOptions) -> Result<()> {
        self.attribute(attr.name(options), &options.format_f64(value))
    }

    /// Add an attribute from any displayable value
    pub fn attr_display(
        &mut self,
        attr: Attr,
        value: impl Display,
        options: &OutputOptions,
    ) -> Result<()> {
        self.attribute(attr.name(options), &value.to_string())
    }

    /// Close the current element
    pub fn end(&mut self) -> Result<()> {
        let name = self
            .open
            .pop()
            .ok_or_else(|| Error::xml("end() called with no open element"))?;
        let event = match self.pending.take() {
            Some(start) => Event::Empty(start),
            None => Event::End(BytesEnd::new(name)),
        };
        self.writer.write_event(event).map_err(xml_err)
    }

    /// Number of elements currently open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Check every element is closed and return the output
    pub fn finish(self) -> Result<W> {
        if let Some(name) = self.open.last() {
            return Err(Error::xml(format!("element '{}' was never closed", name)));
        }
        Ok(self.writer.into_inner())
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start)).map_err(xml_err)?;
        }
        Ok(())
    }
}

/// A parsed element subtree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Element name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create a node without attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Raw attribute value by exact key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value under either spelling of `attr`
    pub fn get(&self, attr: Attr) -> Option<&str> {
        self.attribute(attr.long)
            .or_else(|| self.attribute(attr.short))
    }

    /// Parse `attr`, or `default` when absent
    pub fn parse_or<T: FromStr>(&self, attr: Attr, default: T) -> Result<T> {
        match self.get(attr) {
            Some(raw) => parse_value(&self.name, attr, raw),
            None => Ok(default),
        }
    }

    /// Parse `attr` if present
    pub fn parse_opt<T: FromStr>(&self, attr: Attr) -> Result<Option<T>> {
        self.get(attr)
            .map(|raw| parse_value(&self.name, attr, raw))
            .transpose()
    }

    /// Parse `attr`, which must be present
    pub fn parse_required<T: FromStr>(&self, attr: Attr) -> Result<T> {
        let raw = self.get(attr).ok_or_else(|| {
            Error::invalid_format(format!(
                "element '{}' is missing attribute '{}'",
                self.name, attr.long
            ))
        })?;
        parse_value(&self.name, attr, raw)
    }

    /// First child named `name`
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every child named `name`
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_value<T: FromStr>(element: &str, attr: Attr, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        Error::invalid_format(format!(
            "element '{}' attribute '{}' has invalid value '{}'",
            element, attr.long, raw
        ))
    })
}

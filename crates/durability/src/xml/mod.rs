//! XML record format
//!
//! ```text
//! <record xmlns:xsi=".." xsi:noNamespaceSchemaLocation="battleRecord.xsd">
//!   <recordInfo ..> rules, rounds, results </recordInfo>
//!   <turns>
//!     <turn round=".." turn=".."> robots, bullets </turn>
//!     ...
//!   </turns>
//! </record>
//! ```
//!
//! Short attribute output references `battleRecordS.xsd` instead. Import is
//! streaming: only the subtree of one `turn` is held at a time.

mod entities;
mod reader;
mod tree;
mod writer;

pub use reader::{import_xml, parse_element, XmlImport};
pub use tree::{attr, Attr, XmlNode, XmlSerializable, XmlTreeWriter};
pub use writer::{write_xml_record, XmlStats};

/// Document root element
pub const ROOT: &str = "record";

/// Root element of the legacy 1.x layout
pub const LEGACY_ROOT: &str = "battleRecord";

/// Container of every turn element
pub const TURNS: &str = "turns";

/// Namespace bound to the `xsi` prefix
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Schema for full attribute names
pub const SCHEMA_FULL: &str = "battleRecord.xsd";

/// Schema for short attribute names
pub const SCHEMA_SHORT: &str = "battleRecordS.xsd";

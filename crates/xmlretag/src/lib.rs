//! xmlretag - rename XML element tags from a mapping file
//!
//! A mapping file lists one `old,new` rule per line. Every element whose tag
//! is an `old` name is renamed to the matching `new` name; attributes, text,
//! comments and the rest of the tree are left as they were. The result is
//! written next to the input as `<name>_modified.<ext>`.
//!
//! # Quick Start
//!
//! ```
//! use xmlretag::{TagMapping, XmlPipeline};
//! # fn main() -> Result<(), xmlretag::Error> {
//! let (mapping, _report) = TagMapping::parse("foo,bar\nbaz,qux\n");
//! let (xml, stats) = XmlPipeline::new()
//!     .retag_str("<root><foo>1</foo><other>2</other></root>", &mapping)?;
//! assert_eq!(xml, "<root><bar>1</bar><other>2</other></root>");
//! assert_eq!(stats.renamed, 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Category, Error, ErrorKind, Pos, Result, Span};

pub mod cursor;
pub use cursor::Cursor;

pub mod xml;
pub use xml::{
    DeclarationMode, Document as XmlDocument, Element as XmlElement, Node as XmlNode,
    Parser as XmlParser, ParserConfig, Writer as XmlWriter, WriterConfig,
};

pub mod mapping;
pub use mapping::{LoadReport, MappingLoader, TagMapping};

pub mod rename;
pub use rename::{RenameMode, RenameStats, TagRenamer, rename};

pub mod output;
pub use output::{OverwritePolicy, SUFFIX, output_path_for};

pub mod pipeline;
pub use pipeline::{Config as PipelineConfig, Outcome, XmlPipeline};

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    from_xml_bytes(s.as_bytes())
}

/// Parse XML from bytes
pub fn from_xml_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(bytes);
    parser.parse()
}

/// Serialize a document with the default writer settings
pub fn to_xml_string(document: &XmlDocument) -> String {
    XmlWriter::new().write(document)
}

/// Load a mapping file, skipping malformed lines
pub fn load_mapping(path: impl AsRef<Path>) -> Result<TagMapping> {
    MappingLoader::new().load(path)
}

/// Load `mapping_path`, retag `xml_path` and return the written file's path
pub fn retag_file(xml_path: impl AsRef<Path>, mapping_path: impl AsRef<Path>) -> Result<PathBuf> {
    let mapping = load_mapping(mapping_path)?;
    XmlPipeline::new().process(xml_path, &mapping)
}

//! XML document model, parser and writer

pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Document, Element, Node};
pub use parser::{Config as ParserConfig, Parser};
pub use writer::{Config as WriterConfig, DeclarationMode, Writer};

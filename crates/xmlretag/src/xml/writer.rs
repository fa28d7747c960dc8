//! XML serialization

use crate::xml::model::{Document, Element, Node};

const DEFAULT_DECLARATION: &str = "version=\"1.0\" encoding=\"UTF-8\"";

/// What to do with the `<?xml ...?>` declaration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeclarationMode {
    /// Write the declaration only if the document had one
    #[default]
    Preserve,
    /// Always write a declaration, falling back to UTF-8 version 1.0
    Always,
    Omit,
}

/// Configuration for the XML writer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub declaration: DeclarationMode,
}

/// Serializes a [`Document`] to text
#[derive(Clone, Copy, Debug, Default)]
pub struct Writer {
    config: Config,
}

impl Writer {
    pub const fn new() -> Self {
        Self {
            config: Config {
                declaration: DeclarationMode::Preserve,
            },
        }
    }

    pub const fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn write(&self, doc: &Document) -> String {
        let mut output = String::new();

        match (self.config.declaration, doc.declaration.as_deref()) {
            (DeclarationMode::Omit, _) | (DeclarationMode::Preserve, None) => {}
            (_, Some(body)) => push_declaration(&mut output, body),
            (DeclarationMode::Always, None) => {
                push_declaration(&mut output, DEFAULT_DECLARATION);
                output.push('\n');
            }
        }

        for node in &doc.prolog {
            write_node(node, &mut output);
        }
        write_element(&doc.root, &mut output);
        for node in &doc.epilog {
            write_node(node, &mut output);
        }

        output
    }
}

fn push_declaration(output: &mut String, body: &str) {
    output.push_str("<?xml ");
    output.push_str(body);
    output.push_str("?>");
}

fn write_node(node: &Node, output: &mut String) {
    match node {
        Node::Element(element) => write_element(element, output),
        Node::Text(text) => escape_into(text, false, output),
        Node::CData(text) => {
            output.push_str("<![CDATA[");
            output.push_str(text);
            output.push_str("]]>");
        }
        Node::Comment(text) => {
            output.push_str("<!--");
            output.push_str(text);
            output.push_str("-->");
        }
        Node::ProcessingInstruction { target, data } => {
            output.push_str("<?");
            output.push_str(target);
            if !data.is_empty() {
                output.push(' ');
                output.push_str(data);
            }
            output.push_str("?>");
        }
        Node::Doctype(body) => {
            output.push_str("<!DOCTYPE");
            output.push_str(body);
            output.push('>');
        }
    }
}

fn write_element(element: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);

    for (key, value) in &element.attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        escape_into(value, true, output);
        output.push('"');
    }

    if element.children.is_empty() {
        output.push_str("/>");
        return;
    }

    output.push('>');
    for child in &element.children {
        write_node(child, output);
    }
    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn escape_into(input: &str, attribute: bool, output: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' if !attribute => output.push_str("&gt;"),
            '"' if attribute => output.push_str("&quot;"),
            _ => output.push(ch),
        }
    }
}

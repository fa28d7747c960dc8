//! XML data model

use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// XML document
///
/// Everything outside the root element is kept so that writing a parsed
/// document reproduces its prolog and trailing comments.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Document {
    /// Body of the `<?xml ...?>` declaration, without the delimiters
    pub declaration: Option<String>,
    /// Nodes between the declaration and the root element
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Nodes after the root element
    pub epilog: Vec<Node>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// XML element
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    /// Child elements in document order, skipping other node types
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First child element with the given name
    pub fn element(&self, name: &str) -> Option<&Self> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated text and CDATA content of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Number of elements in this subtree, including `self`
    pub fn count_elements(&self) -> usize {
        1 + self.elements().map(Self::count_elements).sum::<usize>()
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) | Node::CData(text) => out.push_str(text),
            Node::Element(inner) => collect_text(inner, out),
            _ => {}
        }
    }
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
    /// Raw body of a `<!DOCTYPE ...>` declaration; only found in the prolog
    Doctype(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("root")
            .with_child(Element::new("a").with_text("one"))
            .with_child(Node::Comment(" note ".to_string()))
            .with_child(
                Element::new("b")
                    .with_attribute("id", "2")
                    .with_child(Node::CData("two".to_string())),
            )
    }

    #[test]
    fn test_elements_skip_non_element_nodes() {
        let root = sample();
        let names: Vec<&str> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_element_lookup() {
        let root = sample();
        let b = root.element("b");
        assert_eq!(b.and_then(|e| e.attributes.get("id")).map(String::as_str), Some("2"));
        assert!(root.element("missing").is_none());
    }

    #[test]
    fn test_text_includes_cdata_and_descendants() {
        assert_eq!(sample().text(), "onetwo");
    }

    #[test]
    fn test_count_elements() {
        assert_eq!(sample().count_elements(), 3);
    }
}

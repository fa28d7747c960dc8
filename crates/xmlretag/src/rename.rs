//! Element tag renaming
//!
//! The tree is rebuilt bottom-up: children are renamed first and moved onto
//! a replacement element that carries the new name and the original
//! attributes. Only element names are looked up; text, CDATA, comments,
//! processing instructions and attribute names pass through untouched.

use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mapping::TagMapping;
use crate::xml::model::{Document, Element, Node};

/// Whether matched tags are actually replaced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "kebab-case"))]
pub enum RenameMode {
    #[default]
    Apply,
    /// Log and count matches, leave the tree unchanged
    DryRun,
}

/// Counters collected during one rename pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenameStats {
    /// Elements inspected
    pub visited: usize,
    /// Elements whose name matched a rule (renamed, or would be in a dry run)
    pub renamed: usize,
    /// Matches per original tag name, in order of first match
    pub by_tag: IndexMap<String, usize>,
}

impl RenameStats {
    fn record(&mut self, old: &str) {
        self.renamed += 1;
        *self.by_tag.entry(old.to_string()).or_default() += 1;
    }
}

/// Renames element tags according to a [`TagMapping`]
#[derive(Clone, Copy, Debug)]
pub struct TagRenamer<'m> {
    mapping: &'m TagMapping,
    mode: RenameMode,
}

impl<'m> TagRenamer<'m> {
    pub const fn new(mapping: &'m TagMapping) -> Self {
        Self {
            mapping,
            mode: RenameMode::Apply,
        }
    }

    pub const fn with_mode(mut self, mode: RenameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn rename(&self, document: Document) -> (Document, RenameStats) {
        let mut stats = RenameStats::default();
        let Document {
            declaration,
            prolog,
            root,
            epilog,
        } = document;
        let root = self.rename_element(root, &mut stats);
        debug!(
            visited = stats.visited,
            renamed = stats.renamed,
            "rename pass finished"
        );

        let document = Document {
            declaration,
            prolog,
            root,
            epilog,
        };
        (document, stats)
    }

    fn rename_element(&self, element: Element, stats: &mut RenameStats) -> Element {
        let Element {
            name,
            attributes,
            children,
        } = element;

        let children = children
            .into_iter()
            .map(|node| match node {
                Node::Element(child) => Node::Element(self.rename_element(child, stats)),
                other => other,
            })
            .collect();

        stats.visited += 1;
        let name = match self.mapping.get(&name) {
            Some(new_name) => {
                stats.record(&name);
                match self.mode {
                    RenameMode::Apply => {
                        debug!(from = %name, to = new_name, "renaming element");
                        new_name.to_string()
                    }
                    RenameMode::DryRun => {
                        info!(from = %name, to = new_name, "would rename element");
                        name
                    }
                }
            }
            None => name,
        };

        Element {
            name,
            attributes,
            children,
        }
    }
}

/// Rename every element of `document` whose tag is a key in `mapping`
pub fn rename(document: Document, mapping: &TagMapping) -> Document {
    TagRenamer::new(mapping).rename(document).0
}

//! Tag mapping files
//!
//! A mapping file holds one rule per line in the form `old,new`. Lines that
//! do not split into exactly two XML names on `,` are skipped; the
//! [`LoadReport`] records where they were so a caller can warn about them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::Iter;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::parser::is_name;

/// Old tag name to new tag name, in order of first appearance
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TagMapping {
    rules: IndexMap<String, String>,
}

impl TagMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; a repeated key keeps its position and takes the new value
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.rules.insert(old.into(), new.into());
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.rules.get(old).map(String::as_str)
    }

    pub fn contains(&self, old: &str) -> bool {
        self.rules.contains_key(old)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.rules.iter()
    }

    /// Parse mapping text leniently
    pub fn parse(text: &str) -> (Self, LoadReport) {
        let mut mapping = Self::new();
        let mut report = LoadReport::default();
        for (index, line) in text.lines().enumerate() {
            report.record(index + 1, parse_line(line), &mut mapping);
        }
        (mapping, report)
    }
}

impl<'a> IntoIterator for &'a TagMapping {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (old, new) in iter {
            mapping.insert(old, new);
        }
        mapping
    }
}

/// What a mapping load accepted and skipped
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadReport {
    /// Lines accepted as rules, including ones overriding an earlier key
    pub rules: usize,
    pub blank_lines: usize,
    /// 1-based numbers of malformed lines
    pub skipped: Vec<usize>,
}

impl LoadReport {
    fn record(&mut self, line_no: usize, line: Line<'_>, mapping: &mut TagMapping) {
        match line {
            Line::Blank => self.blank_lines += 1,
            Line::Malformed => {
                debug!(line = line_no, "skipping malformed mapping line");
                self.skipped.push(line_no);
            }
            Line::Rule(old, new) => {
                if let Some(previous) = mapping.get(old) {
                    debug!(line = line_no, old, previous, new, "mapping rule overridden");
                }
                mapping.insert(old, new);
                self.rules += 1;
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Malformed,
    Rule(&'a str, &'a str),
}

fn parse_line(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }

    let mut tokens = line.split(',');
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(old), Some(new), None) => {
            let (old, new) = (old.trim(), new.trim());
            if is_name(old) && is_name(new) {
                Line::Rule(old, new)
            } else {
                Line::Malformed
            }
        }
        _ => Line::Malformed,
    }
}

/// Reads mapping files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MappingLoader {
    strict: bool,
}

impl MappingLoader {
    /// A loader that skips malformed lines
    pub const fn new() -> Self {
        Self { strict: false }
    }

    /// A loader that fails on the first malformed line
    pub const fn strict() -> Self {
        Self { strict: true }
    }

    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<TagMapping> {
        self.load_with_report(path).map(|(mapping, _)| mapping)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_with_report(&self, path: impl AsRef<Path>) -> Result<(TagMapping, LoadReport)> {
        let path = path.as_ref();
        let file = open_file(path)?;
        let (mapping, report) = self
            .read(BufReader::new(file))
            .map_err(|err| err.with_path(path))?;

        if !report.skipped.is_empty() {
            warn!(
                count = report.skipped.len(),
                lines = ?report.skipped,
                "skipped malformed mapping lines"
            );
        }
        debug!(rules = mapping.len(), "mapping loaded");
        Ok((mapping, report))
    }

    /// Read rules from any buffered source, one line at a time
    pub fn read<R: BufRead>(&self, reader: R) -> Result<(TagMapping, LoadReport)> {
        let mut mapping = TagMapping::new();
        let mut report = LoadReport::default();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|err| {
                Error::with_message(ErrorKind::Io, Span::empty(), format!("line {line_no}: {err}"))
            })?;
            let parsed = parse_line(&line);
            if self.strict && parsed == Line::Malformed {
                return Err(Error::new(
                    ErrorKind::MalformedMapping { line: line_no },
                    Span::empty(),
                ));
            }
            report.record(line_no, parsed, &mut mapping);
        }

        Ok((mapping, report))
    }
}

fn open_file(path: &Path) -> Result<File> {
    if path.is_dir() {
        return Err(Error::with_message(
            ErrorKind::FileNotFound,
            Span::empty(),
            "is a directory",
        )
        .with_path(path));
    }
    File::open(path).map_err(|err| Error::read(path, &err))
}

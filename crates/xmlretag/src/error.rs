//! Error types for xmlretag

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Position in an input file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in an input file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    /// Spans built with [`Span::empty`] carry no location
    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input path was not provided
    InputMissing { what: String },
    FileNotFound,
    Io,
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    /// A character outside the XML character range
    InvalidChar { ch: char },
    UnsupportedEncoding { encoding: String },
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
    /// Only produced by a strict mapping loader
    MalformedMapping { line: usize },
    Write,
    OutputExists,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputMissing { what } => write!(f, "no {what} selected"),
            Self::FileNotFound => write!(f, "file not found"),
            Self::Io => write!(f, "i/o error"),
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::InvalidChar { ch } => {
                write!(f, "character U+{:04X} is not allowed in XML", u32::from(*ch))
            }
            Self::UnsupportedEncoding { encoding } => {
                write!(f, "unsupported encoding: {encoding}")
            }
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::MalformedMapping { line } => {
                write!(f, "malformed mapping rule on line {line}, expected `old,new`")
            }
            Self::Write => write!(f, "write failed"),
            Self::OutputExists => write!(f, "output file already exists"),
        }
    }
}

/// Coarse grouping of [`ErrorKind`]s, one per failure a caller reports differently
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    InputMissing,
    Read,
    Parse,
    Mapping,
    Write,
}

/// Main error type for xmlretag
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
    path: Option<PathBuf>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
            path: None,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            path: None,
        }
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    pub fn input_missing(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputMissing { what: what.into() }, Span::empty())
    }

    /// Classify a failure to read `path`
    pub fn read(path: &Path, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            _ => ErrorKind::Io,
        };
        Self::with_message(kind, Span::empty(), err.to_string()).with_path(path)
    }

    /// Classify a failure to write `path`
    pub fn write(path: &Path, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::AlreadyExists => ErrorKind::OutputExists,
            _ => ErrorKind::Write,
        };
        Self::with_message(kind, Span::empty(), err.to_string()).with_path(path)
    }

    /// Attach the file the error refers to, keeping an already attached one
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn category(&self) -> Category {
        match self.kind {
            ErrorKind::InputMissing { .. } => Category::InputMissing,
            ErrorKind::FileNotFound | ErrorKind::Io => Category::Read,
            ErrorKind::MalformedMapping { .. } => Category::Mapping,
            ErrorKind::Write | ErrorKind::OutputExists => Category::Write,
            ErrorKind::InvalidToken
            | ErrorKind::UnexpectedEof
            | ErrorKind::MismatchedTag { .. }
            | ErrorKind::DuplicateAttribute { .. }
            | ErrorKind::InvalidEntity { .. }
            | ErrorKind::InvalidUtf8
            | ErrorKind::InvalidChar { .. }
            | ErrorKind::UnsupportedEncoding { .. }
            | ErrorKind::MaxDepthExceeded { .. }
            | ErrorKind::MaxSizeExceeded { .. } => Category::Parse,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}:", path.display())?;
            if !self.span.is_empty() {
                write!(f, "{}:", self.span.start)?;
            }
            write!(f, " ")?;
        } else if !self.span.is_empty() {
            write!(f, "error at {}: ", self.span.start)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Result type alias for xmlretag
pub type Result<T> = std::result::Result<T, Error>;

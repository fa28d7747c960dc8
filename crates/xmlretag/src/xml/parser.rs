//! XML parser implementation

use indexmap::IndexMap;

use crate::cursor::{Cursor, is_whitespace};
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::model::{Document, Element, Node};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default limits
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let size = self.cursor.remaining().len();
        if self.config.max_size != 0 && size > self.config.max_size {
            return Err(Error::new(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                Span::empty(),
            ));
        }

        self.cursor.eat(UTF8_BOM);
        let declaration = self.parse_declaration()?;
        let prolog = self.parse_misc(true)?;

        if self.cursor.is_eof() {
            return Err(self.eof_here("missing root element"));
        }
        let root = self.parse_element()?;
        let epilog = self.parse_misc(false)?;

        Ok(Document {
            declaration,
            prolog,
            root,
            epilog,
        })
    }

    fn parse_declaration(&mut self) -> Result<Option<String>> {
        if !self.cursor.starts_with(b"<?xml") {
            return Ok(None);
        }
        // `<?xml-stylesheet ...?>` and friends are ordinary processing instructions
        match self.cursor.peek(5) {
            Some(b) if is_whitespace(b) || b == b'?' => {}
            _ => return Ok(None),
        }

        let at = self.cursor.position();
        self.cursor.advance_by(5);
        let body = self.take_until(b"?>")?;
        if let Some(encoding) = declared_encoding(&body).filter(|e| !is_supported_encoding(e)) {
            return Err(Error::at(
                ErrorKind::UnsupportedEncoding {
                    encoding: encoding.to_string(),
                },
                at,
            ));
        }
        Ok(Some(body.trim().to_string()))
    }

    /// Comments, processing instructions, whitespace and (in the prolog) a doctype
    fn parse_misc(&mut self, in_prolog: bool) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut seen_doctype = false;

        loop {
            let start = self.cursor.pos();
            self.cursor.skip_whitespace();
            if self.cursor.pos() > start {
                let space = String::from_utf8_lossy(self.cursor.slice_from(start)).into_owned();
                nodes.push(Node::Text(space));
            }

            if self.cursor.starts_with(b"<!--") {
                nodes.push(self.parse_comment()?);
            } else if self.cursor.starts_with(b"<?") {
                nodes.push(self.parse_processing_instruction()?);
            } else if in_prolog && !seen_doctype && self.cursor.starts_with(b"<!DOCTYPE") {
                nodes.push(self.parse_doctype()?);
                seen_doctype = true;
            } else {
                break;
            }
        }

        match self.cursor.current() {
            None => Ok(nodes),
            Some(b'<') if in_prolog => Ok(nodes),
            Some(_) if in_prolog => Err(self.error_here("expected root element")),
            Some(_) => Err(self.error_here("unexpected content after root element")),
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        let open = self.cursor.position();
        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.eat(b"/>") {
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect_byte(b'>')?;

        self.enter_nested(open)?;
        let children = self.parse_children(&name, open)?;
        self.depth = self.depth.saturating_sub(1);

        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_children(&mut self, name: &str, open: Pos) -> Result<Vec<Node>> {
        let mut children = Vec::new();

        loop {
            if self.cursor.is_eof() {
                return Err(Error::with_message(
                    ErrorKind::UnexpectedEof,
                    Span::new(open, self.cursor.position()),
                    format!("unterminated element <{name}>"),
                ));
            }

            if self.cursor.starts_with(b"</") {
                let close = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::new(
                        ErrorKind::MismatchedTag {
                            expected: name.to_string(),
                            found: close_name,
                        },
                        Span::new(close, self.cursor.position()),
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                return Ok(children);
            }

            let child = if self.cursor.starts_with(b"<!--") {
                self.parse_comment()?
            } else if self.cursor.eat(b"<![CDATA[") {
                Node::CData(self.take_until(b"]]>")?)
            } else if self.cursor.starts_with(b"<?") {
                self.parse_processing_instruction()?
            } else if self.cursor.current() == Some(b'<') {
                Node::Element(self.parse_element()?)
            } else {
                self.parse_text()?
            };
            children.push(child);
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let before = self.cursor.pos();
            self.cursor.skip_whitespace();
            let separated = self.cursor.pos() > before;

            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !separated => {
                    return Err(self.error_here("expected whitespace before attribute"));
                }
                Some(_) => {}
                None => return Err(self.eof_here("unterminated start tag")),
            }

            let at = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, at));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            None => return Err(self.eof_here("expected quoted attribute value")),
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw, start_pos)?;
                check_chars(&text, start_pos)?;
                return decode_entities(&text, start_pos);
            }
            if b == b'<' {
                return Err(self.error_here("'<' is not allowed in attribute values"));
            }
            self.cursor.advance();
        }

        Err(self.eof_here("unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<Node> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let text = bytes_to_string(self.cursor.slice_from(start), start_pos)?;
        check_chars(&text, start_pos)?;
        Ok(Node::Text(decode_entities(&text, start_pos)?))
    }

    fn parse_comment(&mut self) -> Result<Node> {
        self.cursor.advance_by(4);
        Ok(Node::Comment(self.take_until(b"-->")?))
    }

    fn parse_processing_instruction(&mut self) -> Result<Node> {
        let at = self.cursor.position();
        self.cursor.advance_by(2);
        let target = self.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::at(at),
                "xml declaration is only allowed at the start of the document",
            ));
        }

        if self.cursor.eat(b"?>") {
            return Ok(Node::ProcessingInstruction {
                target,
                data: String::new(),
            });
        }
        match self.cursor.current() {
            Some(b) if is_whitespace(b) => self.cursor.skip_whitespace(),
            None => return Err(self.eof_here("unterminated processing instruction")),
            Some(_) => return Err(self.error_here("expected whitespace after target")),
        }

        let data = self.take_until(b"?>")?;
        Ok(Node::ProcessingInstruction { target, data })
    }

    fn parse_doctype(&mut self) -> Result<Node> {
        self.cursor.advance_by(9);
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        let mut brackets = 0usize;
        let mut quote = None;

        while let Some(b) = self.cursor.current() {
            // Markup declarations may hold comments and PIs whose text is not quoted
            if quote.is_none() && brackets > 0 {
                if self.cursor.eat(b"<!--") {
                    self.take_until(b"-->")?;
                    continue;
                }
                if self.cursor.eat(b"<?") {
                    self.take_until(b"?>")?;
                    continue;
                }
            }
            match (quote, b) {
                (Some(q), _) if q == b => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => brackets += 1,
                (None, b']') => brackets = brackets.saturating_sub(1),
                (None, b'>') if brackets == 0 => {
                    let raw = self.cursor.slice_from(start);
                    self.cursor.advance();
                    let text = bytes_to_string(raw, start_pos)?;
                    check_chars(&text, start_pos)?;
                    return Ok(Node::Doctype(text));
                }
                (None, _) => {}
            }
            self.cursor.advance();
        }

        Err(self.eof_here("unterminated doctype"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            Some(_) => return Err(self.error_here("expected name")),
            None => return Err(self.eof_here("expected name")),
        }
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), start_pos)
    }

    /// Consume input up to and including `pattern`, returning what came before it
    fn take_until(&mut self, pattern: &[u8]) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                let text = bytes_to_string(raw, start_pos)?;
                check_chars(&text, start_pos)?;
                return Ok(text);
            }
            self.cursor.advance();
        }

        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::new(start_pos, self.cursor.position()),
            "unterminated markup",
        ))
    }

    fn enter_nested(&mut self, at: Pos) -> Result<()> {
        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth != 0 && self.depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                at,
            ));
        }
        Ok(())
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        match self.cursor.current() {
            Some(b) if b == expected => {
                self.cursor.advance();
                Ok(())
            }
            None => Err(self.eof_here(&format!("expected '{}'", char::from(expected)))),
            Some(_) => Err(self.error_here(&format!("expected '{}'", char::from(expected)))),
        }
    }

    fn error_here(&self, message: &str) -> Error {
        Error::with_message(
            ErrorKind::InvalidToken,
            Span::at(self.cursor.position()),
            message,
        )
    }

    fn eof_here(&self, message: &str) -> Error {
        Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::at(self.cursor.position()),
            message,
        )
    }
}

fn bytes_to_string(bytes: &[u8], at: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::at(ErrorKind::InvalidUtf8, at))
}

// Bytes >= 0x80 belong to multi-byte UTF-8 sequences; their validity is
// checked when the name is converted to a string.
const fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':' | 0x80..=0xFF)
}

const fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

/// Whether `name` would be read back as a single tag name
pub(crate) fn is_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes.next().is_some_and(is_name_start) && bytes.all(is_name_char)
}

/// The `Char` production of XML 1.0
const fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_chars(text: &str, at: Pos) -> Result<()> {
    match text.char_indices().find(|(_, c)| !is_xml_char(*c)) {
        Some((offset, ch)) => Err(Error::at(
            ErrorKind::InvalidChar { ch },
            pos_after(at, text.get(..offset).unwrap_or_default()),
        )),
        None => Ok(()),
    }
}

/// Position reached after reading `text` starting at `pos`
fn pos_after(mut pos: Pos, text: &str) -> Pos {
    for ch in text.chars() {
        pos.offset += ch.len_utf8();
        if ch == '\n' {
            pos.line += 1;
            pos.col = 1;
        } else {
            pos.col += 1;
        }
    }
    pos
}

/// Value of the `encoding` pseudo-attribute of a declaration body
fn declared_encoding(body: &str) -> Option<&str> {
    let (_, rest) = body.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let (value, _) = rest.get(1..)?.split_once(quote)?;
    Some(value)
}

// ASCII is a subset of UTF-8, so documents declaring it are read as is.
fn is_supported_encoding(encoding: &str) -> bool {
    ["UTF-8", "UTF8", "US-ASCII", "ASCII"]
        .iter()
        .any(|supported| encoding.eq_ignore_ascii_case(supported))
}

fn decode_entities(input: &str, at: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some((before, after)) = rest.split_once('&') {
        result.push_str(before);
        let amp = input.len() - after.len() - 1;
        let here = || pos_after(at, input.get(..amp).unwrap_or_default());

        let Some((entity, tail)) = after.split_once(';') else {
            let entity = after
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '#')
                .collect();
            return Err(Error::at(ErrorKind::InvalidEntity { entity }, here()));
        };

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::at(
                    ErrorKind::InvalidEntity {
                        entity: entity.to_string(),
                    },
                    here(),
                ));
            }
        }
        rest = tail;
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let (digits, radix) = if let Some(hex) = entity.strip_prefix("#x") {
        (hex, 16)
    } else if let Some(dec) = entity.strip_prefix('#') {
        (dec, 10)
    } else {
        return None;
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .filter(|c| is_xml_char(*c))
}

//! Content stream tokenizer.
//!
//! `ContentParser` turns one or more content stream segments into operands,
//! operators and inline images. Page `Contents` arrays are read as a single
//! logical stream; tokens may straddle segment boundaries.

use bytes::Bytes;

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject};

/// Token types produced by `ContentParser`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    /// An operand (number, string, name, array, dict, bool, null)
    Operand(PDFObject),
    /// An operator keyword (BT, ET, Tj, etc.)
    Operator(String),
    /// A complete `BI ... ID ... EI` sequence
    InlineImage(InlineImage),
    /// A malformed inline image, with the reason
    BadInlineImage(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub dict: PDFDict,
    pub data: Bytes,
}

/// Raw lexical units before arrays and dictionaries are assembled.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Int(i64),
    Real(f64),
    Name(String),
    String(Vec<u8>),
    Keyword(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    BraceOpen,
    BraceClose,
}

struct SegmentedCursor {
    segments: Vec<Bytes>,
    offsets: Vec<usize>,
    seg_index: usize,
    seg_pos: usize,
    total_len: usize,
}

impl SegmentedCursor {
    fn new(mut segments: Vec<Bytes>) -> Self {
        segments.retain(|seg| !seg.is_empty());
        let mut offsets = Vec::with_capacity(segments.len());
        let mut total_len = 0usize;
        for seg in &segments {
            offsets.push(total_len);
            total_len = total_len.saturating_add(seg.len());
        }
        Self {
            segments,
            offsets,
            seg_index: 0,
            seg_pos: 0,
            total_len,
        }
    }

    fn at_end(&self) -> bool {
        self.tell() >= self.total_len
    }

    fn tell(&self) -> usize {
        if self.seg_index >= self.segments.len() {
            self.total_len
        } else {
            self.offsets[self.seg_index] + self.seg_pos
        }
    }

    fn normalize(&mut self) {
        while self.seg_index < self.segments.len()
            && self.seg_pos >= self.segments[self.seg_index].len()
        {
            self.seg_index += 1;
            self.seg_pos = 0;
        }
    }

    fn current_slice(&self) -> &[u8] {
        if self.seg_index >= self.segments.len() {
            &[]
        } else {
            &self.segments[self.seg_index][self.seg_pos..]
        }
    }

    fn peek(&self) -> Option<u8> {
        self.current_slice().first().copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        let mut idx = self.seg_index;
        let mut pos = self.seg_pos + offset;
        while idx < self.segments.len() {
            let seg = &self.segments[idx];
            if pos < seg.len() {
                return Some(seg[pos]);
            }
            pos -= seg.len();
            idx += 1;
        }
        None
    }

    fn advance(&mut self, mut count: usize) {
        while count > 0 && self.seg_index < self.segments.len() {
            let remaining = self.segments[self.seg_index].len().saturating_sub(self.seg_pos);
            if count < remaining {
                self.seg_pos += count;
                return;
            }
            count -= remaining;
            self.seg_index += 1;
            self.seg_pos = 0;
        }
    }

    fn advance_one(&mut self) -> Option<u8> {
        self.normalize();
        let b = self.peek()?;
        self.advance(1);
        Some(b)
    }

    fn match_bytes(&self, target: &[u8]) -> bool {
        target
            .iter()
            .enumerate()
            .all(|(i, &b)| self.peek_at(i) == Some(b))
    }
}

struct Lexer {
    cursor: SegmentedCursor,
}

impl Lexer {
    fn next_lexeme(&mut self) -> Option<Result<(usize, Lexeme)>> {
        self.skip_whitespace();
        if self.cursor.at_end() {
            return None;
        }
        let pos = self.cursor.tell();
        let b = self.cursor.peek()?;

        let result = match b {
            b'/' => Ok(self.parse_name()),
            b'(' => self.parse_string(),
            b'<' => {
                if self.cursor.peek_at(1) == Some(b'<') {
                    self.cursor.advance(2);
                    Ok(Lexeme::DictStart)
                } else {
                    self.parse_hex_string()
                }
            }
            b'>' => {
                if self.cursor.peek_at(1) == Some(b'>') {
                    self.cursor.advance(2);
                    Ok(Lexeme::DictEnd)
                } else {
                    self.cursor.advance(1);
                    Err(PdfError::SyntaxError {
                        pos,
                        msg: "unbalanced '>'".into(),
                    })
                }
            }
            b'[' => {
                self.cursor.advance(1);
                Ok(Lexeme::ArrayStart)
            }
            b']' => {
                self.cursor.advance(1);
                Ok(Lexeme::ArrayEnd)
            }
            b'{' => {
                self.cursor.advance(1);
                Ok(Lexeme::BraceOpen)
            }
            b'}' => {
                self.cursor.advance(1);
                Ok(Lexeme::BraceClose)
            }
            b')' => {
                self.cursor.advance(1);
                Err(PdfError::SyntaxError {
                    pos,
                    msg: "unbalanced ')'".into(),
                })
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.parse_number(pos),
            _ => Ok(self.parse_keyword()),
        };
        Some(result.map(|lexeme| (pos, lexeme)))
    }

    fn skip_whitespace(&mut self) {
        loop {
            self.cursor.normalize();
            match self.cursor.peek() {
                Some(b'%') => {
                    while let Some(b) = self.cursor.advance_one() {
                        if b == b'\n' || b == b'\r' {
                            break;
                        }
                    }
                }
                Some(b) if is_whitespace(b) => {
                    let n = self
                        .cursor
                        .current_slice()
                        .iter()
                        .take_while(|&&b| is_whitespace(b))
                        .count();
                    self.cursor.advance(n);
                }
                _ => return,
            }
        }
    }

    fn parse_name(&mut self) -> Lexeme {
        self.cursor.advance(1); // skip '/'
        let mut name = Vec::with_capacity(16);
        loop {
            self.cursor.normalize();
            let Some(b) = self.cursor.peek() else { break };
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            if b == b'#'
                && let (Some(h1), Some(h2)) = (
                    self.cursor.peek_at(1).and_then(hex_value),
                    self.cursor.peek_at(2).and_then(hex_value),
                )
            {
                self.cursor.advance(3);
                name.push((h1 << 4) | h2);
                continue;
            }
            name.push(b);
            self.cursor.advance(1);
        }
        Lexeme::Name(String::from_utf8_lossy(&name).into_owned())
    }

    fn parse_number(&mut self, start: usize) -> Result<Lexeme> {
        let mut text = String::with_capacity(12);
        loop {
            self.cursor.normalize();
            match self.cursor.peek() {
                Some(b @ (b'0'..=b'9' | b'.')) => text.push(b as char),
                Some(b @ (b'+' | b'-')) if text.is_empty() => text.push(b as char),
                _ => break,
            }
            self.cursor.advance(1);
        }
        if !text.bytes().any(|b| b.is_ascii_digit()) {
            return Err(PdfError::SyntaxError {
                pos: start,
                msg: "invalid number".into(),
            });
        }
        if text.contains('.') {
            let value = text.parse::<f64>().map_err(|_| PdfError::SyntaxError {
                pos: start,
                msg: format!("invalid number {text}"),
            })?;
            Ok(Lexeme::Real(value))
        } else {
            match text.parse::<i64>() {
                Ok(v) => Ok(Lexeme::Int(v)),
                Err(_) => Ok(Lexeme::Real(text.parse::<f64>().unwrap_or(0.0))),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Lexeme> {
        self.cursor.advance(1); // skip '('
        let mut result = Vec::with_capacity(32);
        let mut depth = 1;

        while depth > 0 {
            match self.cursor.advance_one() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.cursor.advance_one() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        self.cursor.normalize();
                        if self.cursor.peek() == Some(b'\n') {
                            self.cursor.advance(1);
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = (c - b'0') as u32;
                        for _ in 0..2 {
                            self.cursor.normalize();
                            match self.cursor.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.cursor.advance(1);
                                    octal = octal * 8 + (d - b'0') as u32;
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(Lexeme::String(result))
    }

    fn parse_hex_string(&mut self) -> Result<Lexeme> {
        self.cursor.advance(1); // skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.cursor.advance_one() {
                Some(b'>') => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    let nibble = hex_value(c).unwrap_or(0);
                    if let Some(high) = pending.take() {
                        result.push((high << 4) | nibble);
                    } else {
                        pending = Some(nibble);
                    }
                }
                Some(c) if is_whitespace(c) => {}
                Some(_) => {}
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        if let Some(nibble) = pending {
            result.push(nibble << 4);
        }

        Ok(Lexeme::String(result))
    }

    fn parse_keyword(&mut self) -> Lexeme {
        let mut bytes = Vec::with_capacity(8);
        loop {
            self.cursor.normalize();
            match self.cursor.peek() {
                Some(b) if !is_keyword_end(b) => {
                    bytes.push(b);
                    self.cursor.advance(1);
                }
                _ => break,
            }
        }
        Lexeme::Keyword(bytes)
    }

    /// Reads raw bytes up to `target` followed by whitespace or end of data.
    ///
    /// Returns `None` when the terminator is never found.
    fn read_inline_data(&mut self, target: &[u8]) -> Option<Vec<u8>> {
        // A single whitespace byte separates ID from the data.
        self.cursor.normalize();
        if matches!(self.cursor.peek(), Some(b) if is_whitespace(b)) {
            self.cursor.advance(1);
        }

        let mut data = Vec::new();
        while !self.cursor.at_end() {
            self.cursor.normalize();
            if self.cursor.match_bytes(target) {
                let before_ok = target != b"EI" || data.last().is_none_or(|&b| is_whitespace(b));
                let after = self.cursor.peek_at(target.len());
                if before_ok && after.is_none_or(is_keyword_end) {
                    self.cursor.advance(target.len());
                    if target != b"EI" {
                        // "~>" is followed by the EI operator itself.
                        self.skip_whitespace();
                        if self.cursor.match_bytes(b"EI") {
                            self.cursor.advance(2);
                        }
                        data.extend_from_slice(target);
                    }
                    while data.last() == Some(&b'\r') || data.last() == Some(&b'\n') {
                        data.pop();
                    }
                    if target == b"EI" && data.last().is_some_and(|&b| is_whitespace(b)) {
                        data.pop();
                    }
                    return Some(data);
                }
            }
            data.push(self.cursor.advance_one()?);
        }
        None
    }
}

/// Context frame for tracking array/dict/proc construction
#[derive(Debug)]
enum Context {
    Array(Vec<PDFObject>),
    Dict(Vec<PDFObject>),
    Proc(Vec<PDFObject>),
}

/// Parser for PDF content streams.
///
/// Content streams contain a sequence of operators and operands.
/// Operands precede their operator. Inline images (`BI`/`ID`/`EI`) are
/// collected into a single token.
pub struct ContentParser {
    lexer: Lexer,
    context_stack: Vec<Context>,
    /// Offset of the last token returned
    pos: usize,
}

impl ContentParser {
    /// Create a new content parser from one or more content streams.
    pub fn new(segments: Vec<Bytes>) -> Self {
        Self {
            lexer: Lexer {
                cursor: SegmentedCursor::new(segments),
            },
            context_stack: Vec::new(),
            pos: 0,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(vec![data.into()])
    }

    /// Offset of the most recent token.
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the next token, skipping malformed lexemes.
    pub fn next_token(&mut self) -> Option<ContentToken> {
        loop {
            let (pos, lexeme) = match self.lexer.next_lexeme()? {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping bad token");
                    continue;
                }
            };
            if self.context_stack.is_empty() {
                self.pos = pos;
            }
            let obj = match lexeme {
                Lexeme::Int(v) => PDFObject::Int(v),
                Lexeme::Real(v) => PDFObject::Real(v),
                Lexeme::Name(n) => PDFObject::Name(n),
                Lexeme::String(s) => PDFObject::String(s),
                Lexeme::ArrayStart => {
                    self.context_stack.push(Context::Array(Vec::new()));
                    continue;
                }
                Lexeme::DictStart => {
                    self.context_stack.push(Context::Dict(Vec::new()));
                    continue;
                }
                Lexeme::BraceOpen => {
                    self.context_stack.push(Context::Proc(Vec::new()));
                    continue;
                }
                Lexeme::ArrayEnd | Lexeme::DictEnd | Lexeme::BraceClose => {
                    match (lexeme, self.context_stack.pop()) {
                        (Lexeme::ArrayEnd, Some(Context::Array(items)))
                        | (Lexeme::BraceClose, Some(Context::Proc(items))) => {
                            PDFObject::Array(items)
                        }
                        (Lexeme::DictEnd, Some(Context::Dict(items))) => {
                            PDFObject::Dict(build_dict(items))
                        }
                        (_, other) => {
                            // Mismatched close; drop the open frame.
                            if other.is_some() {
                                tracing::debug!(pos, "mismatched array/dict close");
                            }
                            continue;
                        }
                    }
                }
                Lexeme::Keyword(kw) => match kw.as_slice() {
                    b"true" => PDFObject::Bool(true),
                    b"false" => PDFObject::Bool(false),
                    b"null" => PDFObject::Null,
                    _ if !self.context_stack.is_empty() => {
                        PDFObject::Name(String::from_utf8_lossy(&kw).into_owned())
                    }
                    b"BI" => return Some(self.read_inline_image()),
                    _ => {
                        return Some(ContentToken::Operator(
                            String::from_utf8_lossy(&kw).into_owned(),
                        ));
                    }
                },
            };
            match self.context_stack.last_mut() {
                Some(Context::Array(items) | Context::Dict(items) | Context::Proc(items)) => {
                    items.push(obj);
                }
                None => return Some(ContentToken::Operand(obj)),
            }
        }
    }

    /// Collects the inline image dictionary up to `ID`, then its data.
    fn read_inline_image(&mut self) -> ContentToken {
        let mut entries: Vec<PDFObject> = Vec::new();
        loop {
            match self.next_token() {
                Some(ContentToken::Operator(op)) if op == "ID" => break,
                Some(ContentToken::Operand(obj)) => entries.push(obj),
                Some(ContentToken::Operator(op)) if op == "EI" => {
                    return ContentToken::BadInlineImage("missing ID in inline image".into());
                }
                Some(ContentToken::Operator(op)) => entries.push(PDFObject::Name(op)),
                Some(other) => return other,
                None => {
                    return ContentToken::BadInlineImage("End of file in inline image".into());
                }
            }
        }

        let mut dict = PDFDict::new();
        let mut iter = entries.into_iter();
        while let Some(key) = iter.next() {
            let PDFObject::Name(key) = key else {
                return ContentToken::BadInlineImage(
                    "Inline image dictionary key must be a name object".into(),
                );
            };
            let Some(value) = iter.next() else {
                return ContentToken::BadInlineImage("End of file in inline image".into());
            };
            dict.insert(key, value);
        }

        let eos = inline_eos(&dict);
        match self.lexer.read_inline_data(eos) {
            Some(data) => ContentToken::InlineImage(InlineImage {
                dict,
                data: Bytes::from(data),
            }),
            None => ContentToken::BadInlineImage("End of file in inline image".into()),
        }
    }
}

impl Iterator for ContentParser {
    type Item = ContentToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Build dictionary from key-value pairs
fn build_dict(items: Vec<PDFObject>) -> PDFDict {
    let mut dict = PDFDict::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        if let PDFObject::Name(name) = key
            && let Some(value) = iter.next()
        {
            dict.insert(name, value);
        }
    }
    dict
}

/// End-of-data marker for an inline image.
fn inline_eos(dict: &PDFDict) -> &'static [u8] {
    let is_a85 = |o: &PDFObject| o.is_name("A85") || o.is_name("ASCII85Decode");
    match dict.get("F").or_else(|| dict.get("Filter")) {
        Some(PDFObject::Array(filters)) if filters.first().is_some_and(is_a85) => b"~>",
        Some(f) if is_a85(f) => b"~>",
        _ => b"EI",
    }
}

/// Check if byte is PDF whitespace.
const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn is_keyword_end(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

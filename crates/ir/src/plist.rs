//! OpenStep-style plist text, as used by `project.pbxproj`
//!
//! This module knows nothing about Xcode objects. It turns text into an
//! untyped [`Value`] tree (and back), and records where every entry of the
//! top-level `objects` dictionary starts and ends so that untouched objects
//! can be written back byte-for-byte.

use pbxgraft_core::{PbxError, PbxResult};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// Header line Xcode writes at the top of every project file
pub const DEFAULT_HEADER: &str = "// !$*UTF8*$!";

/// Dictionary with keys kept in sorted order, the order Xcode writes them in
pub type Dict = BTreeMap<String, Value>;

// ============================================================================
// Value
// ============================================================================

/// An untyped plist value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create an array of string values
    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Get the string content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the items, if this is an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the entries, if this is a dictionary
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Get the entries mutably, if this is a dictionary
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Equals,
    Semicolon,
    Comma,
    Str(String),
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::OpenBrace => "'{'".to_string(),
            TokenKind::CloseBrace => "'}'".to_string(),
            TokenKind::OpenParen => "'('".to_string(),
            TokenKind::CloseParen => "')'".to_string(),
            TokenKind::Equals => "'='".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Str(s) => format!("'{}'", s),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn error_at(&self, offset: usize, msg: impl Into<String>) -> PbxError {
        let (line, column) = line_column(self.src, offset);
        PbxError::format_at(line, column, msg)
    }

    fn skip_trivia(&mut self) -> PbxResult<()> {
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if bytes[self.pos..].starts_with(b"/*") {
                let start = self.pos;
                match self.src[self.pos + 2..].find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => return Err(self.error_at(start, "unterminated comment")),
                }
            } else if bytes[self.pos..].starts_with(b"//") {
                match self.src[self.pos..].find('\n') {
                    Some(end) => self.pos += end + 1,
                    None => self.pos = bytes.len(),
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> PbxResult<Option<Token>> {
        self.skip_trivia()?;
        let bytes = self.bytes();
        if self.pos >= bytes.len() {
            return Ok(None);
        }

        let start = self.pos;
        let punct = match bytes[start] {
            b'{' => Some(TokenKind::OpenBrace),
            b'}' => Some(TokenKind::CloseBrace),
            b'(' => Some(TokenKind::OpenParen),
            b')' => Some(TokenKind::CloseParen),
            b'=' => Some(TokenKind::Equals),
            b';' => Some(TokenKind::Semicolon),
            b',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = punct {
            self.pos += 1;
            return Ok(Some(Token {
                kind,
                start,
                end: self.pos,
            }));
        }

        if bytes[start] == b'"' {
            let value = self.quoted_string()?;
            return Ok(Some(Token {
                kind: TokenKind::Str(value),
                start,
                end: self.pos,
            }));
        }

        while self.pos < bytes.len() && !ends_bare_word(&bytes[self.pos..]) {
            self.pos += 1;
        }
        Ok(Some(Token {
            kind: TokenKind::Str(self.src[start..self.pos].to_string()),
            start,
            end: self.pos,
        }))
    }

    fn quoted_string(&mut self) -> PbxResult<String> {
        let start = self.pos;
        let mut value = String::new();
        let mut chars = self.src[start + 1..].char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos = start + 1 + offset + 1;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                other => value.push(other),
            }
        }
        Err(self.error_at(start, "unterminated string"))
    }
}

fn ends_bare_word(rest: &[u8]) -> bool {
    let b = rest[0];
    b.is_ascii_whitespace()
        || matches!(b, b'{' | b'}' | b'(' | b')' | b'=' | b';' | b',' | b'"')
        || rest.starts_with(b"/*")
}

fn line_column(src: &str, offset: usize) -> (usize, usize) {
    let before = &src[..offset.min(src.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    (line, column)
}

// ============================================================================
// Parser
// ============================================================================

/// A parsed project file before it is interpreted as an object graph
#[derive(Debug, Clone)]
pub struct Document {
    /// Text preceding the root dictionary (the `// !$*UTF8*$!` line)
    pub header: String,

    /// Root dictionary, including the `objects` dictionary
    pub root: Dict,

    /// Byte range of every `objects` entry, from its key up to its `;`
    pub object_spans: HashMap<String, Range<usize>>,
}

impl Document {
    /// Source text of one object entry
    pub fn object_text<'t>(&self, text: &'t str, id: &str) -> Option<&'t str> {
        self.object_spans.get(id).map(|range| &text[range.clone()])
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            peeked: None,
        }
    }

    fn next(&mut self) -> PbxResult<Option<Token>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn next_or_eof(&mut self, context: &str) -> PbxResult<Token> {
        self.next()?.ok_or_else(|| {
            self.lexer
                .error_at(self.lexer.src.len(), format!("unexpected end of input {}", context))
        })
    }

    fn expect(&mut self, kind: TokenKind) -> PbxResult<Token> {
        let token = self.next_or_eof(&format!("while expecting {}", kind.describe()))?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.lexer.error_at(
                token.start,
                format!("expected {}, found {}", kind.describe(), token.kind.describe()),
            ))
        }
    }

    fn document(&mut self) -> PbxResult<Document> {
        let first = self.next_or_eof("before the root dictionary")?;
        if first.kind != TokenKind::OpenBrace {
            return Err(self.lexer.error_at(
                first.start,
                format!("expected '{{', found {}", first.kind.describe()),
            ));
        }
        let header = self.lexer.src[..first.start].trim().to_string();

        let mut object_spans = HashMap::new();
        let root = self.dict_body(Some(&mut object_spans), true)?;

        if let Some(extra) = self.next()? {
            return Err(self.lexer.error_at(
                extra.start,
                format!("unexpected {} after the root dictionary", extra.kind.describe()),
            ));
        }

        Ok(Document {
            header,
            root,
            object_spans,
        })
    }

    /// Parse entries up to the closing brace. At the root, the `objects`
    /// dictionary is parsed with span capture enabled.
    fn dict_body(
        &mut self,
        mut spans: Option<&mut HashMap<String, Range<usize>>>,
        is_root: bool,
    ) -> PbxResult<Dict> {
        let mut dict = Dict::new();
        loop {
            let token = self.next_or_eof("inside a dictionary (missing '}')")?;
            let key = match token.kind {
                TokenKind::CloseBrace => return Ok(dict),
                TokenKind::Str(key) => key,
                other => {
                    return Err(self.lexer.error_at(
                        token.start,
                        format!("expected a key or '}}', found {}", other.describe()),
                    ));
                }
            };
            self.expect(TokenKind::Equals)?;

            let value_token = self.next_or_eof("while expecting a value")?;
            let value = if is_root
                && key == "objects"
                && value_token.kind == TokenKind::OpenBrace
                && spans.is_some()
            {
                Value::Dict(self.dict_body(spans.take(), false)?)
            } else {
                self.value_from(value_token)?
            };
            let semicolon = self.expect(TokenKind::Semicolon)?;

            if let Some(spans) = spans.as_deref_mut() {
                if !is_root {
                    if spans.contains_key(&key) {
                        return Err(self
                            .lexer
                            .error_at(token.start, format!("object '{}' defined twice", key)));
                    }
                    spans.insert(key.clone(), token.start..semicolon.end);
                }
            }
            dict.insert(key, value);
        }
    }

    fn array_body(&mut self) -> PbxResult<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            let token = self.next_or_eof("inside an array (missing ')')")?;
            if token.kind == TokenKind::CloseParen {
                return Ok(items);
            }
            items.push(self.value_from(token)?);

            let separator = self.next_or_eof("inside an array (missing ')')")?;
            match separator.kind {
                TokenKind::Comma => {}
                TokenKind::CloseParen => return Ok(items),
                other => {
                    return Err(self.lexer.error_at(
                        separator.start,
                        format!("expected ',' or ')', found {}", other.describe()),
                    ));
                }
            }
        }
    }

    fn value_from(&mut self, token: Token) -> PbxResult<Value> {
        match token.kind {
            TokenKind::Str(s) => Ok(Value::String(s)),
            TokenKind::OpenBrace => Ok(Value::Dict(self.dict_body(None, false)?)),
            TokenKind::OpenParen => Ok(Value::Array(self.array_body()?)),
            other => Err(self.lexer.error_at(
                token.start,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }
}

/// Parse project text into an untyped document
pub fn parse_document(text: &str) -> PbxResult<Document> {
    Parser::new(text).document()
}

/// Parse a single value, e.g. `(a, "b c")`
pub fn parse_value(text: &str) -> PbxResult<Value> {
    let mut parser = Parser::new(text);
    let token = parser.next_or_eof("while expecting a value")?;
    let value = parser.value_from(token)?;
    if let Some(extra) = parser.next()? {
        return Err(parser.lexer.error_at(
            extra.start,
            format!("unexpected {} after the value", extra.kind.describe()),
        ));
    }
    Ok(value)
}

// ============================================================================
// Writer
// ============================================================================

/// Whether a string must be quoted when written
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '/'))
}

/// Render a string the way Xcode writes it
pub fn quote(s: &str) -> String {
    if !needs_quotes(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Comment text that cannot close the comment it is written in
pub fn comment_text(comment: &str) -> Cow<'_, str> {
    if comment.contains("*/") {
        Cow::Owned(comment.replace("*/", "(*)/"))
    } else {
        Cow::Borrowed(comment)
    }
}

/// Keys whose values Xcode writes without a reference comment
const UNANNOTATED_KEYS: &[&str] = &["remoteGlobalIDString"];

/// Writes values in the Xcode layout, annotating object references
pub struct Writer<'a> {
    out: String,
    comments: &'a dyn Fn(&str) -> Option<String>,
    annotate: bool,
}

impl<'a> Writer<'a> {
    /// Create a writer; `comments` returns the comment for strings that are
    /// object ids
    pub fn new(comments: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            out: String::new(),
            comments,
            annotate: true,
        }
    }

    /// Finish and return the text
    pub fn finish(self) -> String {
        self.out
    }

    /// Append raw text
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Append `depth` tabs
    pub fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push('\t');
        }
    }

    /// Write a dictionary key
    pub fn key(&mut self, key: &str) {
        self.out.push_str(&quote(key));
    }

    /// Write a string, followed by `/* comment */` when it names an object
    pub fn string(&mut self, s: &str) {
        self.out.push_str(&quote(s));
        if !self.annotate {
            return;
        }
        if let Some(comment) = (self.comments)(s) {
            self.out.push_str(" /* ");
            self.out.push_str(&comment_text(&comment));
            self.out.push_str(" */");
        }
    }

    /// Write a value spread over several lines at `depth`
    pub fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::String(s) => self.string(s),
            Value::Array(items) => {
                self.out.push_str("(\n");
                for item in items {
                    self.indent(depth + 1);
                    self.value(item, depth + 1);
                    self.out.push_str(",\n");
                }
                self.indent(depth);
                self.out.push(')');
            }
            Value::Dict(dict) => {
                self.out.push_str("{\n");
                for (key, item) in dict {
                    self.indent(depth + 1);
                    self.entry(key, item, depth + 1);
                    self.out.push('\n');
                }
                self.indent(depth);
                self.out.push('}');
            }
        }
    }

    /// Write `key = value;` spread over several lines
    pub fn entry(&mut self, key: &str, value: &Value, depth: usize) {
        self.key(key);
        self.out.push_str(" = ");
        let annotate = self.annotate;
        self.annotate = annotate && !UNANNOTATED_KEYS.contains(&key);
        self.value(value, depth);
        self.annotate = annotate;
        self.out.push(';');
    }

    /// Write a value on a single line
    pub fn inline_value(&mut self, value: &Value) {
        match value {
            Value::String(s) => self.string(s),
            Value::Array(items) => {
                self.out.push('(');
                for item in items {
                    self.inline_value(item);
                    self.out.push_str(", ");
                }
                self.out.push(')');
            }
            Value::Dict(dict) => {
                self.out.push('{');
                for (key, item) in dict {
                    self.inline_entry(key, item);
                    self.out.push(' ');
                }
                self.out.push('}');
            }
        }
    }

    /// Write `key = value;` on a single line
    pub fn inline_entry(&mut self, key: &str, value: &Value) {
        self.key(key);
        self.out.push_str(" = ");
        let annotate = self.annotate;
        self.annotate = annotate && !UNANNOTATED_KEYS.contains(&key);
        self.inline_value(value);
        self.annotate = annotate;
        self.out.push(';');
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Tokens, the token table, and placeholder encoding.
//!
//! Parse rules replace every construct they recognize with a placeholder and
//! append a [`Token`] to the [`TokenTable`]. A placeholder is the token id
//! wrapped in two private-use code points:
//!
//! ```text
//! U+E000 <decimal id> U+E001
//! ```
//!
//! Neither delimiter nor the decimal digits are markup characters, so later
//! rules never re-match text that has already been tokenized.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParseError;

/// Opening delimiter of a placeholder.
pub const PLACEHOLDER_OPEN: char = '\u{E000}';
/// Closing delimiter of a placeholder.
pub const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Type tag of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenType {
    /// `[[code]]` block with verbatim content.
    Code,
    /// `@@literal@@` inline text.
    Raw,
    /// `[[div]]` block.
    Div,
    /// `+ Heading` line.
    Heading,
    /// Horizontal rule.
    Horiz,
    /// Paragraph wrapper.
    Paragraph,
    /// External URL.
    Url,
    /// `**strong**`
    Strong,
    /// `//emphasis//`
    Emphasis,
    /// `{{teletype}}`
    Teletype,
    /// `[[[page]]]` link.
    Wikilink,
    /// `((page))` link.
    Freelink,
}

impl TokenType {
    /// All token types, in rule priority order.
    pub const ALL: [Self; 12] = [
        Self::Code,
        Self::Raw,
        Self::Div,
        Self::Heading,
        Self::Horiz,
        Self::Paragraph,
        Self::Url,
        Self::Strong,
        Self::Emphasis,
        Self::Teletype,
        Self::Wikilink,
        Self::Freelink,
    ];

    /// Lowercase name used in messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Raw => "raw",
            Self::Div => "div",
            Self::Heading => "heading",
            Self::Horiz => "horiz",
            Self::Paragraph => "paragraph",
            Self::Url => "url",
            Self::Strong => "strong",
            Self::Emphasis => "emphasis",
            Self::Teletype => "teletype",
            Self::Wikilink => "wikilink",
            Self::Freelink => "freelink",
        }
    }

    /// Whether the construct occupies whole lines.
    ///
    /// Lines that begin with a block-level placeholder are never wrapped in
    /// paragraphs.
    #[must_use]
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Code | Self::Div | Self::Heading | Self::Horiz | Self::Paragraph
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field value. An absent value is a missing key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Opening or closing half of a paired construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// A typed record produced by a parse rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    kind: TokenType,
    fields: BTreeMap<&'static str, Value>,
}

impl Token {
    /// Create a token with no fields.
    #[must_use]
    pub fn new(kind: TokenType) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// Create the start or end half of a paired construct.
    #[must_use]
    pub fn edge(kind: TokenType, edge: Edge) -> Self {
        Self::new(kind).with("edge", edge.as_str())
    }

    /// Set a field.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.insert(key, value.into());
        self
    }

    /// Set a string field only when `value` is `Some`.
    #[must_use]
    pub fn with_opt(self, key: &'static str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Token type.
    #[must_use]
    pub fn kind(&self) -> TokenType {
        self.kind
    }

    /// Raw field access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field, `None` when absent or not a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Boolean field, `false` when absent.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(Value::Bool(true)))
    }

    /// Edge of a paired construct, `None` for single tokens.
    #[must_use]
    pub fn edge_kind(&self) -> Option<Edge> {
        match self.str("edge") {
            Some("start") => Some(Edge::Start),
            Some("end") => Some(Edge::End),
            _ => None,
        }
    }
}

/// Ordered table of tokens produced by one parse pass.
///
/// A token's id is its index; ids are never reused.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenTable {
    tokens: Vec<Token>,
}

impl TokenTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token and return the placeholder that stands for it.
    pub fn push(&mut self, token: Token) -> Placeholder {
        let id = self.tokens.len();
        self.tokens.push(token);
        Placeholder(id)
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Token> {
        self.tokens.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over `(id, token)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Token)> + '_ {
        self.tokens.iter().enumerate()
    }
}

/// Placeholder for a token id, rendered with [`PLACEHOLDER_OPEN`] / [`PLACEHOLDER_CLOSE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}", self.0)
    }
}

/// Piece of placeholder text: literal text or a token reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Token(usize),
}

/// Split placeholder text into literal segments and token references.
///
/// # Errors
///
/// Returns [`ParseError::MalformedPlaceholder`] if an opening delimiter is not
/// followed by digits and a closing delimiter.
pub fn segments(text: &str) -> Result<Vec<Segment<'_>>, ParseError> {
    let mut out = Vec::new();
    let mut rest = text;
    let mut offset = 0;

    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        if start > 0 {
            out.push(Segment::Text(&rest[..start]));
        }
        let after = &rest[start + PLACEHOLDER_OPEN.len_utf8()..];
        let close = after
            .find(PLACEHOLDER_CLOSE)
            .ok_or(ParseError::MalformedPlaceholder {
                offset: offset + start,
            })?;
        let id = after[..close]
            .parse::<usize>()
            .map_err(|_| ParseError::MalformedPlaceholder {
                offset: offset + start,
            })?;
        out.push(Segment::Token(id));

        let consumed = start + PLACEHOLDER_OPEN.len_utf8() + close + PLACEHOLDER_CLOSE.len_utf8();
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    Ok(out)
}

/// Number of characters outside placeholders.
///
/// Used as the progress measure for looping rules.
#[must_use]
pub fn literal_len(text: &str) -> usize {
    let mut inside = false;
    let mut count = 0;
    for c in text.chars() {
        match c {
            PLACEHOLDER_OPEN => inside = true,
            PLACEHOLDER_CLOSE => inside = false,
            _ if !inside => count += 1,
            _ => {}
        }
    }
    count
}

/// Whether `text` contains any placeholder delimiter.
#[must_use]
pub fn has_placeholder(text: &str) -> bool {
    text.contains([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE])
}

/// Prepare raw input for parsing.
///
/// Normalizes line endings and replaces stray placeholder delimiters with
/// U+FFFD so that only the engine can create placeholders.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    neutralize_delimiters(&raw.replace("\r\n", "\n"))
}

/// Replace placeholder delimiters in text from outside the engine with U+FFFD.
///
/// Renderer fragments are scanned for placeholders, so any text a renderer
/// embeds that did not come from the token table must pass through here.
#[must_use]
pub fn neutralize_delimiters(text: &str) -> String {
    text.replace([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE], "\u{FFFD}")
}

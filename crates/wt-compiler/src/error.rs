//! Error types for parsing, registry setup, and page resolution.

use crate::render::OutputFormat;
use crate::token::TokenType;

/// Boxed error returned by external lookup capabilities.
pub type LookupError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised while tokenizing or when the token stream is structurally broken.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A recognized construct is missing a field it cannot be emitted without.
    #[error("{rule}: recognized construct is missing required field `{field}`")]
    MissingField {
        /// Rule that recognized the construct.
        rule: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A nesting rule was still matching after the configured number of passes.
    #[error("{rule}: nesting exceeds {limit} passes")]
    NestingTooDeep {
        /// Rule that kept matching.
        rule: &'static str,
        /// Pass limit that was reached.
        limit: usize,
    },
    /// A looping rule matched without consuming any literal text.
    #[error("{rule}: pass {pass} made no progress")]
    NoProgress {
        /// Rule that stalled.
        rule: &'static str,
        /// Zero-based pass index.
        pass: usize,
    },
    /// A placeholder delimiter was not followed by a valid id and terminator.
    #[error("malformed placeholder at byte {offset}")]
    MalformedPlaceholder {
        /// Byte offset of the opening delimiter.
        offset: usize,
    },
    /// A placeholder refers to a token id not present in the table.
    #[error("placeholder {0} has no matching token")]
    UnknownPlaceholder(usize),
    /// A placeholder appeared more than once in the output stream.
    #[error("token {0} consumed more than once")]
    DuplicatePlaceholder(usize),
    /// A token was never reached while splicing the output.
    #[error("token {0} was never rendered")]
    OrphanToken(usize),
}

/// Error in renderer registration or renderer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No renderer registered for a token type under the active format.
    #[error("no renderer registered for {kind} tokens in format `{format}`")]
    MissingRenderer {
        /// Active output format.
        format: OutputFormat,
        /// Token type without a renderer.
        kind: TokenType,
    },
    /// A second renderer was registered for an existing key.
    #[error("renderer for {kind} tokens in format `{format}` registered twice")]
    DuplicateRenderer {
        /// Output format of the key.
        format: OutputFormat,
        /// Token type of the key.
        kind: TokenType,
    },
    /// The format has no text writer for literal text.
    #[error("output format `{0}` is not registered")]
    UnknownFormat(OutputFormat),
    /// A URL template cannot be expanded.
    #[error("invalid URL template for {field}: {message}")]
    InvalidTemplate {
        /// Config field holding the template (e.g., `view_url`).
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Which capability failed during resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    /// Page existence check.
    Existence,
    /// Page title lookup.
    Title,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Existence => f.write_str("existence"),
            Self::Title => f.write_str("title"),
        }
    }
}

/// Error returned when an existence or title lookup fails.
#[derive(Debug, thiserror::Error)]
#[error("{kind} lookup failed for page `{page}`: {source}")]
pub struct ResolutionError {
    /// Page whose lookup failed.
    pub page: String,
    /// Capability that failed.
    pub kind: LookupKind,
    #[source]
    source: LookupError,
}

impl ResolutionError {
    /// Existence lookup failure for `page`.
    pub fn existence(page: impl Into<String>, source: impl Into<LookupError>) -> Self {
        Self {
            page: page.into(),
            kind: LookupKind::Existence,
            source: source.into(),
        }
    }

    /// Title lookup failure for `page`.
    pub fn title(page: impl Into<String>, source: impl Into<LookupError>) -> Self {
        Self {
            page: page.into(),
            kind: LookupKind::Title,
            source: source.into(),
        }
    }
}

/// Error returned by a render or compile call.
///
/// A render that fails produces no output at all.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

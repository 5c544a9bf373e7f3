//! Renderer registration and dispatch.
//!
//! Renderers are registered per `(output format, token type)` key in a
//! [`RendererRegistry`]. The dispatcher looks every token up in the registry,
//! lets each renderer see its tokens up front, then splices rendered fragments
//! into the placeholder positions.
//!
//! A format is more than its token renderers: literal text between
//! placeholders is escaped by the format's [`FormatWriter`].

mod context;
mod dispatcher;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, RenderError};
use crate::token::{Token, TokenType};

pub use context::RenderContext;
pub use dispatcher::{Rendered, render};

/// Name of an output format.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutputFormat(Cow<'static, str>);

impl OutputFormat {
    /// HTML output.
    pub const HTML: Self = Self(Cow::Borrowed("html"));

    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders tokens of one or more types into output fragments.
///
/// Renderers own their configuration and are shared across concurrent
/// renders, so all per-document state goes through the [`RenderContext`].
pub trait TokenRenderer: Send + Sync {
    /// Called once per document, before any token is rendered, with every
    /// token this renderer will receive.
    ///
    /// Renderers that need external lookups use this to batch them.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] to abort the render.
    fn prepare(&self, tokens: &[&Token], ctx: &mut RenderContext) -> Result<(), RenderError> {
        let _ = (tokens, ctx);
        Ok(())
    }

    /// Render a single token.
    ///
    /// The fragment may carry placeholders taken from the token's fields;
    /// the dispatcher expands them.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] to abort the render.
    fn render(&self, token: &Token, ctx: &mut RenderContext) -> Result<String, RenderError>;
}

/// Writes literal text for an output format.
pub trait FormatWriter: Send + Sync {
    /// Escape literal text found between placeholders.
    fn escape_text(&self, text: &str) -> String;
}

/// Table of renderers keyed by output format and token type.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wt_compiler::{OutputFormat, RendererRegistry, TokenType};
/// use wt_compiler::html::{HorizRenderer, HtmlFormat};
///
/// let mut registry = RendererRegistry::new();
/// registry.register_format(OutputFormat::HTML, Arc::new(HtmlFormat));
/// registry
///     .register(OutputFormat::HTML, TokenType::Horiz, Arc::new(HorizRenderer))
///     .unwrap();
///
/// let again = registry.register(OutputFormat::HTML, TokenType::Horiz, Arc::new(HorizRenderer));
/// assert!(again.is_err());
/// ```
#[derive(Default)]
pub struct RendererRegistry {
    formats: HashMap<OutputFormat, Arc<dyn FormatWriter>>,
    renderers: Vec<Arc<dyn TokenRenderer>>,
    entries: HashMap<(OutputFormat, TokenType), usize>,
}

impl RendererRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the literal-text writer of a format, replacing any previous one.
    pub fn register_format(
        &mut self,
        format: OutputFormat,
        writer: Arc<dyn FormatWriter>,
    ) -> &mut Self {
        self.formats.insert(format, writer);
        self
    }

    /// Register a renderer for one key.
    ///
    /// Registering the same `Arc` for several token types shares one
    /// instance, which then gets a single [`TokenRenderer::prepare`] call per
    /// document covering all of those types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRenderer`] if the key is taken.
    pub fn register(
        &mut self,
        format: OutputFormat,
        kind: TokenType,
        renderer: Arc<dyn TokenRenderer>,
    ) -> Result<&mut Self, ConfigError> {
        let key = (format, kind);
        if self.entries.contains_key(&key) {
            let (format, kind) = key;
            return Err(ConfigError::DuplicateRenderer { format, kind });
        }
        let index = self.intern(renderer);
        self.entries.insert(key, index);
        Ok(self)
    }

    /// Register without the duplicate check, replacing any existing entry.
    pub(crate) fn insert(
        &mut self,
        format: OutputFormat,
        kind: TokenType,
        renderer: Arc<dyn TokenRenderer>,
    ) {
        let index = self.intern(renderer);
        self.entries.insert((format, kind), index);
    }

    fn intern(&mut self, renderer: Arc<dyn TokenRenderer>) -> usize {
        let ptr = Arc::as_ptr(&renderer).cast::<()>();
        if let Some(index) = self
            .renderers
            .iter()
            .position(|r| Arc::as_ptr(r).cast::<()>() == ptr)
        {
            return index;
        }
        self.renderers.push(renderer);
        self.renderers.len() - 1
    }

    /// Renderer registered for a key.
    #[must_use]
    pub fn renderer(&self, format: &OutputFormat, kind: TokenType) -> Option<&Arc<dyn TokenRenderer>> {
        self.index_of(format, kind).map(|i| &self.renderers[i])
    }

    /// Whether a format has a literal-text writer.
    #[must_use]
    pub fn has_format(&self, format: &OutputFormat) -> bool {
        self.formats.contains_key(format)
    }

    /// Verify that `format` can render every token type in `kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFormat`] or
    /// [`ConfigError::MissingRenderer`] for the first gap found.
    pub fn check_coverage(
        &self,
        format: &OutputFormat,
        kinds: impl IntoIterator<Item = TokenType>,
    ) -> Result<(), ConfigError> {
        if !self.has_format(format) {
            return Err(ConfigError::UnknownFormat(format.clone()));
        }
        for kind in kinds {
            if self.index_of(format, kind).is_none() {
                return Err(ConfigError::MissingRenderer {
                    format: format.clone(),
                    kind,
                });
            }
        }
        Ok(())
    }

    fn index_of(&self, format: &OutputFormat, kind: TokenType) -> Option<usize> {
        // HashMap lookups need an owned key; formats are cheap to clone.
        self.entries.get(&(format.clone(), kind)).copied()
    }

    fn writer(&self, format: &OutputFormat) -> Option<&dyn FormatWriter> {
        self.formats.get(format).map(AsRef::as_ref)
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .entries
            .keys()
            .map(|(format, kind)| format!("{format}/{kind}"))
            .collect();
        keys.sort();
        f.debug_struct("RendererRegistry")
            .field("entries", &keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl TokenRenderer for Fixed {
        fn render(&self, _token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
            Ok(self.0.to_owned())
        }
    }

    struct Plain;

    impl FormatWriter for Plain {
        fn escape_text(&self, text: &str) -> String {
            text.to_owned()
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = RendererRegistry::new();
        registry
            .register(OutputFormat::HTML, TokenType::Raw, Arc::new(Fixed("a")))
            .unwrap();
        let err = registry
            .register(OutputFormat::HTML, TokenType::Raw, Arc::new(Fixed("b")))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateRenderer {
                kind: TokenType::Raw,
                ..
            }
        ));
    }

    #[test]
    fn test_same_type_in_other_format_is_separate_key() {
        let mut registry = RendererRegistry::new();
        let text = OutputFormat::new("text");
        registry
            .register(OutputFormat::HTML, TokenType::Raw, Arc::new(Fixed("a")))
            .unwrap()
            .register(text.clone(), TokenType::Raw, Arc::new(Fixed("b")))
            .unwrap();
        assert!(registry.renderer(&text, TokenType::Raw).is_some());
    }

    #[test]
    fn test_shared_renderer_is_interned_once() {
        let mut registry = RendererRegistry::new();
        let shared: Arc<dyn TokenRenderer> = Arc::new(Fixed("x"));
        registry
            .register(OutputFormat::HTML, TokenType::Wikilink, Arc::clone(&shared))
            .unwrap()
            .register(OutputFormat::HTML, TokenType::Freelink, shared)
            .unwrap();
        assert_eq!(registry.renderers.len(), 1);
    }

    #[test]
    fn test_coverage_requires_format_writer() {
        let registry = RendererRegistry::new();
        let err = registry
            .check_coverage(&OutputFormat::HTML, [])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(_)));
    }

    #[test]
    fn test_coverage_reports_missing_type() {
        let mut registry = RendererRegistry::new();
        registry.register_format(OutputFormat::HTML, Arc::new(Plain));
        registry
            .register(OutputFormat::HTML, TokenType::Raw, Arc::new(Fixed("a")))
            .unwrap();
        let err = registry
            .check_coverage(&OutputFormat::HTML, [TokenType::Raw, TokenType::Url])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRenderer {
                kind: TokenType::Url,
                ..
            }
        ));
    }

    #[test]
    fn test_format_display() {
        assert_eq!(OutputFormat::HTML.to_string(), "html");
        assert_eq!(OutputFormat::new("xml".to_owned()).as_str(), "xml");
    }
}

//! Render pass over a parsed document.

use std::collections::BTreeSet;

use super::{FormatWriter, OutputFormat, RenderContext, RendererRegistry, TokenRenderer};
use crate::error::{ConfigError, ParseError, RenderError};
use crate::rules::ParsedDocument;
use crate::token::{Segment, Token, TokenTable, segments};

/// Output of a successful render.
#[derive(Clone, Debug)]
pub struct Rendered {
    /// Assembled output markup.
    pub output: String,
    /// Document-level results gathered while rendering.
    pub context: RenderContext,
}

/// Render `doc` into `format`.
///
/// The document is consumed: every token is rendered exactly once and none
/// outlives the call. Nothing is returned unless the whole pass succeeds.
///
/// # Errors
///
/// - [`ConfigError`] if the format or a renderer for any token type present
///   is not registered. Checked before any renderer runs.
/// - [`ParseError`] if a placeholder is malformed, unknown, repeated, or a
///   token is never reached.
/// - Whatever a renderer returns, such as a [`ResolutionError`](crate::ResolutionError).
pub fn render(
    registry: &RendererRegistry,
    doc: ParsedDocument,
    format: &OutputFormat,
) -> Result<Rendered, RenderError> {
    let ParsedDocument { text, tokens } = doc;

    let present: BTreeSet<_> = tokens.iter().map(|(_, t)| t.kind()).collect();
    registry.check_coverage(format, present)?;
    let writer = registry
        .writer(format)
        .ok_or_else(|| ConfigError::UnknownFormat(format.clone()))?;

    let mut assigned = Vec::with_capacity(tokens.len());
    let mut groups: Vec<Vec<&Token>> = vec![Vec::new(); registry.renderers.len()];
    for (_, token) in tokens.iter() {
        let index = registry
            .index_of(format, token.kind())
            .ok_or_else(|| ConfigError::MissingRenderer {
                format: format.clone(),
                kind: token.kind(),
            })?;
        assigned.push(index);
        groups[index].push(token);
    }

    let mut ctx = RenderContext::new();
    for (index, group) in groups.iter().enumerate() {
        if !group.is_empty() {
            registry.renderers[index].prepare(group, &mut ctx)?;
        }
    }

    let mut splicer = Splicer {
        tokens: &tokens,
        renderers: assigned
            .iter()
            .map(|&i| registry.renderers[i].as_ref())
            .collect(),
        writer,
        consumed: vec![false; tokens.len()],
        ctx,
    };
    let mut output = String::with_capacity(text.len());
    splicer.splice(&text, true, &mut output)?;

    if let Some(orphan) = splicer.consumed.iter().position(|done| !done) {
        return Err(ParseError::OrphanToken(orphan).into());
    }

    tracing::debug!(
        format = %format,
        tokens = tokens.len(),
        links = splicer.ctx.internal_links().len(),
        "Rendered document"
    );
    Ok(Rendered {
        output,
        context: splicer.ctx,
    })
}

struct Splicer<'a> {
    tokens: &'a TokenTable,
    renderers: Vec<&'a dyn TokenRenderer>,
    writer: &'a dyn FormatWriter,
    consumed: Vec<bool>,
    ctx: RenderContext,
}

impl Splicer<'_> {
    /// Append `text` to `out`, expanding placeholders.
    ///
    /// Only document text is escaped; renderer fragments are output markup
    /// already.
    fn splice(&mut self, text: &str, escape: bool, out: &mut String) -> Result<(), RenderError> {
        for segment in segments(text)? {
            match segment {
                Segment::Text(literal) if escape => out.push_str(&self.writer.escape_text(literal)),
                Segment::Text(literal) => out.push_str(literal),
                Segment::Token(id) => {
                    let fragment = self.render_token(id)?;
                    self.splice(&fragment, false, out)?;
                }
            }
        }
        Ok(())
    }

    fn render_token(&mut self, id: usize) -> Result<String, RenderError> {
        let token = self.tokens.get(id).ok_or(ParseError::UnknownPlaceholder(id))?;
        if std::mem::replace(&mut self.consumed[id], true) {
            return Err(ParseError::DuplicatePlaceholder(id).into());
        }
        self.renderers[id].render(token, &mut self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::token::{Placeholder, TokenType};
    use pretty_assertions::assert_eq;

    struct Upper;

    impl FormatWriter for Upper {
        fn escape_text(&self, text: &str) -> String {
            text.to_uppercase()
        }
    }

    /// Renders `[kind]`, or the `text` field verbatim when present.
    struct Echo {
        prepared: AtomicUsize,
    }

    impl Echo {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                prepared: AtomicUsize::new(0),
            })
        }
    }

    impl TokenRenderer for Echo {
        fn prepare(&self, tokens: &[&Token], _ctx: &mut RenderContext) -> Result<(), RenderError> {
            self.prepared.fetch_add(tokens.len(), Ordering::SeqCst);
            Ok(())
        }

        fn render(&self, token: &Token, ctx: &mut RenderContext) -> Result<String, RenderError> {
            if let Some(page) = token.str("page") {
                ctx.add_internal_link(page);
            }
            Ok(token
                .str("text")
                .map_or_else(|| format!("[{}]", token.kind()), str::to_owned))
        }
    }

    fn registry(echo: &Arc<Echo>) -> RendererRegistry {
        let mut registry = RendererRegistry::new();
        registry.register_format(OutputFormat::HTML, Arc::new(Upper));
        for kind in [TokenType::Raw, TokenType::Wikilink, TokenType::Strong] {
            registry
                .register(OutputFormat::HTML, kind, Arc::clone(echo) as Arc<dyn TokenRenderer>)
                .unwrap();
        }
        registry
    }

    fn doc(text: String, tokens: Vec<Token>) -> ParsedDocument {
        let mut table = TokenTable::new();
        for token in tokens {
            table.push(token);
        }
        ParsedDocument {
            text,
            tokens: table,
        }
    }

    #[test]
    fn test_splices_in_document_order() {
        let echo = Echo::new();
        let parsed = doc(
            format!("a {} b {}", Placeholder(0), Placeholder(1)),
            vec![
                Token::new(TokenType::Raw).with("text", "x"),
                Token::new(TokenType::Wikilink).with("page", "p"),
            ],
        );
        let rendered = render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap();
        assert_eq!(rendered.output, "A x B [wikilink]");
        assert!(rendered.context.internal_links().contains("p"));
    }

    #[test]
    fn test_prepare_called_once_with_all_tokens() {
        let echo = Echo::new();
        let parsed = doc(
            format!("{}{}{}", Placeholder(0), Placeholder(1), Placeholder(2)),
            vec![
                Token::new(TokenType::Wikilink).with("page", "a"),
                Token::new(TokenType::Raw),
                Token::new(TokenType::Wikilink).with("page", "b"),
            ],
        );
        render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap();
        assert_eq!(echo.prepared.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_nested_placeholders_expand_without_escaping() {
        let echo = Echo::new();
        let inner = format!("see {}", Placeholder(1));
        let parsed = doc(
            format!("x{}", Placeholder(0)),
            vec![
                Token::new(TokenType::Wikilink)
                    .with("page", "p")
                    .with("text", inner),
                Token::new(TokenType::Strong),
            ],
        );
        let rendered = render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap();
        assert_eq!(rendered.output, "Xsee [strong]");
    }

    #[test]
    fn test_missing_renderer_fails_before_rendering() {
        let echo = Echo::new();
        let parsed = doc(
            format!("{}{}", Placeholder(0), Placeholder(1)),
            vec![
                Token::new(TokenType::Wikilink).with("page", "a"),
                Token::new(TokenType::Url),
            ],
        );
        let err = render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Config(ConfigError::MissingRenderer {
                kind: TokenType::Url,
                ..
            })
        ));
        assert_eq!(echo.prepared.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_format() {
        let echo = Echo::new();
        let parsed = doc("plain".to_owned(), vec![]);
        let err = render(&registry(&echo), parsed, &OutputFormat::new("pdf")).unwrap_err();
        assert!(matches!(err, RenderError::Config(ConfigError::UnknownFormat(_))));
    }

    #[test]
    fn test_unknown_placeholder() {
        let echo = Echo::new();
        let parsed = doc(Placeholder(5).to_string(), vec![]);
        let err = render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Parse(ParseError::UnknownPlaceholder(5))
        ));
    }

    #[test]
    fn test_duplicate_placeholder() {
        let echo = Echo::new();
        let parsed = doc(
            format!("{}{}", Placeholder(0), Placeholder(0)),
            vec![Token::new(TokenType::Raw)],
        );
        let err = render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Parse(ParseError::DuplicatePlaceholder(0))
        ));
    }

    #[test]
    fn test_orphan_token() {
        let echo = Echo::new();
        let parsed = doc(
            Placeholder(0).to_string(),
            vec![Token::new(TokenType::Raw), Token::new(TokenType::Raw)],
        );
        let err = render(&registry(&echo), parsed, &OutputFormat::HTML).unwrap_err();
        assert!(matches!(err, RenderError::Parse(ParseError::OrphanToken(1))));
    }

    #[test]
    fn test_renderer_error_aborts() {
        struct Failing;

        impl TokenRenderer for Failing {
            fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
                let page = token.str("page").unwrap_or_default();
                Err(crate::ResolutionError::existence(page, "offline").into())
            }
        }

        let mut registry = RendererRegistry::new();
        registry.register_format(OutputFormat::HTML, Arc::new(Upper));
        registry
            .register(OutputFormat::HTML, TokenType::Wikilink, Arc::new(Failing))
            .unwrap();
        let parsed = doc(
            format!("text {}", Placeholder(0)),
            vec![Token::new(TokenType::Wikilink).with("page", "x")],
        );
        let err = render(&registry, parsed, &OutputFormat::HTML).unwrap_err();
        assert!(matches!(err, RenderError::Resolution(e) if e.page == "x"));
    }
}

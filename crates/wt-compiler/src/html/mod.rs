//! HTML output format.
//!
//! One renderer per token type. All text taken from the document is escaped
//! with [`escape_html`] before it is embedded.

mod wikilink;

use std::fmt::Write;
use std::sync::Arc;

use crate::error::{ParseError, RenderError};
use crate::render::{FormatWriter, OutputFormat, RenderContext, RendererRegistry, TokenRenderer};
use crate::token::{Edge, Token, TokenType};

pub use wikilink::{LinkCapabilities, WikilinkRenderer};

/// Escape special HTML characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Literal text writer for HTML.
pub struct HtmlFormat;

impl FormatWriter for HtmlFormat {
    fn escape_text(&self, text: &str) -> String {
        escape_html(text)
    }
}

fn edge(token: &Token) -> Result<Edge, ParseError> {
    token.edge_kind().ok_or(ParseError::MissingField {
        rule: token.kind().name(),
        field: "edge",
    })
}

/// `<pre><code>` block.
pub struct CodeRenderer;

impl TokenRenderer for CodeRenderer {
    fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        let content = escape_html(token.str("text").unwrap_or_default());
        let mut out = String::new();
        if let Some(lang) = token.str("type") {
            write!(
                out,
                r#"<pre><code class="language-{}">{content}</code></pre>"#,
                escape_html(lang)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{content}</code></pre>").unwrap();
        }
        Ok(out)
    }
}

/// Literal text.
pub struct RawRenderer;

impl TokenRenderer for RawRenderer {
    fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        Ok(escape_html(token.str("text").unwrap_or_default()))
    }
}

pub struct DivRenderer;

impl TokenRenderer for DivRenderer {
    fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        Ok(match (edge(token)?, token.str("class")) {
            (Edge::Start, Some(class)) => format!(r#"<div class="{}">"#, escape_html(class)),
            (Edge::Start, None) => "<div>".to_owned(),
            (Edge::End, _) => "</div>".to_owned(),
        })
    }
}

/// `<h1>` through `<h6>`.
pub struct HeadingRenderer;

impl TokenRenderer for HeadingRenderer {
    fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        let level = token
            .str("level")
            .and_then(|l| l.parse::<u8>().ok())
            .filter(|l| (1..=6).contains(l))
            .ok_or(ParseError::MissingField {
                rule: "heading",
                field: "level",
            })?;
        Ok(match edge(token)? {
            Edge::Start => format!("<h{level}>"),
            Edge::End => format!("</h{level}>"),
        })
    }
}

pub struct HorizRenderer;

impl TokenRenderer for HorizRenderer {
    fn render(&self, _token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        Ok("<hr />".to_owned())
    }
}

/// External link.
pub struct UrlRenderer;

impl TokenRenderer for UrlRenderer {
    fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        let href = token.str("href").ok_or(ParseError::MissingField {
            rule: "url",
            field: "href",
        })?;
        let label = token.str("text").unwrap_or(href);
        Ok(format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(href),
            escape_html(label.trim())
        ))
    }
}

/// Paired construct rendered as a plain element.
pub struct TagRenderer {
    tag: &'static str,
}

impl TagRenderer {
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self { tag }
    }
}

impl TokenRenderer for TagRenderer {
    fn render(&self, token: &Token, _ctx: &mut RenderContext) -> Result<String, RenderError> {
        Ok(match edge(token)? {
            Edge::Start => format!("<{}>", self.tag),
            Edge::End => format!("</{}>", self.tag),
        })
    }
}

impl RendererRegistry {
    /// Registry with every standard token type registered for
    /// [`OutputFormat::HTML`].
    ///
    /// `link_renderer` handles both wiki-links and free-links.
    #[must_use]
    pub fn html(link_renderer: Arc<dyn TokenRenderer>) -> Self {
        let html = OutputFormat::HTML;
        let mut registry = Self::new();
        registry.register_format(html.clone(), Arc::new(HtmlFormat));

        let renderers: [(TokenType, Arc<dyn TokenRenderer>); 10] = [
            (TokenType::Code, Arc::new(CodeRenderer)),
            (TokenType::Raw, Arc::new(RawRenderer)),
            (TokenType::Div, Arc::new(DivRenderer)),
            (TokenType::Heading, Arc::new(HeadingRenderer)),
            (TokenType::Horiz, Arc::new(HorizRenderer)),
            (TokenType::Paragraph, Arc::new(TagRenderer::new("p"))),
            (TokenType::Url, Arc::new(UrlRenderer)),
            (TokenType::Strong, Arc::new(TagRenderer::new("strong"))),
            (TokenType::Emphasis, Arc::new(TagRenderer::new("em"))),
            (TokenType::Teletype, Arc::new(TagRenderer::new("code"))),
        ];
        for (kind, renderer) in renderers {
            registry.insert(html.clone(), kind, renderer);
        }
        registry.insert(html.clone(), TokenType::Wikilink, Arc::clone(&link_renderer));
        registry.insert(html, TokenType::Freelink, link_renderer);
        registry
    }
}

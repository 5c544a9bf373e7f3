//! Parse-and-render facade.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{ConfigError, ParseError, RenderError};
use crate::html::{LinkCapabilities, WikilinkRenderer};
use crate::link::LinkConfig;
use crate::render::{OutputFormat, Rendered, RendererRegistry, render};
use crate::rules::{ParsedDocument, RuleSet, parse};

/// A rule set bound to a renderer registry and an output format.
///
/// Construction checks that every token type the rules can produce has a
/// renderer, so a compiler that exists never fails with a missing renderer.
///
/// # Example
///
/// ```
/// use wt_compiler::{Compiler, LinkCapabilities, LinkConfig, ListResolver, RuleSet};
/// use std::sync::Arc;
///
/// let links = LinkConfig::default().with_new_url("/%s/edit");
/// let capabilities = LinkCapabilities::new()
///     .with_resolver(Arc::new(ListResolver::new(["start"])));
/// let compiler = Compiler::html(RuleSet::standard(), &links, capabilities).unwrap();
///
/// let rendered = compiler.compile("See [[[start]]] and [[[todo]]].").unwrap();
/// assert_eq!(
///     rendered.output,
///     r#"<p>See <a href="/start">start</a> and todo<a href="/todo/edit">?</a>.</p>"#
/// );
/// assert_eq!(rendered.context.internal_links().len(), 2);
/// ```
pub struct Compiler {
    rules: RuleSet,
    registry: RendererRegistry,
    format: OutputFormat,
}

impl Compiler {
    /// Bind `rules` to `registry` under `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the format or a renderer for any token type
    /// the rules produce is not registered.
    pub fn new(
        rules: RuleSet,
        registry: RendererRegistry,
        format: OutputFormat,
    ) -> Result<Self, ConfigError> {
        registry.check_coverage(&format, rules.produced_types())?;
        tracing::debug!(
            format = %format,
            rules = rules.names().count(),
            "Created compiler"
        );
        Ok(Self {
            rules,
            registry,
            format,
        })
    }

    /// HTML compiler with the standard renderers and a wiki-link renderer
    /// built from `links`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `links` is invalid or `rules` produce a
    /// token type without an HTML renderer.
    pub fn html(
        rules: RuleSet,
        links: &LinkConfig,
        capabilities: LinkCapabilities,
    ) -> Result<Self, ConfigError> {
        let link_renderer = WikilinkRenderer::new(links, capabilities)?;
        let registry = RendererRegistry::html(Arc::new(link_renderer));
        Self::new(rules, registry, OutputFormat::HTML)
    }

    #[must_use]
    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    /// Run the parse phase only.
    ///
    /// # Errors
    ///
    /// See [`parse`].
    pub fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        parse(text, &self.rules)
    }

    /// Run the render phase on an already parsed document.
    ///
    /// # Errors
    ///
    /// See [`render`].
    pub fn render(&self, doc: ParsedDocument) -> Result<Rendered, RenderError> {
        render(&self.registry, doc, &self.format)
    }

    /// Parse and render one document.
    ///
    /// # Errors
    ///
    /// Returns the first parse, configuration, or resolution error. No
    /// partial output is produced.
    pub fn compile(&self, text: &str) -> Result<Rendered, RenderError> {
        let doc = self.parse(text)?;
        self.render(doc)
    }

    /// Compile independent documents in parallel.
    ///
    /// Results are returned in input order. Each document gets its own
    /// [`RenderContext`](crate::RenderContext); merge them to aggregate links.
    pub fn compile_many<S>(&self, texts: &[S]) -> Vec<Result<Rendered, RenderError>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.compile(text.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Compiler: Send, Sync);

    use std::sync::Arc;

    use super::*;
    use crate::mock::MockResolver;
    use crate::render::TokenRenderer;
    use crate::resolver::{ExistenceResolver, TitleLookup};
    use crate::token::TokenType;
    use crate::html::HorizRenderer;
    use pretty_assertions::assert_eq;

    fn compiler(mock: &Arc<MockResolver>, links: &LinkConfig) -> Compiler {
        let capabilities = LinkCapabilities::new()
            .with_resolver(Arc::clone(mock) as Arc<dyn ExistenceResolver>)
            .with_title_lookup(Arc::clone(mock) as Arc<dyn TitleLookup>);
        Compiler::html(RuleSet::standard(), links, capabilities).unwrap()
    }

    #[test]
    fn test_missing_renderer_rejected_at_construction() {
        let mut registry = RendererRegistry::new();
        registry.register_format(OutputFormat::HTML, Arc::new(crate::html::HtmlFormat));
        registry
            .register(
                OutputFormat::HTML,
                TokenType::Horiz,
                Arc::new(HorizRenderer) as Arc<dyn TokenRenderer>,
            )
            .unwrap();
        let err = Compiler::new(RuleSet::standard(), registry, OutputFormat::HTML).err();
        assert!(matches!(err, Some(ConfigError::MissingRenderer { .. })));
    }

    #[test]
    fn test_full_document() {
        let mock = Arc::new(
            MockResolver::new()
                .with_titled_page("start", "Welcome")
                .with_page("about"),
        );
        let links = LinkConfig::default()
            .with_view_url("/view/%s")
            .with_new_url("/new/%s")
            .with_css_new("newpage");
        let text = "+ Intro\n\
                    Read [[[start| ]]], ((about|About us)) or [[[later|//soon//]]].\n\
                    \n\
                    See [[[:meta:rules]]].";

        let rendered = compiler(&mock, &links).compile(text).unwrap();

        assert_eq!(
            rendered.output,
            "<h1>Intro</h1>\n\
             <p>Read <a href=\"/view/start\">Welcome</a>, \
             <a href=\"/view/about\">About&nbsp;us</a> or \
             <em>soon</em><a class=\"newpage\" href=\"/new/later\">?</a>.</p>\n\n\
             <p>See <a href=\"https://meta.wikidot.com/rules\">rules</a>.</p>"
        );
        let links: Vec<_> = rendered.context.internal_links().iter().cloned().collect();
        assert_eq!(links, vec!["about", "later", "start"]);
        assert_eq!(mock.batches(), vec![3]);
    }

    #[test]
    fn test_blank_link_fails_without_output() {
        let mock = Arc::new(MockResolver::new());
        let err = compiler(&mock, &LinkConfig::default())
            .compile("text [[[ ]]]")
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Parse(ParseError::MissingField { field: "page", .. })
        ));
    }

    #[test]
    fn test_resolver_failure_fails_compile() {
        let mock = Arc::new(MockResolver::new().with_failure("broken"));
        let err = compiler(&mock, &LinkConfig::default())
            .compile("[[[fine]]] [[[broken]]]")
            .unwrap_err();
        assert!(matches!(err, RenderError::Resolution(e) if e.page == "broken"));
    }

    #[test]
    fn test_deep_nesting_fails() {
        let mock = Arc::new(MockResolver::new());
        let compiler = compiler(&mock, &LinkConfig::default());
        let text = format!("{}x{}", "[[div]]\n".repeat(20), "[[/div]]\n".repeat(20));
        let err = compiler.compile(&text).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Parse(ParseError::NestingTooDeep { rule: "div", limit: 16 })
        ));
    }

    #[test]
    fn test_compile_many_keeps_contexts_separate() {
        let mock = Arc::new(MockResolver::new().with_page("a"));
        let compiler = compiler(&mock, &LinkConfig::default());
        let docs = ["[[[a]]]", "[[[b]]] [[[c]]]", "no links"];

        let results = compiler.compile_many(&docs);

        assert_eq!(results.len(), 3);
        let contexts: Vec<_> = results
            .into_iter()
            .map(|r| r.unwrap().context)
            .collect();
        assert_eq!(contexts[0].internal_links().len(), 1);
        assert_eq!(contexts[1].internal_links().len(), 2);
        assert!(contexts[2].internal_links().is_empty());

        let mut merged = crate::RenderContext::new();
        for ctx in contexts {
            merged.merge(ctx);
        }
        assert_eq!(merged.internal_links().len(), 3);
    }
}

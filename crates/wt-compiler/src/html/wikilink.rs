//! Wiki-link and free-link renderer.
//!
//! Three output shapes:
//!
//! - existing page: `<a class="css" href="view_url">text</a>`
//! - missing page: the text plus a create-page marker linking to `new_url`,
//!   or the bare text when no `new_url` is configured
//! - cross-site link: `<a href="scheme://site.domain/page">text</a>`, never
//!   checked for existence
//!
//! Existence is resolved for the whole document in one batch during
//! [`TokenRenderer::prepare`] and served from the [`RenderContext`] cache.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::escape_html;
use crate::error::{ConfigError, RenderError};
use crate::link::{LinkConfig, LinkFields, NewTextPosition, UrlTemplate};
use crate::render::{RenderContext, TokenRenderer};
use crate::resolver::{AssumeExists, ExistenceResolver, ListResolver, PageExistence, TitleLookup};
use crate::token::{Token, neutralize_delimiters};

/// Capabilities injected into the link renderer.
#[derive(Clone, Default)]
pub struct LinkCapabilities {
    resolver: Option<Arc<dyn ExistenceResolver>>,
    titles: Option<Arc<dyn TitleLookup>>,
}

impl LinkCapabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver answering page existence. Takes precedence over the
    /// configured allow-list.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ExistenceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Title source for links that display the target's title.
    #[must_use]
    pub fn with_title_lookup(mut self, titles: Arc<dyn TitleLookup>) -> Self {
        self.titles = Some(titles);
        self
    }
}

impl fmt::Debug for LinkCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkCapabilities")
            .field("resolver", &self.resolver.is_some())
            .field("titles", &self.titles.is_some())
            .finish()
    }
}

/// Renders [`Wikilink`](crate::TokenType::Wikilink) and
/// [`Freelink`](crate::TokenType::Freelink) tokens to HTML.
pub struct WikilinkRenderer {
    view_url: UrlTemplate,
    new_url: Option<UrlTemplate>,
    new_text: String,
    new_text_pos: NewTextPosition,
    css: Option<String>,
    css_new: Option<String>,
    site_scheme: String,
    site_domain: String,
    resolver: Arc<dyn ExistenceResolver>,
    titles: Option<Arc<dyn TitleLookup>>,
}

impl WikilinkRenderer {
    /// Validate `config` and bind the capabilities.
    ///
    /// Existence is answered by the injected resolver, else by the
    /// allow-list, else every page is assumed to exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] if a URL setting has more
    /// than one `%s`.
    pub fn new(config: &LinkConfig, capabilities: LinkCapabilities) -> Result<Self, ConfigError> {
        // Config values land inside `href="…"`, so their literal parts are escaped once here.
        let view_url = UrlTemplate::parse("view_url", &escape_html(&config.view_url))?;
        let new_url = config
            .new_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| UrlTemplate::parse("new_url", &escape_html(url)))
            .transpose()?;

        let resolver: Arc<dyn ExistenceResolver> =
            match (capabilities.resolver, &config.allow_list) {
                (Some(resolver), _) => resolver,
                (None, Some(pages)) => Arc::new(ListResolver::new(pages.iter().cloned())),
                (None, None) => {
                    tracing::warn!(
                        "No page resolver or allow-list configured, all links render as existing"
                    );
                    Arc::new(AssumeExists)
                }
            };

        Ok(Self {
            view_url,
            new_url,
            new_text: config.new_text.clone(),
            new_text_pos: config.new_text_pos,
            css: config.css.clone().filter(|c| !c.is_empty()),
            css_new: config.css_new.clone().filter(|c| !c.is_empty()),
            site_scheme: escape_html(&config.site_scheme),
            site_domain: escape_html(&config.site_domain),
            resolver,
            titles: capabilities.titles,
        })
    }

    fn existence(&self, page: &str, ctx: &mut RenderContext) -> Result<PageExistence, RenderError> {
        if let Some(answer) = ctx.cached_existence(page) {
            return Ok(answer.clone());
        }
        let answer = self.resolver.check(page)?;
        ctx.cache_existence(page, answer.clone());
        Ok(answer)
    }

    fn cross_site(&self, site: &str, fields: &LinkFields<'_>) -> String {
        let label = fields.text.unwrap_or(fields.page);
        format!(
            r#"<a href="{}://{}.{}/{}">{}</a>"#,
            self.site_scheme,
            escape_html(site.trim()),
            self.site_domain,
            escape_html(fields.page.trim()),
            escape_html(label.trim())
        )
    }

    fn anchor(css: Option<&str>, href: &str, label: &str) -> String {
        match css {
            Some(class) => format!(r#"<a class="{}" href="{href}">{label}</a>"#, escape_html(class)),
            None => format!(r#"<a href="{href}">{label}</a>"#),
        }
    }
}

impl TokenRenderer for WikilinkRenderer {
    fn prepare(&self, tokens: &[&Token], ctx: &mut RenderContext) -> Result<(), RenderError> {
        let mut pages = BTreeSet::new();
        for token in tokens {
            let fields = LinkFields::from_token(token)?;
            let page = fields.page.trim();
            if fields.site.is_none() && ctx.cached_existence(page).is_none() {
                pages.insert(page.to_owned());
            }
        }
        if pages.is_empty() {
            return Ok(());
        }

        let mut answers = self.resolver.check_batch(&pages)?;
        tracing::debug!(
            pages = pages.len(),
            answered = answers.len(),
            "Resolved link targets"
        );
        for page in pages {
            let answer = match answers.remove(&page) {
                Some(answer) => answer,
                None => self.resolver.check(&page)?,
            };
            ctx.cache_existence(page, answer);
        }
        Ok(())
    }

    fn render(&self, token: &Token, ctx: &mut RenderContext) -> Result<String, RenderError> {
        let fields = LinkFields::from_token(token)?;
        if let Some(site) = fields.site {
            return Ok(self.cross_site(site, &fields));
        }

        let page = fields.page.trim();
        let existence = self.existence(page, ctx)?;

        let title;
        let text = match (&existence, fields.text_from_title, &self.titles) {
            (PageExistence::Exists(handle), true, Some(titles)) => {
                title = neutralize_delimiters(&titles.title_for(handle)?);
                title.as_str()
            }
            (_, true, _) => page,
            (_, false, _) => fields.text.unwrap_or(page),
        };

        ctx.add_internal_link(page);

        let escaped_page = escape_html(page);
        let mut label = escape_html(text.trim());
        if fields.nonbr {
            label = label.replace(' ', "&nbsp;");
        }

        if existence.exists() {
            let target = match fields.anchor.map(str::trim).filter(|a| !a.is_empty()) {
                Some(anchor) => format!("{escaped_page}#{}", escape_html(anchor)),
                None => escaped_page,
            };
            let href = self.view_url.expand(&target);
            return Ok(Self::anchor(self.css.as_deref(), &href, &label));
        }

        let Some(new_url) = &self.new_url else {
            return Ok(label);
        };
        let href = new_url.expand(&escaped_page);
        let css = self.css_new.as_deref();
        let marker = escape_html(&self.new_text);
        if marker.is_empty() {
            return Ok(Self::anchor(css, &href, &label));
        }
        Ok(match self.new_text_pos {
            NewTextPosition::None => Self::anchor(css, &href, &label),
            NewTextPosition::Before => format!("{}{label}", Self::anchor(css, &href, &marker)),
            NewTextPosition::After => format!("{label}{}", Self::anchor(css, &href, &marker)),
        })
    }
}

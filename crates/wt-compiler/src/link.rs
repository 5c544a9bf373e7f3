//! Link renderer configuration and typed link fields.

use crate::error::{ConfigError, ParseError};
use crate::token::Token;

/// Where the create-page marker goes relative to the link text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NewTextPosition {
    Before,
    #[default]
    After,
    /// No marker: the link text itself points at the create-page URL.
    None,
}

/// Settings of the wiki-link renderer.
///
/// Values are taken as-is; [`WikilinkRenderer::new`](crate::html::WikilinkRenderer::new)
/// validates them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    /// URL of existing pages. Either a template with one `%s`, or a prefix
    /// the target is appended to.
    pub view_url: String,
    /// URL of the create-page form, same forms as `view_url`. Without it
    /// missing pages render as plain text.
    pub new_url: Option<String>,
    /// Label of the create-page marker.
    pub new_text: String,
    pub new_text_pos: NewTextPosition,
    /// CSS class of links to existing pages.
    pub css: Option<String>,
    /// CSS class of create-page links.
    pub css_new: Option<String>,
    /// Pages known to exist, used when no resolver is injected.
    pub allow_list: Option<Vec<String>>,
    /// Scheme of cross-site links.
    pub site_scheme: String,
    /// Domain that site names are prefixed to in cross-site links.
    pub site_domain: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            view_url: "/%s".to_owned(),
            new_url: None,
            new_text: "?".to_owned(),
            new_text_pos: NewTextPosition::After,
            css: None,
            css_new: None,
            allow_list: None,
            site_scheme: "https".to_owned(),
            site_domain: "wikidot.com".to_owned(),
        }
    }
}

impl LinkConfig {
    #[must_use]
    pub fn with_view_url(mut self, view_url: impl Into<String>) -> Self {
        self.view_url = view_url.into();
        self
    }

    #[must_use]
    pub fn with_new_url(mut self, new_url: impl Into<String>) -> Self {
        self.new_url = Some(new_url.into());
        self
    }

    #[must_use]
    pub fn with_new_text(mut self, new_text: impl Into<String>, pos: NewTextPosition) -> Self {
        self.new_text = new_text.into();
        self.new_text_pos = pos;
        self
    }

    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    #[must_use]
    pub fn with_css_new(mut self, css_new: impl Into<String>) -> Self {
        self.css_new = Some(css_new.into());
        self
    }

    #[must_use]
    pub fn with_allow_list<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = Some(pages.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_site(mut self, scheme: impl Into<String>, domain: impl Into<String>) -> Self {
        self.site_scheme = scheme.into();
        self.site_domain = domain.into();
        self
    }
}

/// A parsed link URL setting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UrlTemplate {
    /// `before%safter`
    Format { before: String, after: String },
    /// Target appended to the prefix.
    Prefix(String),
}

impl UrlTemplate {
    pub(crate) fn parse(field: &'static str, raw: &str) -> Result<Self, ConfigError> {
        match raw.matches("%s").count() {
            0 => Ok(Self::Prefix(raw.to_owned())),
            1 => {
                let (before, after) = raw.split_once("%s").unwrap_or((raw, ""));
                Ok(Self::Format {
                    before: before.to_owned(),
                    after: after.to_owned(),
                })
            }
            n => Err(ConfigError::InvalidTemplate {
                field,
                message: format!("expected at most one `%s`, found {n}"),
            }),
        }
    }

    pub(crate) fn expand(&self, target: &str) -> String {
        match self {
            Self::Format { before, after } => format!("{before}{target}{after}"),
            Self::Prefix(prefix) => format!("{prefix}{target}"),
        }
    }
}

/// Fields of a wiki-link or free-link token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkFields<'a> {
    /// Site of a cross-site link.
    pub site: Option<&'a str>,
    pub page: &'a str,
    pub anchor: Option<&'a str>,
    /// Display text; the page name when absent.
    pub text: Option<&'a str>,
    /// Replace the display text with the target's title.
    pub text_from_title: bool,
    /// Render spaces in the display text as non-breaking.
    pub nonbr: bool,
}

impl<'a> LinkFields<'a> {
    /// Read the link fields of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] when `page` is absent or blank.
    pub fn from_token(token: &'a Token) -> Result<Self, ParseError> {
        let page = token
            .str("page")
            .filter(|p| !p.trim().is_empty())
            .ok_or(ParseError::MissingField {
                rule: token.kind().name(),
                field: "page",
            })?;
        Ok(Self {
            site: token.str("site"),
            page,
            anchor: token.str("anchor"),
            text: token.str("text"),
            text_from_title: token.flag("text_from_title"),
            nonbr: token.flag("nonbr"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_forms() {
        let format = UrlTemplate::parse("view_url", "/view/%s?x=1").unwrap();
        assert_eq!(format.expand("a#b"), "/view/a#b?x=1");

        let prefix = UrlTemplate::parse("view_url", "/wiki/").unwrap();
        assert_eq!(prefix.expand("page"), "/wiki/page");
    }

    #[test]
    fn test_template_rejects_two_slots() {
        let err = UrlTemplate::parse("new_url", "/%s/%s").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTemplate {
                field: "new_url",
                ..
            }
        ));
    }

    #[test]
    fn test_fields_from_token() {
        let token = Token::new(TokenType::Freelink)
            .with("page", "start")
            .with("anchor", "top")
            .with("nonbr", true);
        let fields = LinkFields::from_token(&token).unwrap();
        assert_eq!(
            fields,
            LinkFields {
                site: None,
                page: "start",
                anchor: Some("top"),
                text: None,
                text_from_title: false,
                nonbr: true,
            }
        );
    }

    #[test]
    fn test_fields_require_page() {
        let token = Token::new(TokenType::Wikilink).with("page", "  ");
        let err = LinkFields::from_token(&token).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingField {
                rule: "wikilink",
                field: "page"
            }
        ));
    }

    #[test]
    fn test_default_config() {
        let config = LinkConfig::default();
        assert_eq!(config.new_text, "?");
        assert_eq!(config.new_text_pos, NewTextPosition::After);
        assert!(config.allow_list.is_none());
    }
}

//! Wiki-link rules.
//!
//! Both rules share one target grammar:
//!
//! ```text
//! [[[page]]]              link, display text is the page name
//! [[[page|text]]]         link with explicit display text
//! [[[page| ]]]            link whose display text is the target's title
//! [[[page#anchor]]]       link to an anchor on the page
//! [[[:site:page]]]        link to a page on another site
//! ((page)) ((page|text))  free link, rendered without line breaks
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{ParseRule, replace_matches};
use crate::error::ParseError;
use crate::token::{Token, TokenTable, TokenType, has_placeholder};

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[\[([^\[\]|]*)(?:\|([^\[\]]*))?\]\]\]").unwrap());

static FREELINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\(([^()|]*)(?:\|([^()]*))?\)\)").unwrap());

/// `[[[page]]]` links.
pub struct WikilinkRule;

impl ParseRule for WikilinkRule {
    fn name(&self) -> &'static str {
        "wikilink"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Wikilink]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        replace_matches(&WIKILINK_RE, text, |caps| {
            let token = link_token(self.name(), TokenType::Wikilink, caps)?;
            Ok(token.map(|t| tokens.push(t).to_string()))
        })
    }
}

/// `((page))` links. Display text never wraps.
pub struct FreelinkRule;

impl ParseRule for FreelinkRule {
    fn name(&self) -> &'static str {
        "freelink"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Freelink]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        replace_matches(&FREELINK_RE, text, |caps| {
            let token = link_token(self.name(), TokenType::Freelink, caps)?;
            Ok(token.map(|t| tokens.push(t.with("nonbr", true)).to_string()))
        })
    }
}

/// Build a link token from a target capture and an optional text capture.
///
/// Returns `Ok(None)` when the target contains markup, leaving the match as
/// literal text.
fn link_token(
    rule: &'static str,
    kind: TokenType,
    caps: &Captures<'_>,
) -> Result<Option<Token>, ParseError> {
    let target = caps.get(1).map_or("", |m| m.as_str()).trim();
    if has_placeholder(target) {
        return Ok(None);
    }

    let (site, rest) = split_site(target);
    let (page, anchor) = match rest.split_once('#') {
        Some((page, anchor)) => (page.trim(), Some(anchor.trim()).filter(|a| !a.is_empty())),
        None => (rest.trim(), None),
    };
    if page.is_empty() {
        return Err(ParseError::MissingField {
            rule,
            field: "page",
        });
    }

    let mut token = Token::new(kind)
        .with("page", page)
        .with_opt("site", site)
        .with_opt("anchor", anchor);

    match caps.get(2).map(|m| m.as_str()) {
        Some(text) if text.trim().is_empty() => token = token.with("text_from_title", true),
        Some(text) => token = token.with("text", text),
        None => {}
    }
    Ok(Some(token))
}

/// Split `:site:page` into its parts. Anything else is a local target.
fn split_site(target: &str) -> (Option<&str>, &str) {
    let Some(rest) = target.strip_prefix(':') else {
        return (None, target);
    };
    match rest.split_once(':') {
        Some((site, page)) if !site.trim().is_empty() => (Some(site.trim()), page),
        _ => (None, rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Placeholder;
    use pretty_assertions::assert_eq;

    fn single(rule: &dyn ParseRule, text: &str) -> Token {
        let mut tokens = TokenTable::new();
        rule.apply(text, &mut tokens).unwrap().unwrap();
        assert_eq!(tokens.len(), 1);
        tokens.get(0).unwrap().clone()
    }

    #[test]
    fn test_plain_link() {
        let token = single(&WikilinkRule, "[[[Start]]]");
        assert_eq!(token.kind(), TokenType::Wikilink);
        assert_eq!(token.str("page"), Some("Start"));
        assert!(token.get("text").is_none());
        assert!(!token.flag("text_from_title"));
        assert!(!token.flag("nonbr"));
    }

    #[test]
    fn test_link_with_text_and_anchor() {
        let token = single(&WikilinkRule, "[[[ docs # install |Install guide]]]");
        assert_eq!(token.str("page"), Some("docs"));
        assert_eq!(token.str("anchor"), Some("install"));
        assert_eq!(token.str("text"), Some("Install guide"));
    }

    #[test]
    fn test_blank_text_means_title() {
        let token = single(&WikilinkRule, "[[[about| ]]]");
        assert!(token.flag("text_from_title"));
        assert!(token.get("text").is_none());
    }

    #[test]
    fn test_cross_site_link() {
        let token = single(&WikilinkRule, "[[[:community:rules|Rules]]]");
        assert_eq!(token.str("site"), Some("community"));
        assert_eq!(token.str("page"), Some("rules"));
    }

    #[test]
    fn test_leading_colon_without_site_is_local() {
        let token = single(&WikilinkRule, "[[[:start]]]");
        assert!(token.get("site").is_none());
        assert_eq!(token.str("page"), Some("start"));
    }

    #[test]
    fn test_empty_anchor_dropped() {
        let token = single(&WikilinkRule, "[[[page#]]]");
        assert!(token.get("anchor").is_none());
    }

    #[test]
    fn test_blank_page_is_rejected() {
        for text in ["[[[ ]]]", "[[[]]]", "[[[|x]]]", "[[[#top]]]"] {
            let mut tokens = TokenTable::new();
            let err = WikilinkRule.apply(text, &mut tokens).unwrap_err();
            assert!(
                matches!(
                    err,
                    ParseError::MissingField {
                        rule: "wikilink",
                        field: "page"
                    }
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn test_placeholder_in_page_stays_literal() {
        let text = format!("[[[a{}b]]]", Placeholder(0));
        let mut tokens = TokenTable::new();
        assert!(WikilinkRule.apply(&text, &mut tokens).unwrap().is_none());
    }

    #[test]
    fn test_placeholder_in_text_is_kept() {
        let text = format!("[[[page|see {}this{}]]]", Placeholder(0), Placeholder(1));
        let token = single(&WikilinkRule, &text);
        assert_eq!(
            token.str("text"),
            Some(format!("see {}this{}", Placeholder(0), Placeholder(1)).as_str())
        );
    }

    #[test]
    fn test_freelink_sets_nonbr() {
        let token = single(&FreelinkRule, "((Some Page|a label))");
        assert_eq!(token.kind(), TokenType::Freelink);
        assert_eq!(token.str("page"), Some("Some Page"));
        assert_eq!(token.str("text"), Some("a label"));
        assert!(token.flag("nonbr"));
    }

    #[test]
    fn test_replaces_in_place() {
        let mut tokens = TokenTable::new();
        let out = WikilinkRule
            .apply("go [[[a]]] or [[[b]]].", &mut tokens)
            .unwrap()
            .unwrap();
        assert_eq!(out, format!("go {} or {}.", Placeholder(0), Placeholder(1)));
    }
}

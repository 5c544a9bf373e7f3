//! Inline rules: URLs and emphasis-style markup.

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseRule, replace_matches, wrap_pair};
use crate::error::ParseError;
use crate::token::{Edge, Token, TokenTable, TokenType};

static BRACKET_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(https?://[^\s\[\]\x{E000}\x{E001}]+)(?:[ \t]+([^\]]*?))?[ \t]*\]").unwrap()
});

static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"\[\]\x{E000}\x{E001}]+"#).unwrap()
});

static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//(.+?)//").unwrap());
static TELETYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").unwrap());

/// Characters trimmed from the end of a bare URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\''];

/// `[https://example.com label]` and bare `https://example.com`.
pub struct UrlRule;

impl ParseRule for UrlRule {
    fn name(&self) -> &'static str {
        "url"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Url]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        let bracketed = replace_matches(&BRACKET_URL_RE, text, |caps| {
            let label = caps.get(2).map(|m| m.as_str()).filter(|s| !s.trim().is_empty());
            let token = Token::new(TokenType::Url)
                .with("href", &caps[1])
                .with_opt("text", label);
            Ok(Some(tokens.push(token).to_string()))
        })?;

        let current = bracketed.as_deref().unwrap_or(text);
        let bare = replace_matches(&BARE_URL_RE, current, |caps| {
            let url = &caps[0];
            let href = url.trim_end_matches(TRAILING_PUNCTUATION);
            if href.ends_with("://") {
                return Ok(None);
            }
            let token = Token::new(TokenType::Url).with("href", href);
            Ok(Some(format!("{}{}", tokens.push(token), &url[href.len()..])))
        })?;

        Ok(bare.or(bracketed))
    }
}

fn wrap_all(
    re: &Regex,
    kind: TokenType,
    text: &str,
    tokens: &mut TokenTable,
) -> Result<Option<String>, ParseError> {
    replace_matches(re, text, |caps| {
        let start = Token::edge(kind, Edge::Start);
        Ok(Some(wrap_pair(tokens, start, &caps[1])))
    })
}

/// `**strong**`
pub struct StrongRule;

impl ParseRule for StrongRule {
    fn name(&self) -> &'static str {
        "strong"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Strong]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        wrap_all(&STRONG_RE, TokenType::Strong, text, tokens)
    }
}

/// `//emphasis//`
pub struct EmphasisRule;

impl ParseRule for EmphasisRule {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Emphasis]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        wrap_all(&EMPHASIS_RE, TokenType::Emphasis, text, tokens)
    }
}

/// `{{teletype}}`
pub struct TeletypeRule;

impl ParseRule for TeletypeRule {
    fn name(&self) -> &'static str {
        "teletype"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Teletype]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        wrap_all(&TELETYPE_RE, TokenType::Teletype, text, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Placeholder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bracketed_url_with_label() {
        let mut tokens = TokenTable::new();
        let out = UrlRule
            .apply("see [https://example.com/a?b=1 the docs]", &mut tokens)
            .unwrap()
            .unwrap();
        assert_eq!(out, format!("see {}", Placeholder(0)));
        let token = tokens.get(0).unwrap();
        assert_eq!(token.str("href"), Some("https://example.com/a?b=1"));
        assert_eq!(token.str("text"), Some("the docs"));
    }

    #[test]
    fn test_bracketed_url_without_label() {
        let mut tokens = TokenTable::new();
        UrlRule.apply("[http://x.org]", &mut tokens).unwrap().unwrap();
        assert!(tokens.get(0).unwrap().get("text").is_none());
    }

    #[test]
    fn test_bare_url_trims_punctuation() {
        let mut tokens = TokenTable::new();
        let out = UrlRule
            .apply("Go to https://example.com/page.", &mut tokens)
            .unwrap()
            .unwrap();
        assert_eq!(out, format!("Go to {}.", Placeholder(0)));
        assert_eq!(
            tokens.get(0).unwrap().str("href"),
            Some("https://example.com/page")
        );
    }

    #[test]
    fn test_bare_and_bracketed_together() {
        let mut tokens = TokenTable::new();
        UrlRule
            .apply("[https://a.org A] and https://b.org", &mut tokens)
            .unwrap()
            .unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get(1).unwrap().str("href"), Some("https://b.org"));
    }

    #[test]
    fn test_scheme_only_is_literal() {
        let mut tokens = TokenTable::new();
        assert!(UrlRule.apply("http://", &mut tokens).unwrap().is_none());
    }

    #[test]
    fn test_strong_pairs() {
        let mut tokens = TokenTable::new();
        let out = StrongRule
            .apply("**a** b **c**", &mut tokens)
            .unwrap()
            .unwrap();
        assert_eq!(
            out,
            format!(
                "{}a{} b {}c{}",
                Placeholder(0),
                Placeholder(1),
                Placeholder(2),
                Placeholder(3)
            )
        );
        assert_eq!(tokens.get(0).unwrap().edge_kind(), Some(Edge::Start));
        assert_eq!(tokens.get(1).unwrap().edge_kind(), Some(Edge::End));
    }

    #[test]
    fn test_unbalanced_markup_stays_literal() {
        let mut tokens = TokenTable::new();
        assert!(StrongRule.apply("**open", &mut tokens).unwrap().is_none());
        assert!(EmphasisRule.apply("a // b", &mut tokens).unwrap().is_none());
        assert!(TeletypeRule.apply("{{x}", &mut tokens).unwrap().is_none());
    }

    #[test]
    fn test_emphasis_inside_strong() {
        let mut tokens = TokenTable::new();
        let text = StrongRule
            .apply("**bold //both//**", &mut tokens)
            .unwrap()
            .unwrap();
        EmphasisRule.apply(&text, &mut tokens).unwrap().unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens.get(2).unwrap().kind(), TokenType::Emphasis);
    }
}

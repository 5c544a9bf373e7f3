//! Block-level rules: code, raw text, divs, headings, rules, and paragraphs.

use std::sync::LazyLock;

use regex::Regex;

use super::{ParseRule, replace_matches, wrap_pair};
use crate::error::ParseError;
use crate::token::{Edge, Segment, Token, TokenTable, TokenType, segments};

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\[\[code(?:\s+type="([^"]*)")?\]\]\n?(.*?)\n?\[\[/code\]\]"#).unwrap()
});

static RAW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@@(.*?)@@").unwrap());

static DIV_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[\[div(?:\s+class="([^"]*)")?\]\]"#).unwrap());

const DIV_CLOSE: &str = "[[/div]]";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\+{1,6})[ \t]+(.+?)[ \t]*$").unwrap());

static HORIZ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^-{4,}[ \t]*$").unwrap());

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

/// `[[code]]…[[/code]]` with verbatim content.
pub struct CodeRule;

impl ParseRule for CodeRule {
    fn name(&self) -> &'static str {
        "code"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Code]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        replace_matches(&CODE_RE, text, |caps| {
            let token = Token::new(TokenType::Code)
                .with("text", &caps[2])
                .with_opt("type", caps.get(1).map(|m| m.as_str()).filter(|s| !s.is_empty()));
            Ok(Some(tokens.push(token).to_string()))
        })
    }
}

/// `@@literal@@`: text that no later rule may interpret.
pub struct RawRule;

impl ParseRule for RawRule {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Raw]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        replace_matches(&RAW_RE, text, |caps| {
            let token = Token::new(TokenType::Raw).with("text", &caps[1]);
            Ok(Some(tokens.push(token).to_string()))
        })
    }
}

/// `[[div class="…"]]…[[/div]]`, nestable.
///
/// Each pass tokenizes the innermost open/close pairs, so nesting depth `n`
/// needs `n` passes.
pub struct DivRule;

impl ParseRule for DivRule {
    fn name(&self) -> &'static str {
        "div"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Div]
    }

    fn nests(&self) -> bool {
        true
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        let opens: Vec<(usize, usize, Option<String>)> = DIV_OPEN_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let class = caps.get(1).map(|m| m.as_str().to_owned());
                Some((whole.start(), whole.end(), class))
            })
            .collect();
        let closes: Vec<usize> = text.match_indices(DIV_CLOSE).map(|(i, _)| i).collect();

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut changed = false;

        for (idx, (open_start, open_end, class)) in opens.iter().enumerate() {
            if *open_start < last {
                continue;
            }
            let Some(&close) = closes.iter().find(|&&c| c >= *open_end) else {
                // Unterminated: everything after stays literal.
                break;
            };
            let nested_open = opens
                .get(idx + 1)
                .is_some_and(|(next_start, _, _)| *next_start < close);
            if nested_open {
                continue;
            }

            let start = Token::edge(TokenType::Div, Edge::Start).with_opt("class", class.clone());
            out.push_str(&text[last..*open_start]);
            out.push_str(&wrap_pair(tokens, start, &text[*open_end..close]));
            last = close + DIV_CLOSE.len();
            changed = true;
        }

        if !changed {
            return Ok(None);
        }
        out.push_str(&text[last..]);
        Ok(Some(out))
    }
}

/// `+ Heading` through `++++++ Heading`.
pub struct HeadingRule;

impl ParseRule for HeadingRule {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Heading]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        replace_matches(&HEADING_RE, text, |caps| {
            // Both halves carry the level so the closing tag can be written.
            let level = caps[1].len().to_string();
            let open = tokens.push(
                Token::edge(TokenType::Heading, Edge::Start).with("level", level.clone()),
            );
            let close =
                tokens.push(Token::edge(TokenType::Heading, Edge::End).with("level", level));
            Ok(Some(format!("{open}{}{close}", &caps[2])))
        })
    }
}

/// A line of four or more dashes.
pub struct HorizRule;

impl ParseRule for HorizRule {
    fn name(&self) -> &'static str {
        "horiz"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Horiz]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        replace_matches(&HORIZ_RE, text, |_| {
            Ok(Some(tokens.push(Token::new(TokenType::Horiz)).to_string()))
        })
    }
}

/// Wraps runs of non-block lines between blank lines in paragraphs.
pub struct ParagraphRule;

impl ParseRule for ParagraphRule {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn produces(&self) -> &'static [TokenType] {
        &[TokenType::Paragraph]
    }

    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError> {
        let mut out = String::with_capacity(text.len() + 16);
        let mut changed = false;

        for (i, chunk) in BLANK_LINES_RE.split(text).enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            let mut run: Vec<&str> = Vec::new();
            let mut lines = Vec::new();

            for line in chunk.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                if starts_with_block(line, tokens)? {
                    if !run.is_empty() {
                        lines.push(paragraph(tokens, &run));
                        run.clear();
                        changed = true;
                    }
                    lines.push(line.to_owned());
                } else {
                    run.push(line.trim());
                }
            }
            if !run.is_empty() {
                lines.push(paragraph(tokens, &run));
                changed = true;
            }
            out.push_str(&lines.join("\n"));
        }

        Ok(changed.then_some(out))
    }
}

fn paragraph(tokens: &mut TokenTable, lines: &[&str]) -> String {
    let start = Token::edge(TokenType::Paragraph, Edge::Start);
    wrap_pair(tokens, start, &lines.join("\n"))
}

fn starts_with_block(line: &str, tokens: &TokenTable) -> Result<bool, ParseError> {
    let first = segments(line.trim_start())?.into_iter().next();
    Ok(match first {
        Some(Segment::Token(id)) => tokens.get(id).is_some_and(|t| t.kind().is_block()),
        _ => false,
    })
}

//! Rule engine: ordered parse rules that turn raw wikitext into placeholder
//! text plus a [`TokenTable`].
//!
//! # Architecture
//!
//! Rules run one after another in a fixed priority order. Each rule sees the
//! text left by its predecessors, replaces the constructs it recognizes with
//! placeholders, and appends the matching tokens. Placeholders contain no
//! markup characters, so a later rule can never re-interpret a span an earlier
//! rule has claimed.
//!
//! Rules whose construct nests (see [`ParseRule::nests`]) run repeatedly,
//! innermost level first. Every repeated pass must shrink the amount of
//! literal text, and the number of passes is bounded by
//! [`RuleSet::max_passes`].
//!
//! # Example
//!
//! ```
//! use wt_compiler::rules::{RuleSet, parse};
//!
//! let doc = parse("**bold** and [[[start]]]", &RuleSet::standard()).unwrap();
//! // paragraph start/end, strong start/end, wikilink
//! assert_eq!(doc.tokens.len(), 5);
//! ```

mod block;
mod inline;
mod link;

use regex::{Captures, Regex};

use crate::error::ParseError;
use crate::token::{Edge, Token, TokenTable, TokenType, literal_len, sanitize};

pub use block::{CodeRule, DivRule, HeadingRule, HorizRule, ParagraphRule, RawRule};
pub use inline::{EmphasisRule, StrongRule, TeletypeRule, UrlRule};
pub use link::{FreelinkRule, WikilinkRule};

/// Default bound on passes for nesting rules.
pub const DEFAULT_MAX_PASSES: usize = 16;

/// A single tokenizing rule.
///
/// Implementations must be stateless: the same rule set is shared by
/// concurrent parses.
pub trait ParseRule: Send + Sync {
    /// Rule name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Token types this rule can emit.
    ///
    /// Used to check renderer coverage before any document is rendered.
    fn produces(&self) -> &'static [TokenType];

    /// Whether the construct nests and the rule must run until it stops matching.
    fn nests(&self) -> bool {
        false
    }

    /// Apply one pass of the rule.
    ///
    /// Returns `Ok(None)` when nothing matched, or the rewritten text.
    fn apply(&self, text: &str, tokens: &mut TokenTable) -> Result<Option<String>, ParseError>;
}

/// Ordered list of parse rules.
pub struct RuleSet {
    rules: Vec<Box<dyn ParseRule>>,
    max_passes: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// The standard wikitext rules: block constructs first, then inline
    /// markup, then links.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_rule(CodeRule)
            .with_rule(RawRule)
            .with_rule(DivRule)
            .with_rule(HeadingRule)
            .with_rule(HorizRule)
            .with_rule(ParagraphRule)
            .with_rule(UrlRule)
            .with_rule(StrongRule)
            .with_rule(EmphasisRule)
            .with_rule(TeletypeRule)
            .with_rule(WikilinkRule)
            .with_rule(FreelinkRule)
    }

    /// Append a rule at the lowest priority.
    #[must_use]
    pub fn with_rule<R: ParseRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Set the pass bound for nesting rules (minimum 1).
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    #[must_use]
    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Every token type any rule in the set can emit.
    pub fn produced_types(&self) -> impl Iterator<Item = TokenType> + '_ {
        self.rules.iter().flat_map(|r| r.produces().iter().copied())
    }

    /// Rule names in priority order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name())
    }
}

/// Output of the parse phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Input text with every recognized construct replaced by a placeholder.
    pub text: String,
    /// Tokens referenced by the placeholders.
    pub tokens: TokenTable,
}

/// Tokenize `raw` with `rules`.
///
/// # Errors
///
/// Returns [`ParseError`] when a recognized construct lacks a required field
/// or a nesting rule exceeds its pass bound or stops making progress.
pub fn parse(raw: &str, rules: &RuleSet) -> Result<ParsedDocument, ParseError> {
    let mut text = sanitize(raw);
    let mut tokens = TokenTable::new();

    for rule in &rules.rules {
        let before = tokens.len();
        text = if rule.nests() {
            run_nesting(rule.as_ref(), text, &mut tokens, rules.max_passes)?
        } else {
            rule.apply(&text, &mut tokens)?.unwrap_or(text)
        };
        tracing::trace!(
            rule = rule.name(),
            tokens = tokens.len() - before,
            "Applied parse rule"
        );
    }

    tracing::debug!(tokens = tokens.len(), "Parsed document");
    Ok(ParsedDocument { text, tokens })
}

fn run_nesting(
    rule: &dyn ParseRule,
    mut text: String,
    tokens: &mut TokenTable,
    max_passes: usize,
) -> Result<String, ParseError> {
    for pass in 0..max_passes {
        let remaining = literal_len(&text);
        match rule.apply(&text, tokens)? {
            None => return Ok(text),
            Some(next) => {
                if literal_len(&next) >= remaining {
                    return Err(ParseError::NoProgress {
                        rule: rule.name(),
                        pass,
                    });
                }
                text = next;
            }
        }
    }

    // One more probe: a rule that still matches after the bound nests too deeply.
    let mut probe = tokens.clone();
    if rule.apply(&text, &mut probe)?.is_some() {
        return Err(ParseError::NestingTooDeep {
            rule: rule.name(),
            limit: max_passes,
        });
    }
    Ok(text)
}

/// Rewrite every match of `re` with the string produced by `f`.
///
/// `f` returns `Ok(None)` to leave a match as literal text. Returns `Ok(None)`
/// when no match was rewritten.
pub(crate) fn replace_matches<F>(
    re: &Regex,
    text: &str,
    mut f: F,
) -> Result<Option<String>, ParseError>
where
    F: FnMut(&Captures<'_>) -> Result<Option<String>, ParseError>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut changed = false;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(replacement) = f(&caps)? {
            out.push_str(&text[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
            changed = true;
        }
    }

    if !changed {
        return Ok(None);
    }
    out.push_str(&text[last..]);
    Ok(Some(out))
}

/// Wrap `inner` in the start and end placeholders of a paired construct.
///
/// `start` carries any fields of the opening token; the end token is bare.
pub(crate) fn wrap_pair(tokens: &mut TokenTable, start: Token, inner: &str) -> String {
    let kind = start.kind();
    let open = tokens.push(start);
    let close = tokens.push(Token::edge(kind, Edge::End));
    format!("{open}{inner}{close}")
}

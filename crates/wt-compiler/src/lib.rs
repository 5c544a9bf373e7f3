//! Two-phase wikitext compiler.
//!
//! This crate turns wiki markup into HTML (or any registered output format)
//! in two phases:
//!
//! 1. **Parse**: an ordered [`RuleSet`] replaces each recognized construct
//!    with a placeholder and records a [`Token`] in a [`TokenTable`].
//! 2. **Render**: a [`RendererRegistry`] maps `(format, token type)` to a
//!    [`TokenRenderer`]; the dispatcher renders every token exactly once and
//!    splices the fragments back into the placeholder positions.
//!
//! # Architecture
//!
//! The compiler never touches page storage. Whether a linked page exists and
//! what its title is are answered by injected capabilities:
//! - [`ExistenceResolver`]: closure-backed ([`CallbackResolver`]), list-backed
//!   ([`ListResolver`]) or [`AssumeExists`]
//! - [`TitleLookup`]: title of an existing page
//!
//! Per-document state (referenced pages, cached existence answers) lives in a
//! [`RenderContext`] created for each render and returned with the output.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wt_compiler::{Compiler, LinkCapabilities, LinkConfig, ListResolver, RuleSet};
//!
//! let capabilities = LinkCapabilities::new()
//!     .with_resolver(Arc::new(ListResolver::new(["start"])));
//! let compiler = Compiler::html(RuleSet::standard(), &LinkConfig::default(), capabilities)?;
//!
//! let rendered = compiler.compile("**Hello**, see [[[start]]].")?;
//! assert_eq!(
//!     rendered.output,
//!     r#"<p><strong>Hello</strong>, see <a href="/start">start</a>.</p>"#
//! );
//! # Ok::<(), wt_compiler::RenderError>(())
//! ```

mod compiler;
mod error;
pub mod html;
mod link;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod render;
mod resolver;
pub mod rules;
pub mod token;

pub use compiler::Compiler;
pub use error::{ConfigError, LookupError, LookupKind, ParseError, RenderError, ResolutionError};
pub use html::{LinkCapabilities, WikilinkRenderer};
pub use link::{LinkConfig, LinkFields, NewTextPosition};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockResolver;
pub use render::{FormatWriter, OutputFormat, RenderContext, Rendered, RendererRegistry, TokenRenderer};
pub use resolver::{
    AssumeExists, CallbackResolver, ExistenceResolver, ListResolver, PageExistence, PageHandle,
    TitleLookup,
};
pub use rules::{ParseRule, ParsedDocument, RuleSet};
pub use token::{Token, TokenTable, TokenType, Value};

//! Page existence and title capabilities.
//!
//! The compiler never talks to page storage directly. Hosts inject an
//! [`ExistenceResolver`] to answer whether a page exists and a
//! [`TitleLookup`] to fetch the display title of an existing page.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::error::{LookupError, ResolutionError};

/// Opaque handle to an existing page, passed back to [`TitleLookup`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageHandle {
    /// Storage identifier, when the host has one.
    pub id: Option<u64>,
    /// Canonical page name.
    pub name: String,
}

impl PageHandle {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Handle without a storage identifier.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Answer of an existence check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageExistence {
    Missing,
    Exists(PageHandle),
}

impl PageExistence {
    #[must_use]
    pub fn exists(&self) -> bool {
        matches!(self, Self::Exists(_))
    }

    #[must_use]
    pub fn handle(&self) -> Option<&PageHandle> {
        match self {
            Self::Exists(handle) => Some(handle),
            Self::Missing => None,
        }
    }
}

/// Answers whether pages exist.
pub trait ExistenceResolver: Send + Sync {
    /// Check a single page.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] naming the page when the lookup fails.
    fn check(&self, page: &str) -> Result<PageExistence, ResolutionError>;

    /// Check many pages at once.
    ///
    /// The default implementation calls [`check`](Self::check) for each page.
    /// Implementations backed by a database should override this with a
    /// single query. Pages left out of the answer are checked individually
    /// by the caller.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolutionError`] encountered.
    fn check_batch(
        &self,
        pages: &BTreeSet<String>,
    ) -> Result<HashMap<String, PageExistence>, ResolutionError> {
        pages
            .iter()
            .map(|page| Ok((page.clone(), self.check(page)?)))
            .collect()
    }
}

/// Fetches display titles of existing pages.
pub trait TitleLookup: Send + Sync {
    /// Title of the page behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] naming the page when the lookup fails.
    fn title_for(&self, handle: &PageHandle) -> Result<String, ResolutionError>;
}

type CheckFn = dyn Fn(&str) -> Result<Option<PageHandle>, LookupError> + Send + Sync;

/// Resolver backed by a closure.
///
/// The closure returns `Ok(Some(handle))` for existing pages and `Ok(None)`
/// for missing ones.
///
/// # Example
///
/// ```
/// use wt_compiler::{CallbackResolver, ExistenceResolver, PageHandle};
///
/// let resolver = CallbackResolver::new(|page| {
///     Ok((page == "start").then(|| PageHandle::named(page)))
/// });
/// assert!(resolver.check("start").unwrap().exists());
/// assert!(!resolver.check("other").unwrap().exists());
/// ```
pub struct CallbackResolver {
    check: Box<CheckFn>,
}

impl CallbackResolver {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&str) -> Result<Option<PageHandle>, LookupError> + Send + Sync + 'static,
    {
        Self {
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for CallbackResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackResolver").finish_non_exhaustive()
    }
}

impl ExistenceResolver for CallbackResolver {
    fn check(&self, page: &str) -> Result<PageExistence, ResolutionError> {
        match (self.check)(page) {
            Ok(Some(handle)) => Ok(PageExistence::Exists(handle)),
            Ok(None) => Ok(PageExistence::Missing),
            Err(e) => Err(ResolutionError::existence(page, e)),
        }
    }
}

/// Resolver backed by a static allow-list of page names.
#[derive(Clone, Debug, Default)]
pub struct ListResolver {
    pages: HashSet<String>,
}

impl ListResolver {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }
}

impl ExistenceResolver for ListResolver {
    fn check(&self, page: &str) -> Result<PageExistence, ResolutionError> {
        Ok(if self.pages.contains(page) {
            PageExistence::Exists(PageHandle::named(page))
        } else {
            PageExistence::Missing
        })
    }
}

/// Resolver that reports every page as existing.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeExists;

impl ExistenceResolver for AssumeExists {
    fn check(&self, page: &str) -> Result<PageExistence, ResolutionError> {
        Ok(PageExistence::Exists(PageHandle::named(page)))
    }
}

//! Mock page resolver for testing.
//!
//! Provides [`MockResolver`], an in-memory [`ExistenceResolver`] and
//! [`TitleLookup`] that records every call it receives.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use crate::error::ResolutionError;
use crate::resolver::{ExistenceResolver, PageExistence, PageHandle, TitleLookup};

/// In-memory resolver that records calls.
///
/// # Example
///
/// ```ignore
/// use wt_compiler::{ExistenceResolver, MockResolver};
///
/// let mock = MockResolver::new().with_titled_page("start", "Welcome");
/// assert!(mock.check("start").unwrap().exists());
/// assert_eq!(mock.checked(), vec!["start".to_owned()]);
/// ```
#[derive(Debug, Default)]
pub struct MockResolver {
    pages: HashMap<String, Option<String>>,
    failing: HashSet<String>,
    failing_titles: HashSet<String>,
    checked: Mutex<Vec<String>>,
    batches: Mutex<Vec<usize>>,
    titles_requested: Mutex<Vec<String>>,
}

impl MockResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing page whose title is its name.
    #[must_use]
    pub fn with_page(mut self, name: impl Into<String>) -> Self {
        self.pages.insert(name.into(), None);
        self
    }

    /// Add an existing page with a title.
    #[must_use]
    pub fn with_titled_page(mut self, name: impl Into<String>, title: impl Into<String>) -> Self {
        self.pages.insert(name.into(), Some(title.into()));
        self
    }

    /// Make existence checks for `name` fail.
    #[must_use]
    pub fn with_failure(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Make title lookups for `name` fail.
    #[must_use]
    pub fn with_title_failure(mut self, name: impl Into<String>) -> Self {
        self.failing_titles.insert(name.into());
        self
    }

    /// Pages passed to single checks, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }

    /// Size of each batch request, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    /// Pages whose title was requested, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn titles_requested(&self) -> Vec<String> {
        self.titles_requested.lock().unwrap().clone()
    }

    fn answer(&self, page: &str) -> Result<PageExistence, ResolutionError> {
        if self.failing.contains(page) {
            return Err(ResolutionError::existence(page, "mock failure"));
        }
        Ok(if self.pages.contains_key(page) {
            PageExistence::Exists(PageHandle::named(page))
        } else {
            PageExistence::Missing
        })
    }
}

impl ExistenceResolver for MockResolver {
    fn check(&self, page: &str) -> Result<PageExistence, ResolutionError> {
        self.checked.lock().unwrap().push(page.to_owned());
        self.answer(page)
    }

    fn check_batch(
        &self,
        pages: &BTreeSet<String>,
    ) -> Result<HashMap<String, PageExistence>, ResolutionError> {
        self.batches.lock().unwrap().push(pages.len());
        pages
            .iter()
            .map(|page| Ok((page.clone(), self.answer(page)?)))
            .collect()
    }
}

impl TitleLookup for MockResolver {
    fn title_for(&self, handle: &PageHandle) -> Result<String, ResolutionError> {
        self.titles_requested
            .lock()
            .unwrap()
            .push(handle.name.clone());
        if self.failing_titles.contains(&handle.name) {
            return Err(ResolutionError::title(&handle.name, "mock failure"));
        }
        Ok(self
            .pages
            .get(&handle.name)
            .cloned()
            .flatten()
            .unwrap_or_else(|| handle.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let mock = MockResolver::new().with_titled_page("a", "Alpha");
        assert!(mock.check("a").unwrap().exists());
        assert!(!mock.check("b").unwrap().exists());
        assert_eq!(mock.checked(), vec!["a".to_owned(), "b".to_owned()]);

        let title = mock.title_for(&PageHandle::named("a")).unwrap();
        assert_eq!(title, "Alpha");
        assert_eq!(mock.titles_requested(), vec!["a".to_owned()]);
    }

    #[test]
    fn test_failure() {
        let mock = MockResolver::new().with_failure("x");
        let err = mock.check("x").unwrap_err();
        assert_eq!(err.page, "x");
    }
}

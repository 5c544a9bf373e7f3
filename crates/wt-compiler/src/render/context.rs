use std::collections::{BTreeSet, HashMap};

use crate::resolver::PageExistence;

/// Per-document render state.
///
/// Created fresh for every render and returned to the caller with the output.
/// Link accumulation is append-only and order-irrelevant.
#[derive(Clone, Debug, Default)]
pub struct RenderContext {
    internal_links: BTreeSet<String>,
    /// Existence answers for this document only.
    existence: HashMap<String, PageExistence>,
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference to a local page.
    pub fn add_internal_link(&mut self, page: impl Into<String>) {
        self.internal_links.insert(page.into());
    }

    /// Local pages referenced by the document.
    #[must_use]
    pub fn internal_links(&self) -> &BTreeSet<String> {
        &self.internal_links
    }

    #[must_use]
    pub fn into_internal_links(self) -> BTreeSet<String> {
        self.internal_links
    }

    /// Fold another document's links into this one.
    ///
    /// Cached existence answers are not carried over.
    pub fn merge(&mut self, other: Self) {
        self.internal_links.extend(other.internal_links);
    }

    /// Cached existence answer for `page`.
    #[must_use]
    pub fn cached_existence(&self, page: &str) -> Option<&PageExistence> {
        self.existence.get(page)
    }

    /// Store an existence answer for the rest of the render.
    pub fn cache_existence(&mut self, page: impl Into<String>, answer: PageExistence) {
        self.existence.insert(page.into(), answer);
    }
}

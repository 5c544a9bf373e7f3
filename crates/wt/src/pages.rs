//! Page index file backing existence checks and titles.
//!
//! One page per line, optionally followed by `| Title`:
//!
//! ```text
//! # pages of the main site
//! start | Welcome
//! about
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use wt_compiler::{ExistenceResolver, PageExistence, PageHandle, ResolutionError, TitleLookup};

/// Error reading a page index.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PageIndexError {
    #[error("Cannot read page index {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Page index line {line}: page name cannot be empty")]
    EmptyName { line: usize },
}

#[derive(Debug)]
struct IndexedPage {
    handle: PageHandle,
    title: Option<String>,
}

/// Pages listed in an index file.
#[derive(Debug, Default)]
pub(crate) struct PageIndex {
    pages: HashMap<String, IndexedPage>,
}

impl PageIndex {
    /// Read an index file.
    pub(crate) fn load(path: &Path) -> Result<Self, PageIndexError> {
        let content = std::fs::read_to_string(path).map_err(|source| PageIndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::parse(&content)?;
        tracing::info!(path = %path.display(), pages = index.len(), "Loaded page index");
        Ok(index)
    }

    pub(crate) fn parse(content: &str) -> Result<Self, PageIndexError> {
        let mut pages = HashMap::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, title) = match line.split_once('|') {
                Some((name, title)) => (name.trim(), Some(title.trim())),
                None => (line, None),
            };
            if name.is_empty() {
                return Err(PageIndexError::EmptyName { line: number + 1 });
            }
            let id = u64::try_from(number + 1).unwrap_or(u64::MAX);
            pages.insert(
                name.to_owned(),
                IndexedPage {
                    handle: PageHandle::new(id, name),
                    title: title.filter(|t| !t.is_empty()).map(str::to_owned),
                },
            );
        }
        Ok(Self { pages })
    }

    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }
}

impl ExistenceResolver for PageIndex {
    fn check(&self, page: &str) -> Result<PageExistence, ResolutionError> {
        Ok(match self.pages.get(page) {
            Some(entry) => PageExistence::Exists(entry.handle.clone()),
            None => PageExistence::Missing,
        })
    }
}

impl TitleLookup for PageIndex {
    fn title_for(&self, handle: &PageHandle) -> Result<String, ResolutionError> {
        let entry = self
            .pages
            .get(&handle.name)
            .ok_or_else(|| ResolutionError::title(&handle.name, "page is not in the index"))?;
        Ok(entry.title.clone().unwrap_or_else(|| handle.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INDEX: &str = "# comment\n\nstart | Welcome Page\nabout\n  spaced name  |  \n";

    #[test]
    fn test_parse_entries() {
        let index = PageIndex::parse(INDEX).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.check("spaced name").unwrap().exists());
        assert!(!index.check("missing").unwrap().exists());
    }

    #[test]
    fn test_titles() {
        let index = PageIndex::parse(INDEX).unwrap();
        let start = index.check("start").unwrap();
        let about = index.check("about").unwrap();
        assert_eq!(index.title_for(start.handle().unwrap()).unwrap(), "Welcome Page");
        assert_eq!(index.title_for(about.handle().unwrap()).unwrap(), "about");
    }

    #[test]
    fn test_handle_ids_are_line_numbers() {
        let index = PageIndex::parse(INDEX).unwrap();
        let start = index.check("start").unwrap();
        assert_eq!(start.handle().unwrap().id, Some(3));
    }

    #[test]
    fn test_unknown_handle_fails() {
        let index = PageIndex::parse(INDEX).unwrap();
        let err = index.title_for(&PageHandle::named("ghost")).unwrap_err();
        assert_eq!(err.page, "ghost");
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = PageIndex::parse("ok\n | Title\n").unwrap_err();
        assert!(matches!(err, PageIndexError::EmptyName { line: 2 }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PageIndex::load(&dir.path().join("pages.txt")).unwrap_err();
        assert!(matches!(err, PageIndexError::Io { .. }));
    }
}

//! View template discovery.
//!
//! Walks a views directory depth-first and describes every template file it
//! finds. Files directly in a directory come before its subdirectories, and
//! both are visited in name order, so two scans of an unchanged tree yield the
//! same sequence.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Names starting with this prefix are fragments (partials).
pub const FRAGMENT_PREFIX: &str = "_";

/// A template file found in the views tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// File name with extension (e.g. `Index.tmpl`)
    pub name: String,

    /// Path below the views root, `/`-separated (e.g. `Home/Index.tmpl`)
    pub relative_path: String,

    /// Views root name joined with the relative path (e.g. `Views/Home/Index.tmpl`)
    pub logical_path: String,

    /// Raw template source
    pub content: String,

    /// Fragments are only ever included by other pages
    pub is_fragment: bool,
}

impl PageDescriptor {
    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// Directory of the page below the views root, empty at the top level.
    pub fn directory(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(pos) => &self.relative_path[..pos],
            None => "",
        }
    }
}

/// Scanner over a views directory.
#[derive(Debug, Clone)]
pub struct ViewScanner {
    root: PathBuf,
    extensions: Vec<String>,
    fragment_prefix: String,
}

impl ViewScanner {
    /// Create a scanner for `.tmpl` templates under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["tmpl".to_string()],
            fragment_prefix: FRAGMENT_PREFIX.to_string(),
        }
    }

    /// Replace the recognized template extensions (without the leading dot).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_fragment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fragment_prefix = prefix.into();
        self
    }

    /// Start a scan. Every call walks the tree afresh.
    ///
    /// Errors from the walk itself (unreadable directories, unreadable files)
    /// surface as items of the returned iterator; the caller decides to stop.
    pub fn scan(&self) -> Result<ViewScan<'_>, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::NotFound(self.root.display().to_string()));
        }

        let root_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| {
                fs::canonicalize(&self.root)
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            })
            .unwrap_or_default();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by(files_before_directories)
            .into_iter();

        Ok(ViewScan {
            scanner: self,
            root_name,
            walker,
        })
    }

    fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    fn describe(&self, root_name: &str, path: &Path) -> Result<PageDescriptor, ScanError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let relative_path = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let logical_path = if root_name.is_empty() {
            relative_path.clone()
        } else {
            format!("{}/{}", root_name, relative_path)
        };

        // Legacy encodings decode with replacement characters.
        let bytes = fs::read(path).map_err(|e| ScanError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let is_fragment = name.starts_with(&self.fragment_prefix);

        Ok(PageDescriptor {
            name,
            relative_path,
            logical_path,
            content,
            is_fragment,
        })
    }
}

fn files_before_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Lazy sequence of pages produced by [`ViewScanner::scan`].
pub struct ViewScan<'a> {
    scanner: &'a ViewScanner,
    root_name: String,
    walker: walkdir::IntoIter,
}

impl Iterator for ViewScan<'_> {
    type Item = Result<PageDescriptor, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(ScanError::Walk(e))),
            };

            if !entry.file_type().is_file() || !self.scanner.is_template(entry.path()) {
                continue;
            }

            return Some(self.scanner.describe(&self.root_name, entry.path()));
        }
    }
}

/// Errors that can occur while scanning views.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Views directory not found: {0}")]
    NotFound(String),

    #[error("Failed to walk views directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read view {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scans_nested_views_depth_first() {
        let temp = tempdir().unwrap();
        let views = temp.path().join("Views");

        write(&views.join("Home/Index.tmpl"), "home");
        write(&views.join("Home/_Partial.tmpl"), "partial");
        write(&views.join("About.tmpl"), "about");
        write(&views.join("Shared/_Layout.tmpl"), "layout");
        write(&views.join("Home/notes.txt"), "ignored");

        let scanner = ViewScanner::new(&views);
        let pages: Vec<PageDescriptor> = scanner.scan().unwrap().map(|p| p.unwrap()).collect();

        let logical: Vec<&str> = pages.iter().map(|p| p.logical_path.as_str()).collect();
        assert_eq!(
            logical,
            vec![
                "Views/About.tmpl",
                "Views/Home/Index.tmpl",
                "Views/Home/_Partial.tmpl",
                "Views/Shared/_Layout.tmpl",
            ]
        );

        let index = &pages[1];
        assert_eq!(index.name, "Index.tmpl");
        assert_eq!(index.relative_path, "Home/Index.tmpl");
        assert_eq!(index.content, "home");
        assert_eq!(index.stem(), "Index");
        assert_eq!(index.directory(), "Home");
        assert!(!index.is_fragment);

        assert!(pages[2].is_fragment);
        assert_eq!(pages[0].directory(), "");
    }

    #[test]
    fn scan_is_restartable() {
        let temp = tempdir().unwrap();
        let views = temp.path().join("Views");
        write(&views.join("a.tmpl"), "a");
        write(&views.join("sub/b.tmpl"), "b");

        let scanner = ViewScanner::new(&views);
        let first: Vec<_> = scanner.scan().unwrap().map(|p| p.unwrap()).collect();
        let second: Vec<_> = scanner.scan().unwrap().map(|p| p.unwrap()).collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn honors_custom_extensions_and_prefix() {
        let temp = tempdir().unwrap();
        let views = temp.path().join("pages");
        write(&views.join("index.HTML"), "index");
        write(&views.join("partial-nav.html"), "nav");
        write(&views.join("index.tmpl"), "not a template here");

        let scanner = ViewScanner::new(&views)
            .with_extensions([".html"])
            .with_fragment_prefix("partial-");
        let pages: Vec<_> = scanner.scan().unwrap().map(|p| p.unwrap()).collect();

        assert_eq!(pages.len(), 2);
        assert!(!pages[0].is_fragment);
        assert!(pages[1].is_fragment);
    }

    #[test]
    fn decodes_legacy_encodings_lossily() {
        let temp = tempdir().unwrap();
        let views = temp.path().join("Views");
        fs::create_dir_all(views.join("Home")).unwrap();
        fs::write(views.join("Home/Legacy.tmpl"), b"caf\xe9").unwrap();

        let pages: Vec<_> = ViewScanner::new(&views)
            .scan()
            .unwrap()
            .map(|p| p.unwrap())
            .collect();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content, "caf\u{FFFD}");
    }

    #[cfg(unix)]
    #[test]
    fn deep_walk_errors_end_up_in_the_sequence() {
        let temp = tempdir().unwrap();
        let views = temp.path().join("Views");
        write(&views.join("Home/Index.tmpl"), "home");
        std::os::unix::fs::symlink(&views, views.join("Home/loop")).unwrap();

        let results: Vec<_> = ViewScanner::new(&views).scan().unwrap().collect();

        assert!(matches!(&results[0], Ok(page) if page.name == "Index.tmpl"));
        assert!(results.iter().any(|r| matches!(r, Err(ScanError::Walk(_)))));
    }

    #[test]
    fn missing_root_is_not_found() {
        let temp = tempdir().unwrap();
        let scanner = ViewScanner::new(temp.path().join("nope"));

        assert!(matches!(scanner.scan(), Err(ScanError::NotFound(_))));
    }
}

//! Bundles assembled by concatenating source files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use frozen_source::FilePattern;

use crate::traits::{BundleContent, BundleError, BundleProducer};

/// What a bundle contains; decides how its files are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Script,
    Style,
}

impl BundleKind {
    /// Separator placed between constituent files.
    pub fn separator(self) -> &'static str {
        match self {
            // Guards against files that end without a semicolon.
            BundleKind::Script => ";\n",
            BundleKind::Style => "\n",
        }
    }
}

impl FromStr for BundleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "script" | "js" => Ok(BundleKind::Script),
            "style" | "css" => Ok(BundleKind::Style),
            other => Err(format!("unknown bundle kind: {}", other)),
        }
    }
}

/// A bundle built from a list of files below a base directory.
///
/// Entries are paths relative to the base. The file name component of an
/// entry may contain `*` or `?`, in which case it expands to every matching
/// file in that directory, in name order. A file named by more than one entry
/// is included once, at its first position.
#[derive(Debug, Clone)]
pub struct FileBundle {
    kind: BundleKind,
    base: PathBuf,
    entries: Vec<String>,
}

impl FileBundle {
    pub fn new<I, S>(kind: BundleKind, base: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            base: base.into(),
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    /// Resolve entries to concrete files.
    pub fn files(&self) -> Result<Vec<PathBuf>, BundleError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for entry in &self.entries {
            for file in self.expand(entry)? {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        Ok(files)
    }

    fn expand(&self, entry: &str) -> Result<Vec<PathBuf>, BundleError> {
        let path = self.base.join(entry.trim_start_matches(['~', '/']));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !FilePattern::is_wildcard(&name) {
            if !path.is_file() {
                return Err(BundleError::MissingFile(path.display().to_string()));
            }
            return Ok(vec![path]);
        }

        let pattern = FilePattern::new(&name)?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let read_dir = fs::read_dir(dir).map_err(|e| BundleError::Read {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut matched = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| BundleError::Read {
                path: dir.display().to_string(),
                source: e,
            })?;
            let file_name = item.file_name().to_string_lossy().into_owned();
            if item.path().is_file() && pattern.matches(&file_name) {
                matched.push(item.path());
            }
        }
        matched.sort();

        if matched.is_empty() {
            tracing::warn!("Bundle pattern {} matched no files", path.display());
        }

        Ok(matched)
    }
}

impl BundleProducer for FileBundle {
    fn produce(&self) -> Result<BundleContent, BundleError> {
        let files = self.files()?;

        let parts = files
            .iter()
            .map(|file| {
                fs::read_to_string(file).map_err(|e| BundleError::Read {
                    path: file.display().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BundleContent {
            text: parts.join(self.kind.separator()),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn concatenates_styles_in_entry_order() {
        let temp = tempdir().unwrap();
        let content = temp.path().join("Content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("reset.css"), "*{margin:0}").unwrap();
        fs::write(content.join("site.css"), "body{}").unwrap();

        let bundle = FileBundle::new(
            BundleKind::Style,
            temp.path(),
            ["Content/site.css", "Content/reset.css"],
        );
        let produced = bundle.produce().unwrap();

        assert_eq!(produced.text, "body{}\n*{margin:0}");
        assert_eq!(
            produced.files,
            vec![content.join("site.css"), content.join("reset.css")]
        );
    }

    #[test]
    fn expands_wildcards_once_per_file() {
        let temp = tempdir().unwrap();
        let scripts = temp.path().join("Scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join("app.js"), "app()").unwrap();
        fs::write(scripts.join("b.js"), "b()").unwrap();
        fs::write(scripts.join("a.js"), "a()").unwrap();
        fs::write(scripts.join("readme.txt"), "no").unwrap();

        let bundle = FileBundle::new(
            BundleKind::Script,
            temp.path(),
            ["~/Scripts/app.js", "~/Scripts/*.js"],
        );
        let produced = bundle.produce().unwrap();

        assert_eq!(produced.text, "app();\na();\nb()");
        assert_eq!(produced.files.len(), 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempdir().unwrap();
        let bundle = FileBundle::new(BundleKind::Style, temp.path(), ["Content/none.css"]);

        assert!(matches!(
            bundle.produce(),
            Err(BundleError::MissingFile(_))
        ));
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("script".parse::<BundleKind>(), Ok(BundleKind::Script));
        assert_eq!("CSS".parse::<BundleKind>(), Ok(BundleKind::Style));
        assert!("image".parse::<BundleKind>().is_err());
    }
}

//! Binary asset mirroring.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use frozen_source::PatternSet;

use crate::builder::{io_error, BuildError};

/// Copies files matching a pattern set from a source tree into the output.
///
/// The directory structure is preserved. A destination directory is only
/// created when a file is copied into it, so source directories without
/// matches leave no trace. Existing destination files are overwritten.
#[derive(Debug, Clone)]
pub struct AssetMirror {
    patterns: PatternSet,
}

impl AssetMirror {
    pub fn new(patterns: PatternSet) -> Self {
        Self { patterns }
    }

    /// Mirror `source` into `dest`, returning the number of files copied.
    pub fn mirror(&self, source: &Path, dest: &Path) -> Result<usize, BuildError> {
        if !source.is_dir() {
            return Err(BuildError::MissingSource {
                kind: "Assets",
                path: source.display().to_string(),
            });
        }

        let copies = self.collect(source, dest)?;

        let dirs: BTreeSet<&Path> = copies.iter().filter_map(|(_, to)| to.parent()).collect();
        for dir in dirs {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }

        copies.par_iter().try_for_each(|(from, to)| {
            tracing::debug!("Copying {}", from.display());
            fs::copy(from, to).map(|_| ()).map_err(io_error(to))
        })?;

        Ok(copies.len())
    }

    fn collect(&self, source: &Path, dest: &Path) -> Result<Vec<(PathBuf, PathBuf)>, BuildError> {
        let mut copies = Vec::new();

        for entry in WalkDir::new(source)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| source.display().to_string());
                BuildError::Io {
                    path,
                    source: e.into(),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.patterns.matches(&name) {
                continue;
            }

            let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
            copies.push((entry.path().to_path_buf(), dest.join(relative)));
        }

        Ok(copies)
    }
}

//! Resource bundle materialization.

use std::fs;
use std::path::{Component, Path, PathBuf};

use frozen_bundles::{BundleDescriptor, BundleRegistry};

use crate::builder::{io_error, BuildError};

/// Writes every registered bundle into the output tree.
pub struct BundleMaterializer;

impl BundleMaterializer {
    /// Produce and write each bundle, returning the number written.
    ///
    /// Producers run afresh on every call and existing files are overwritten.
    pub fn materialize(registry: &BundleRegistry, output_dir: &Path) -> Result<usize, BuildError> {
        for bundle in registry.iter() {
            let path = Self::output_path(bundle, output_dir)?;

            let content = bundle.produce().map_err(|e| BuildError::Bundle {
                path: bundle.virtual_path().to_string(),
                source: e,
            })?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }

            fs::write(&path, content.text).map_err(io_error(&path))?;

            tracing::debug!(
                "Wrote bundle {} from {} files",
                bundle.virtual_path(),
                content.files.len()
            );
        }

        Ok(registry.len())
    }

    /// Destination of a bundle: its virtual path below the output directory.
    pub fn output_path(bundle: &BundleDescriptor, output_dir: &Path) -> Result<PathBuf, BuildError> {
        let relative = Path::new(bundle.relative_path());

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(BuildError::InvalidPath(bundle.virtual_path().to_string()));
        }

        Ok(output_dir.join(relative))
    }
}

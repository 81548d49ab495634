//! Trait definitions for bundle producers.

use std::path::PathBuf;

use frozen_source::PatternError;

/// Text of a bundle together with the files it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleContent {
    /// Combined bundle text
    pub text: String,

    /// Constituent source files, in bundle order
    pub files: Vec<PathBuf>,
}

impl BundleContent {
    /// Content that was not assembled from files on disk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
        }
    }
}

/// Errors that can occur while producing a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Bundle already registered: {0}")]
    Duplicate(String),

    #[error("Bundle source file not found: {0}")]
    MissingFile(String),

    #[error("Failed to read bundle source {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid bundle file pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("Bundle producer failed: {0}")]
    Produce(String),
}

/// Capability that yields a bundle's content.
///
/// Producers are invoked once per build; nothing is cached between builds.
pub trait BundleProducer: Send + Sync {
    fn produce(&self) -> Result<BundleContent, BundleError>;
}

/// Producer backed by a closure. See [`from_fn`].
pub struct FnProducer<F>(F);

/// Wrap a closure as a [`BundleProducer`].
pub fn from_fn<F>(f: F) -> FnProducer<F>
where
    F: Fn() -> Result<BundleContent, BundleError> + Send + Sync,
{
    FnProducer(f)
}

impl<F> BundleProducer for FnProducer<F>
where
    F: Fn() -> Result<BundleContent, BundleError> + Send + Sync,
{
    fn produce(&self) -> Result<BundleContent, BundleError> {
        (self.0)()
    }
}

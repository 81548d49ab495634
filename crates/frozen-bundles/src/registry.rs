//! Bundle registry.
//!
//! Holds the bundles a host application declares, in registration order, keyed
//! by virtual path. Virtual paths use `~/` to denote the application root, as
//! in `~/bundles/site.css`.

use std::fmt;
use std::sync::Arc;

use crate::traits::{BundleContent, BundleError, BundleProducer};

/// Marker at the start of a virtual path denoting the application root.
pub const ROOT_MARKER: char = '~';

/// A registered bundle.
#[derive(Clone)]
pub struct BundleDescriptor {
    virtual_path: String,
    producer: Arc<dyn BundleProducer>,
}

impl BundleDescriptor {
    pub fn new(virtual_path: impl Into<String>, producer: impl BundleProducer + 'static) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            producer: Arc::new(producer),
        }
    }

    /// Virtual path as registered (e.g. `~/bundles/site.css`).
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Virtual path with the root marker and leading separators removed
    /// (e.g. `bundles/site.css`).
    pub fn relative_path(&self) -> &str {
        self.virtual_path
            .trim_start_matches(ROOT_MARKER)
            .trim_start_matches(['/', '\\'])
    }

    /// Invoke the producer.
    pub fn produce(&self) -> Result<BundleContent, BundleError> {
        self.producer.produce()
    }
}

impl fmt::Debug for BundleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleDescriptor")
            .field("virtual_path", &self.virtual_path)
            .finish_non_exhaustive()
    }
}

/// A registry of bundles.
#[derive(Debug, Clone, Default)]
pub struct BundleRegistry {
    bundles: Vec<BundleDescriptor>,
}

impl BundleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle. Virtual paths compare case-insensitively.
    pub fn register(
        &mut self,
        virtual_path: impl Into<String>,
        producer: impl BundleProducer + 'static,
    ) -> Result<(), BundleError> {
        let descriptor = BundleDescriptor::new(virtual_path, producer);

        if self.get(descriptor.virtual_path()).is_some() {
            return Err(BundleError::Duplicate(descriptor.virtual_path.clone()));
        }

        tracing::debug!("Registered bundle {}", descriptor.virtual_path());
        self.bundles.push(descriptor);
        Ok(())
    }

    /// Look up a bundle by virtual path.
    pub fn get(&self, virtual_path: &str) -> Option<&BundleDescriptor> {
        self.bundles
            .iter()
            .find(|b| b.virtual_path.eq_ignore_ascii_case(virtual_path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BundleDescriptor> {
        self.bundles.iter()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::from_fn;

    #[test]
    fn strips_root_marker_from_virtual_path() {
        let empty = || from_fn(|| Ok(BundleContent::text("")));

        let bundle = BundleDescriptor::new("~/bundles/app.css", empty());
        assert_eq!(bundle.relative_path(), "bundles/app.css");

        let bare = BundleDescriptor::new("/scripts/app.js", empty());
        assert_eq!(bare.relative_path(), "scripts/app.js");
    }

    #[test]
    fn keeps_registration_order() {
        let mut registry = BundleRegistry::new();
        registry
            .register("~/bundles/b.js", from_fn(|| Ok(BundleContent::text("b"))))
            .unwrap();
        registry
            .register("~/bundles/a.js", from_fn(|| Ok(BundleContent::text("a"))))
            .unwrap();

        let paths: Vec<&str> = registry.iter().map(|b| b.virtual_path()).collect();
        assert_eq!(paths, vec!["~/bundles/b.js", "~/bundles/a.js"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejects_duplicate_paths() {
        let mut registry = BundleRegistry::new();
        registry
            .register("~/bundles/app.css", from_fn(|| Ok(BundleContent::text(""))))
            .unwrap();

        let result =
            registry.register("~/Bundles/App.css", from_fn(|| Ok(BundleContent::text(""))));

        assert!(matches!(result, Err(BundleError::Duplicate(_))));
    }

    #[test]
    fn invokes_producer_on_every_call() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let bundle = BundleDescriptor::new(
            "~/bundles/app.js",
            from_fn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(BundleContent::text(format!("build {}", n)))
            }),
        );

        assert_eq!(bundle.produce().unwrap().text, "build 1");
        assert_eq!(bundle.produce().unwrap().text, "build 2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

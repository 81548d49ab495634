//! Resource bundles for frozen.
//!
//! A bundle is a named, pre-aggregated resource (combined scripts or styles)
//! whose text is produced on demand rather than read from a single file. The
//! registry maps each bundle's virtual path to its producer.

pub mod file;
pub mod registry;
pub mod traits;

pub use file::{BundleKind, FileBundle};
pub use registry::{BundleDescriptor, BundleRegistry};
pub use traits::{from_fn, BundleContent, BundleError, BundleProducer, FnProducer};

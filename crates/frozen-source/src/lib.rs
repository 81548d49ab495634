//! Source tree discovery for frozen.
//!
//! Walks the view template tree of a host application and matches file names
//! against glob-style patterns for asset mirroring and bundle expansion.

pub mod pattern;
pub mod views;

pub use pattern::{FilePattern, PatternError, PatternSet};
pub use views::{PageDescriptor, ScanError, ViewScan, ViewScanner, FRAGMENT_PREFIX};

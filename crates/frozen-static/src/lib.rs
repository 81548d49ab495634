//! Static site materializer for frozen.
//!
//! Renders every page of a running application by requesting it over HTTP,
//! rewrites root-relative paths to page-relative ones, and mirrors the pages,
//! resource bundles and binary assets into an output directory that can be
//! served without the application.

pub mod assets;
pub mod builder;
pub mod bundles;
pub mod fetch;
pub mod log;
pub mod render;
pub mod rewrite;
pub mod routes;

#[cfg(test)]
mod test_support;

pub use assets::AssetMirror;
pub use builder::{BuildConfig, BuildError, FailurePolicy, StaticBuilder};
pub use bundles::BundleMaterializer;
pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use log::{BuildLog, PageFailure, Stage, StageTiming};
pub use render::{PageRenderer, RenderedPage};
pub use rewrite::RootPathRewriter;
pub use routes::{PageRoute, RouteTemplate, UrlResolver};

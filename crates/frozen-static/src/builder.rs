//! Static site builder.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use frozen_bundles::{BundleError, BundleRegistry};
use frozen_source::{PageDescriptor, PatternError, PatternSet, ScanError, ViewScanner};

use crate::assets::AssetMirror;
use crate::bundles::BundleMaterializer;
use crate::fetch::{FetchError, PageFetcher};
use crate::log::{BuildLog, PageFailure, Stage};
use crate::render::PageRenderer;
use crate::routes::{RouteTemplate, UrlResolver};

/// What to do when a page fails to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the build at the first failed page
    #[default]
    Abort,

    /// Render the remaining pages and report failures in the build log
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// View template source directory
    pub views_dir: PathBuf,

    /// Binary asset source directory
    pub assets_dir: PathBuf,

    /// Output directory, wiped at the start of every build
    pub output_dir: PathBuf,

    /// File name patterns of assets to mirror
    pub asset_patterns: Vec<String>,

    /// Template file extensions
    pub view_extensions: Vec<String>,

    /// Name prefix marking fragments
    pub fragment_prefix: String,

    /// Extension of rendered pages
    pub page_extension: String,

    /// Maximum pages rendered at once
    pub concurrency: usize,

    pub failure_policy: FailurePolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            views_dir: PathBuf::from("Views"),
            assets_dir: PathBuf::from("Content"),
            output_dir: PathBuf::from("output"),
            asset_patterns: vec!["*.png".into(), "*.gif".into(), "*.jpg".into()],
            view_extensions: vec!["tmpl".into()],
            fragment_prefix: frozen_source::FRAGMENT_PREFIX.to_string(),
            page_extension: "html".to_string(),
            concurrency: 4,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{kind} directory not found: {path}")]
    MissingSource { kind: &'static str, path: String },

    #[error("Output directory {output} would delete source directory {source_dir}")]
    UnsafeOutput { output: String, source_dir: String },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Invalid asset pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("Failed to build bundle {path}: {source}")]
    Bundle { path: String, source: BundleError },

    #[error("Failed to render {page}: {source}")]
    Render { page: String, source: FetchError },

    #[error("Failed to write output: {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Path escapes the output directory: {0}")]
    InvalidPath(String),

    #[error("{first} and {second} both render to {output}")]
    OutputCollision {
        first: String,
        second: String,
        output: String,
    },

    #[error("Invalid root path: {0}")]
    Rewrite(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> BuildError + '_ {
    move |e| BuildError::Io {
        path: path.display().to_string(),
        source: e,
    }
}

/// Static site builder.
///
/// Runs four stages in order: wipe the output directory, mirror assets,
/// materialize bundles, render views. Any error ends the build and leaves the
/// output as far as it got; the next build starts from a clean slate.
pub struct StaticBuilder {
    config: BuildConfig,
    bundles: Arc<BundleRegistry>,
    resolver: Arc<dyn UrlResolver>,
    fetcher: Arc<dyn PageFetcher>,
}

impl StaticBuilder {
    /// Create a builder with no bundles and the default route template.
    pub fn new(config: BuildConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            bundles: Arc::new(BundleRegistry::new()),
            resolver: Arc::new(RouteTemplate::default()),
            fetcher,
        }
    }

    pub fn with_bundles(mut self, bundles: Arc<BundleRegistry>) -> Self {
        self.bundles = bundles;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildLog, BuildError> {
        let start = Instant::now();

        self.check_sources()?;

        let mut log = BuildLog::new(&self.config.output_dir);

        tracing::info!("{}...", Stage::Cleanup);
        let watch = Instant::now();
        self.cleanup()?;
        log.output_dir = fs::canonicalize(&self.config.output_dir)
            .unwrap_or_else(|_| self.config.output_dir.clone());
        finish_stage(&mut log, Stage::Cleanup, 0, watch);

        tracing::info!("{}...", Stage::CopyAssets);
        let watch = Instant::now();
        let assets = self.copy_assets().await?;
        finish_stage(&mut log, Stage::CopyAssets, assets, watch);

        tracing::info!("{}...", Stage::BuildBundles);
        let watch = Instant::now();
        let bundles = BundleMaterializer::materialize(&self.bundles, &self.config.output_dir)?;
        finish_stage(&mut log, Stage::BuildBundles, bundles, watch);

        tracing::info!("{}...", Stage::BuildViews);
        let watch = Instant::now();
        let pages = self.build_views(&mut log).await?;
        finish_stage(&mut log, Stage::BuildViews, pages, watch);

        log.finish(start.elapsed());

        tracing::info!(
            "Built {} pages, {} bundles and {} assets in {}ms",
            pages,
            bundles,
            assets,
            start.elapsed().as_millis()
        );

        Ok(log)
    }

    /// Refuse to start when a source is missing or lives inside the output.
    fn check_sources(&self) -> Result<(), BuildError> {
        let sources = [
            ("Views", &self.config.views_dir),
            ("Assets", &self.config.assets_dir),
        ];

        for (kind, dir) in sources {
            if !dir.is_dir() {
                return Err(BuildError::MissingSource {
                    kind,
                    path: dir.display().to_string(),
                });
            }
        }

        let Ok(output) = fs::canonicalize(&self.config.output_dir) else {
            return Ok(());
        };

        for (_, dir) in sources {
            let dir = fs::canonicalize(dir).map_err(io_error(dir))?;
            if dir.starts_with(&output) {
                return Err(BuildError::UnsafeOutput {
                    output: output.display().to_string(),
                    source_dir: dir.display().to_string(),
                });
            }
        }

        Ok(())
    }

    fn cleanup(&self) -> Result<(), BuildError> {
        let output = &self.config.output_dir;

        if output.exists() {
            fs::remove_dir_all(output).map_err(io_error(output))?;
        }

        fs::create_dir_all(output).map_err(io_error(output))
    }

    /// Mirror assets into a directory named after the asset source. Copying
    /// runs on the blocking pool.
    async fn copy_assets(&self) -> Result<usize, BuildError> {
        let source = &self.config.assets_dir;
        let name = fs::canonicalize(source)
            .map_err(io_error(source))?
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        let dest = self.config.output_dir.join(name);
        fs::create_dir_all(&dest).map_err(io_error(&dest))?;

        let mirror = AssetMirror::new(PatternSet::new(&self.config.asset_patterns)?);
        let source = source.clone();

        tokio::task::spawn_blocking(move || mirror.mirror(&source, &dest))
            .await
            .map_err(|e| BuildError::Task(e.to_string()))?
    }

    /// Render every non-fragment view, at most `concurrency` at a time.
    async fn build_views(&self, log: &mut BuildLog) -> Result<usize, BuildError> {
        let scanner = ViewScanner::new(&self.config.views_dir)
            .with_extensions(self.config.view_extensions.iter().cloned())
            .with_fragment_prefix(self.config.fragment_prefix.clone());

        let renderer = Arc::new(PageRenderer::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.resolver),
            &self.config.output_dir,
            &self.config.page_extension,
        )?);

        let mut pages = Vec::new();
        for page in scanner.scan()? {
            let page = page?;
            if page.is_fragment {
                tracing::debug!("Skipping fragment {}", page.logical_path);
                continue;
            }
            pages.push(page);
        }

        check_collisions(&pages, &renderer)?;

        let total = pages.len();
        let limit = self.config.concurrency.max(1);
        let mut queue = pages.into_iter().enumerate();
        let mut tasks = JoinSet::new();
        let mut failures: Vec<(usize, PageFailure)> = Vec::new();
        let mut rendered = 0;

        loop {
            while tasks.len() < limit {
                let Some((index, page)) = queue.next() else {
                    break;
                };
                let renderer = Arc::clone(&renderer);
                tasks.spawn(async move {
                    let result = renderer.render(&page).await;
                    (index, page.logical_path, result)
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (index, logical_path, result) =
                joined.map_err(|e| BuildError::Task(e.to_string()))?;

            match result {
                Ok(_) => rendered += 1,
                Err(e) if self.config.failure_policy == FailurePolicy::Continue => {
                    tracing::warn!("{}", e);
                    failures.push((
                        index,
                        PageFailure {
                            page: logical_path,
                            error: e.to_string(),
                        },
                    ));
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        log.failures.extend(failures.into_iter().map(|(_, f)| f));

        if !log.failures.is_empty() {
            tracing::warn!("{} of {} pages failed to render", log.failures.len(), total);
        }

        Ok(rendered)
    }
}

fn finish_stage(log: &mut BuildLog, stage: Stage, items: usize, started: Instant) {
    let elapsed = started.elapsed();
    tracing::info!("{} completed in {}ms", stage, elapsed.as_millis());
    log.record(stage, items, elapsed);
}

/// Two sources that differ only in case would overwrite each other.
fn check_collisions(pages: &[PageDescriptor], renderer: &PageRenderer) -> Result<(), BuildError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();

    for page in pages {
        let output = renderer.output_path(page);
        if let Some(first) = seen.get(&output) {
            return Err(BuildError::OutputCollision {
                first: first.to_string(),
                second: page.logical_path.clone(),
                output: output.display().to_string(),
            });
        }
        seen.insert(output, &page.logical_path);
    }

    Ok(())
}

//! Static site build command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use frozen_static::{FailurePolicy, HttpFetcher, StaticBuilder};

use crate::config::ConfigFile;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub origin: Option<String>,
    pub jobs: Option<usize>,
    pub continue_on_error: bool,
}

/// Run the build command.
pub async fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    let file_config = ConfigFile::load(config_path)?;

    let mut config = file_config.build_config()?;
    if let Some(output) = overrides.output {
        config.output_dir = output;
    }
    if let Some(jobs) = overrides.jobs {
        config.concurrency = jobs;
    }
    if overrides.continue_on_error {
        config.failure_policy = FailurePolicy::Continue;
    }

    let origin = overrides.origin.unwrap_or(file_config.render.origin.clone());
    tracing::info!("Building static site from {}...", origin);

    let fetcher = HttpFetcher::new(&origin, file_config.timeout())
        .with_context(|| format!("Cannot fetch pages from {}", origin))?;
    let bundles = file_config.bundle_registry()?;

    let log = StaticBuilder::new(config, Arc::new(fetcher))
        .with_bundles(Arc::new(bundles))
        .with_resolver(Arc::new(file_config.routes()))
        .build()
        .await?;

    print!("{}", log);

    if !log.failures.is_empty() {
        anyhow::bail!(
            "{} pages failed to render ({} rendered)",
            log.failures.len(),
            log.pages()
        );
    }

    tracing::info!("Output: {}", log.output_dir.display());

    Ok(())
}

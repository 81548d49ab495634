//! Page rendering through the running application.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

use frozen_source::PageDescriptor;

use crate::builder::{io_error, BuildError};
use crate::fetch::PageFetcher;
use crate::rewrite::RootPathRewriter;
use crate::routes::{PageRoute, UrlResolver};

/// A page as written to disk.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub output_path: PathBuf,
    pub html: String,
}

/// Renders pages by requesting them from the application.
pub struct PageRenderer {
    fetcher: Arc<dyn PageFetcher>,
    resolver: Arc<dyn UrlResolver>,
    rewriter: RootPathRewriter,
    output_dir: PathBuf,
    extension: String,
}

impl PageRenderer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        resolver: Arc<dyn UrlResolver>,
        output_dir: impl Into<PathBuf>,
        extension: &str,
    ) -> Result<Self, BuildError> {
        let root = resolver.root_path();
        let rewriter =
            RootPathRewriter::new(&root).map_err(|e| BuildError::Rewrite(e.to_string()))?;

        Ok(Self {
            fetcher,
            resolver,
            rewriter,
            output_dir: output_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    /// Where a page lands: its logical path with the page extension,
    /// lower-cased, below the output directory.
    pub fn output_path(&self, page: &PageDescriptor) -> PathBuf {
        output_path(page, &self.output_dir, &self.extension)
    }

    /// Fetch, rewrite and write one page.
    pub async fn render(&self, page: &PageDescriptor) -> Result<RenderedPage, BuildError> {
        let output_path = self.output_path(page);

        match fs::remove_file(&output_path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(io_error(&output_path)(e));
            }
            _ => {}
        }

        let request_path = self.resolver.page_path(&PageRoute::for_page(page));
        tracing::debug!("Rendering {} from {}", page.logical_path, request_path);

        let body = self
            .fetcher
            .fetch(&request_path)
            .await
            .map_err(|e| BuildError::Render {
                page: page.logical_path.clone(),
                source: e,
            })?;

        let html = self.rewriter.rewrite(&body).into_owned();

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }
        fs::write(&output_path, &html)
            .await
            .map_err(io_error(&output_path))?;

        Ok(RenderedPage { output_path, html })
    }
}

fn output_path(page: &PageDescriptor, output_dir: &Path, extension: &str) -> PathBuf {
    let relative = Path::new(&page.logical_path).with_extension(extension);
    output_dir.join(relative.to_string_lossy().to_lowercase())
}

//! Configuration file (frozen.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use frozen_bundles::{BundleKind, BundleRegistry, FileBundle};
use frozen_static::{BuildConfig, FailurePolicy, RouteTemplate};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub bundles: Vec<BundleEntry>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_views")]
    pub views: String,
    #[serde(default = "default_assets")]
    pub assets: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_page_route")]
    pub page: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_on_error")]
    pub on_error: String,
}

/// A `[[bundles]]` entry.
#[derive(Debug, Deserialize)]
pub struct BundleEntry {
    pub path: String,
    pub kind: String,
    #[serde(default)]
    pub files: Vec<String>,
}

fn default_views() -> String {
    "Views".to_string()
}
fn default_assets() -> String {
    "Content".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_extensions() -> Vec<String> {
    vec!["tmpl".to_string()]
}
fn default_patterns() -> Vec<String> {
    vec!["*.png".to_string(), "*.gif".to_string(), "*.jpg".to_string()]
}
fn default_root() -> String {
    "/".to_string()
}
fn default_page_route() -> String {
    RouteTemplate::DEFAULT_PAGE.to_string()
}
fn default_origin() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_concurrency() -> usize {
    4
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_on_error() -> String {
    "abort".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            views: default_views(),
            assets: default_assets(),
            output: default_output(),
            extensions: default_extensions(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            page: default_page_route(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            on_error: default_on_error(),
        }
    }
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self {
                base_dir,
                ..Default::default()
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.base_dir = base_dir;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.site.output)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.render.timeout_secs)
    }

    pub fn build_config(&self) -> Result<BuildConfig> {
        let failure_policy: FailurePolicy = self
            .render
            .on_error
            .parse()
            .map_err(|e| anyhow!("{}", e))?;

        Ok(BuildConfig {
            views_dir: self.resolve(&self.site.views),
            assets_dir: self.resolve(&self.site.assets),
            output_dir: self.output_dir(),
            asset_patterns: self.assets.patterns.clone(),
            view_extensions: self.site.extensions.clone(),
            concurrency: self.render.concurrency,
            failure_policy,
            ..Default::default()
        })
    }

    pub fn routes(&self) -> RouteTemplate {
        RouteTemplate::new(&self.routes.root, self.routes.page.clone())
    }

    pub fn bundle_registry(&self) -> Result<BundleRegistry> {
        let mut registry = BundleRegistry::new();

        for entry in &self.bundles {
            let kind: BundleKind = entry
                .kind
                .parse()
                .map_err(|e| anyhow!("Bundle {}: {}", entry.path, e))?;
            let bundle = FileBundle::new(kind, &self.base_dir, entry.files.iter().cloned());
            registry.register(entry.path.clone(), bundle)?;
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = ConfigFile::load(&temp.path().join("frozen.toml")).unwrap();

        assert_eq!(config.site.views, "Views");
        assert_eq!(config.assets.patterns, vec!["*.png", "*.gif", "*.jpg"]);
        assert_eq!(config.render.concurrency, 4);
        assert_eq!(config.output_dir(), temp.path().join("output"));
    }

    #[test]
    fn parses_full_config() {
        let config = ConfigFile::parse(
            r#"
[site]
views = "src/Views"
output = "dist"

[routes]
root = "/app/"
page = "{root}pages/{id}"

[render]
origin = "http://localhost:8080"
on_error = "continue"
concurrency = 2

[[bundles]]
path = "~/bundles/site.css"
kind = "style"
files = ["Content/site.css"]
"#,
        )
        .unwrap();

        let build = config.build_config().unwrap();
        assert_eq!(build.views_dir, PathBuf::from("src/Views"));
        assert_eq!(build.assets_dir, PathBuf::from("Content"));
        assert_eq!(build.output_dir, PathBuf::from("dist"));
        assert_eq!(build.failure_policy, FailurePolicy::Continue);
        assert_eq!(build.concurrency, 2);
        assert_eq!(config.routes(), RouteTemplate::new("/app/", "{root}pages/{id}"));
        assert_eq!(config.bundles.len(), 1);
    }

    #[test]
    fn builds_bundle_registry() {
        let config = ConfigFile::parse(
            r#"
[[bundles]]
path = "~/bundles/app.js"
kind = "script"
files = ["Scripts/*.js"]
"#,
        )
        .unwrap();

        let registry = config.bundle_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("~/bundles/app.js").is_some());
    }

    #[test]
    fn rejects_unknown_values() {
        let bad_policy = ConfigFile::parse("[render]\non_error = \"retry\"").unwrap();
        assert!(bad_policy.build_config().is_err());

        let bad_kind = ConfigFile::parse("[[bundles]]\npath = \"~/x\"\nkind = \"image\"").unwrap();
        assert!(bad_kind.bundle_registry().is_err());

        assert!(ConfigFile::parse("[site\nviews = 1").is_err());
    }
}

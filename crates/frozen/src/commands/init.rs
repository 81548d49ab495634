//! Initialize a site in the current project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing frozen...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    let root = match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    write_file(config_path, DEFAULT_CONFIG, yes)?;
    write_file(&root.join("Views/Home/Index.tmpl"), DEFAULT_INDEX, yes)?;
    write_file(&root.join("Views/Shared/_Layout.tmpl"), DEFAULT_LAYOUT, yes)?;

    let content_dir = root.join("Content");
    if !content_dir.exists() {
        fs::create_dir_all(&content_dir).context("Failed to create Content directory")?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Start your application, then run 'frozen build'.");

    Ok(())
}

fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Frozen Configuration

[site]
# Page templates; one page is rendered per file
views = "Views"

# Static assets mirrored into the output
assets = "Content"

# Output directory, wiped on every build
output = "output"

# Template extensions
extensions = ["tmpl"]

[assets]
patterns = ["*.png", "*.gif", "*.jpg"]

[routes]
# Application root stripped from rendered links
root = "/"

# URL of a page; {dir} is its directory, {id} its file stem
page = "{root}{dir}/{id}"

[render]
# Running application to render pages from
origin = "http://127.0.0.1:5000"
concurrency = 4
timeout_secs = 30

# "abort" stops at the first failed page, "continue" renders the rest
on_error = "abort"

# [[bundles]]
# path = "~/bundles/site.css"
# kind = "style"
# files = ["Content/*.css"]
"#;

const DEFAULT_INDEX: &str = r#"<h1>Welcome</h1>
<p>This page is rendered at /home/index.</p>
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="/bundles/site.css">
</head>
<body>
</body>
</html>
"#;

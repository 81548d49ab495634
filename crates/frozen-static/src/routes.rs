//! URL resolution for pages.

use frozen_source::PageDescriptor;

/// The routing values a page is requested with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    /// Lower-cased file name without extension (e.g. `index`)
    pub id: String,

    /// Lower-cased directory below the views root (e.g. `home`), empty at the top level
    pub directory: String,
}

impl PageRoute {
    pub fn for_page(page: &PageDescriptor) -> Self {
        Self {
            id: page.stem().to_lowercase(),
            directory: page.directory().to_lowercase(),
        }
    }
}

/// Routing capability of the host application.
pub trait UrlResolver: Send + Sync {
    /// Request path that renders the page (e.g. `/app/home/index`).
    fn page_path(&self, route: &PageRoute) -> String;

    /// Request path of the application root (e.g. `/app/`).
    fn root_path(&self) -> String;
}

/// Resolver driven by a path template.
///
/// The template may use `{root}`, `{dir}` and `{id}`. Repeated slashes left
/// behind by an empty `{dir}` are collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    root: String,
    page: String,
}

impl RouteTemplate {
    pub const DEFAULT_PAGE: &'static str = "{root}{dir}/{id}";

    /// Create a template. `root` is normalized to start and end with `/`.
    pub fn new(root: &str, page: impl Into<String>) -> Self {
        let trimmed = root.trim_matches('/');
        let root = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        };

        Self {
            root,
            page: page.into(),
        }
    }
}

impl Default for RouteTemplate {
    fn default() -> Self {
        Self::new("/", Self::DEFAULT_PAGE)
    }
}

impl UrlResolver for RouteTemplate {
    fn page_path(&self, route: &PageRoute) -> String {
        let path = self
            .page
            .replace("{root}", &self.root)
            .replace("{dir}", &route.directory)
            .replace("{id}", &route.id);

        collapse_slashes(&path)
    }

    fn root_path(&self) -> String {
        self.root.clone()
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

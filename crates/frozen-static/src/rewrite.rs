//! Root-relative path rewriting.
//!
//! Pages rendered by the live application link to resources through the
//! application root (`"/app/content/site.css"`). Served from a plain directory
//! those links break, so every double-quoted string that starts with the root
//! is reduced to the remainder (`"content/site.css"`).
//!
//! The rewrite is lexical. It only looks at double-quoted strings and leaves
//! everything else, including a bare `"/app/"`, untouched.

use std::borrow::Cow;

use regex::Regex;

/// Rewrites quoted root-relative paths to page-relative ones.
#[derive(Debug, Clone)]
pub struct RootPathRewriter {
    pattern: Regex,
}

impl RootPathRewriter {
    /// Create a rewriter for the given root request path (e.g. `/` or `/app/`).
    pub fn new(root: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r#""{}([^"]+)""#, regex::escape(root)))?;

        Ok(Self { pattern })
    }

    /// Rewrite every match in `html`. Borrows the input when nothing matched.
    pub fn rewrite<'a>(&self, html: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(html, r#""${1}""#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrites_quoted_root_relative_paths() {
        let rewriter = RootPathRewriter::new("/app/").unwrap();
        let html = r#"<link href="/app/content/x.css" rel="stylesheet"><a href="/app/home/about">"#;

        assert_eq!(
            rewriter.rewrite(html),
            r#"<link href="content/x.css" rel="stylesheet"><a href="home/about">"#
        );
    }

    #[test]
    fn leaves_other_quoted_strings_alone() {
        let rewriter = RootPathRewriter::new("/app/").unwrap();
        let html = r#"<a href="https://example.com/app/x" title="/apple/pie" data-root="/app/">/app/y</a>"#;

        assert_eq!(rewriter.rewrite(html), html);
    }

    #[test]
    fn does_not_span_multiple_attributes() {
        let rewriter = RootPathRewriter::new("/").unwrap();
        let html = r#"<img src="/img/a.png" alt="A" class="b">"#;

        assert_eq!(
            rewriter.rewrite(html),
            r#"<img src="img/a.png" alt="A" class="b">"#
        );
    }

    #[test]
    fn escapes_regex_characters_in_root() {
        let rewriter = RootPathRewriter::new("/a.b/").unwrap();

        assert_eq!(rewriter.rewrite(r#""/a.b/x""#), r#""x""#);
        assert_eq!(rewriter.rewrite(r#""/aXb/x""#), r#""/aXb/x""#);
    }

    #[test]
    fn borrows_when_nothing_matches() {
        let rewriter = RootPathRewriter::new("/app/").unwrap();

        assert!(matches!(rewriter.rewrite("<p>plain</p>"), Cow::Borrowed(_)));
    }
}

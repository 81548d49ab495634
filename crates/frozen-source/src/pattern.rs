//! Glob-style file name patterns.
//!
//! Patterns apply to a single file name, never to a path: `*` matches any run
//! of characters and `?` matches exactly one. Matching ignores ASCII case, so
//! `*.png` also picks up `LOGO.PNG`.

use regex::Regex;

/// A compiled file name pattern such as `*.png`.
#[derive(Debug, Clone)]
pub struct FilePattern {
    regex: Regex,
}

impl FilePattern {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        if pattern.contains(['/', '\\']) {
            return Err(PatternError::Separator(pattern.to_string()));
        }

        let mut expr = String::from("(?i)^");
        let mut literal = String::new();

        for c in pattern.chars() {
            match c {
                '*' | '?' => {
                    expr.push_str(&regex::escape(&literal));
                    literal.clear();
                    expr.push_str(if c == '*' { ".*" } else { "." });
                }
                _ => literal.push(c),
            }
        }
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { regex })
    }

    /// Check a file name against the pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    /// Whether a string contains wildcard characters at all.
    pub fn is_wildcard(text: &str) -> bool {
        text.contains(['*', '?'])
    }
}

/// A set of patterns; a name matches the set if it matches any member.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<FilePattern>,
}

impl PatternSet {
    /// Compile every pattern in `patterns`.
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| FilePattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }
}

/// Errors that can occur when compiling a pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Empty file pattern")]
    Empty,

    #[error("File pattern must not contain a path separator: {0}")]
    Separator(String),

    #[error("Invalid file pattern {pattern}: {message}")]
    Invalid { pattern: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_suffix_patterns() {
        let png = FilePattern::new("*.png").unwrap();

        assert!(png.matches("logo.png"));
        assert!(png.matches("LOGO.PNG"));
        assert!(!png.matches("logo.png.bak"));
        assert!(!png.matches("logo.jpg"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let pattern = FilePattern::new("site-?.css").unwrap();

        assert!(pattern.matches("site-a.css"));
        assert!(!pattern.matches("site-ab.css"));
        assert!(!pattern.matches("site-.css"));
    }

    #[test]
    fn escapes_regex_metacharacters() {
        let pattern = FilePattern::new("jquery.min(1).js").unwrap();

        assert!(pattern.matches("jquery.min(1).js"));
        assert!(!pattern.matches("jqueryXmin(1)Xjs"));
    }

    #[test]
    fn rejects_paths_and_empty_patterns() {
        assert!(matches!(FilePattern::new(""), Err(PatternError::Empty)));
        assert!(matches!(
            FilePattern::new("img/*.png"),
            Err(PatternError::Separator(_))
        ));
    }

    #[test]
    fn set_matches_any_member() {
        let set = PatternSet::new(["*.png", "*.jpg"]).unwrap();

        assert!(set.matches("a.png"));
        assert!(set.matches("b.jpg"));
        assert!(!set.matches("c.txt"));
        assert!(!PatternSet::default().matches("a.png"));
    }
}

use std::path::Path;

pub const DEFAULT_BLACKLIST: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".git",
    ".svn",
    "tmp",
    "temp",
    "cache",
    "logs",
    ".vscode",
    ".idea",
    ".vs",
    "画集",
];

/// Directory-name blacklist applied before a branch is visited.
#[derive(Debug, Clone)]
pub struct PathFilter {
    keywords: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST.iter().copied())
    }
}

impl PathFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        keywords.sort();
        keywords.dedup();
        Self { keywords }
    }

    /// A name is excluded when it equals a keyword or starts with `keyword.`.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords.iter().any(|kw| {
            name == *kw
                || name
                    .strip_prefix(kw.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Checks the final segment of a path; a bare root such as `/` is never excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| self.is_excluded_name(&n.to_string_lossy()))
            .unwrap_or(false)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_dotted_prefix_match() {
        let f = PathFilter::default();
        assert!(f.is_excluded_name("node_modules"));
        assert!(f.is_excluded_name("Cache"));
        assert!(f.is_excluded_name("tmp.old"));
        assert!(f.is_excluded_name("画集"));
        assert!(!f.is_excluded_name("tmpfiles"));
        assert!(!f.is_excluded_name("my_cache"));
        assert!(!f.is_excluded_name("photos"));
    }

    #[test]
    fn path_uses_last_segment_only() {
        let f = PathFilter::default();
        assert!(f.is_excluded(Path::new("/data/tmp")));
        assert!(!f.is_excluded(Path::new("/tmp/photos")));
        assert!(!f.is_excluded(Path::new("/")));
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let f = PathFilter::new(["Drafts", "  "]);
        assert_eq!(f.keywords(), &["drafts".to_string()]);
        assert!(f.is_excluded_name("drafts"));
        assert!(!f.is_excluded_name("node_modules"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanError;

/// Semantic file grouping derived from an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Code,
    Font,
    Executable,
    Model,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Text,
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Document,
        Category::Archive,
        Category::Code,
        Category::Font,
        Category::Executable,
        Category::Model,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Document => "document",
            Category::Archive => "archive",
            Category::Code => "code",
            Category::Font => "font",
            Category::Executable => "executable",
            Category::Model => "model",
        }
    }

    /// Categories a folder of scans may mix with its images and still be archived whole.
    pub fn is_extended_media(self) -> bool {
        matches!(self, Category::Image | Category::Document | Category::Text)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PlanError::UnknownCategory(wanted.to_string()))
    }
}

/// The category filter a run cares about. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTypes(Vec<Category>);

impl TargetTypes {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut out: Vec<Category> = Vec::new();
        for c in categories {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        Self(out)
    }

    /// Parses category names, failing on the first unknown one.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> crate::Result<Self> {
        let parsed = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !n.trim().is_empty())
            .map(Category::from_str)
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self::new(parsed))
    }

    /// Parses a comma separated list such as `image,video`.
    pub fn parse_list(list: &str) -> crate::Result<Self> {
        let names: Vec<&str> = list.split(',').collect();
        Self::parse(&names)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn matches(&self, category: Option<Category>) -> bool {
        category.is_some_and(|c| self.contains(c))
    }

    pub fn as_slice(&self) -> &[Category] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("IMAGE".parse::<Category>().unwrap(), Category::Image);
        assert_eq!(" video ".parse::<Category>().unwrap(), Category::Video);
    }

    #[test]
    fn unknown_target_type_is_rejected() {
        let err = TargetTypes::parse_list("image,pictures").unwrap_err();
        assert!(matches!(err, PlanError::UnknownCategory(ref s) if s == "pictures"));
    }

    #[test]
    fn target_types_dedupe_and_skip_blanks() {
        let t = TargetTypes::parse_list("image, ,image,text").unwrap();
        assert_eq!(t.as_slice(), &[Category::Image, Category::Text]);
        assert!(TargetTypes::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&TargetTypes::new([Category::Image])).unwrap();
        assert_eq!(json, r#"["image"]"#);
    }
}

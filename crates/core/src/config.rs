use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::category::Category;
use crate::classifier::ExtensionClassifier;
use crate::error::{PlanError, Result};
use crate::filter::{PathFilter, DEFAULT_BLACKLIST};

/// Analyzer settings, usually read from a TOML file and then overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Archive a lone image in a leaf folder without the usual minimum count.
    pub single_image_rule: bool,
    pub blacklist: Vec<String>,
    pub extra_extensions: BTreeMap<Category, Vec<String>>,
    /// Worker threads; `None` picks a multiple of the core count.
    pub workers: Option<usize>,
    pub keep_folder_structure: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            single_image_rule: false,
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            extra_extensions: BTreeMap::new(),
            workers: None,
            keep_folder_structure: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
        let cfg = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded analyzer config");
        Ok(cfg)
    }

    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) if n > 0 => n,
            _ => (num_cpus::get() * 2).clamp(1, 32),
        }
    }

    pub fn classifier(&self) -> ExtensionClassifier {
        ExtensionClassifier::with_extra(&self.extra_extensions)
    }

    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(&self.blacklist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = AnalyzerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AnalyzerConfig::default());
        assert!(cfg.worker_count() >= 1);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let cfg = AnalyzerConfig::from_toml_str(
            r#"
single_image_rule = true
blacklist = ["drafts"]
workers = 3

[extra_extensions]
image = [".heic"]
"#,
        )
        .unwrap();
        assert!(cfg.single_image_rule);
        assert_eq!(cfg.worker_count(), 3);
        assert!(cfg.path_filter().is_excluded_name("drafts"));
        assert_eq!(cfg.classifier().classify(".HEIC"), Some(Category::Image));
        assert!(cfg.keep_folder_structure);
    }

    #[test]
    fn unknown_category_key_is_a_config_error() {
        let err = AnalyzerConfig::from_toml_str("[extra_extensions]\npictures = [\".x\"]\n")
            .unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AnalyzerConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}

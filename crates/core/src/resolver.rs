//! Per-folder compression decision.
//!
//! The rules are evaluated in a fixed order; the first one that applies wins:
//!
//! 1. no direct files: skip
//! 2. lone image in a leaf folder (when enabled): entire
//! 3. blacklisted folder: skip
//! 4. an archive here or below: selective on the target types, or skip
//! 5. no target types: entire when there are enough files
//! 6. target types: entire when everything matches (or the extended-media
//!    fallback covers every file), selective on a partial match

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::{Category, TargetTypes};
use crate::model::{Census, ExtensionCounts};
use crate::scanner::FileEntry;

/// Fewest matching files worth an archive of their own.
pub const MIN_MATCH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Entire,
    Selective,
    Skip,
}

impl ModeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeKind::Entire => "entire",
            ModeKind::Selective => "selective",
            ModeKind::Skip => "skip",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decision for one folder, with the extensions it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressMode {
    Entire(ExtensionCounts),
    Selective(ExtensionCounts),
    Skip,
}

impl CompressMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            CompressMode::Entire(_) => ModeKind::Entire,
            CompressMode::Selective(_) => ModeKind::Selective,
            CompressMode::Skip => ModeKind::Skip,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, CompressMode::Skip)
    }

    pub fn extensions(&self) -> Option<&ExtensionCounts> {
        match self {
            CompressMode::Entire(e) | CompressMode::Selective(e) => Some(e),
            CompressMode::Skip => None,
        }
    }

    pub fn into_extensions(self) -> ExtensionCounts {
        match self {
            CompressMode::Entire(e) | CompressMode::Selective(e) => e,
            CompressMode::Skip => ExtensionCounts::new(),
        }
    }

    /// Entire becomes selective over the same extensions; other modes are unchanged.
    pub fn downgrade(self) -> Self {
        match self {
            CompressMode::Entire(e) => CompressMode::Selective(e),
            other => other,
        }
    }
}

/// Everything the resolver looks at for one folder.
#[derive(Debug, Clone, Copy)]
pub struct FolderFacts<'a> {
    pub files: &'a [FileEntry],
    pub census: &'a Census,
    pub has_subdirs: bool,
    pub excluded: bool,
    pub has_descendant_archive: bool,
}

/// Run-wide resolver settings.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    pub target_types: TargetTypes,
    pub single_image_rule: bool,
}

impl Resolver {
    pub fn new(target_types: TargetTypes, single_image_rule: bool) -> Self {
        Self {
            target_types,
            single_image_rule,
        }
    }

    pub fn resolve(&self, facts: &FolderFacts<'_>) -> CompressMode {
        let files = facts.files;
        let total = files.len();

        if total == 0 {
            return CompressMode::Skip;
        }

        if self.single_image_rule && total == 1 && !facts.has_subdirs {
            let only = &files[0];
            if only.category == Some(Category::Image) {
                return CompressMode::Entire(count_extensions(files.iter()));
            }
        }

        if facts.excluded {
            return CompressMode::Skip;
        }

        let targets = &self.target_types;
        let has_archive = facts.census.get(&Category::Archive).copied().unwrap_or(0) > 0;

        if has_archive || facts.has_descendant_archive {
            if targets.is_empty() {
                return CompressMode::Skip;
            }
            let matched: Vec<&FileEntry> = self.matching(files).collect();
            if matched.len() >= MIN_MATCH {
                return CompressMode::Selective(count_extensions(matched.into_iter()));
            }
            return CompressMode::Skip;
        }

        if targets.is_empty() {
            if total >= MIN_MATCH {
                return CompressMode::Entire(count_extensions(files.iter()));
            }
            return CompressMode::Skip;
        }

        let matched: Vec<&FileEntry> = self.matching(files).collect();
        let matching_count = matched.len();

        if matching_count < MIN_MATCH {
            return CompressMode::Skip;
        }
        if matching_count == total {
            return CompressMode::Entire(count_extensions(matched.into_iter()));
        }
        if targets.contains(Category::Image) && extended_media_match(files) {
            tracing::debug!(files = total, "images with documents/text, archiving whole folder");
            return CompressMode::Entire(count_extensions(files.iter()));
        }
        if matching_count > 0 {
            return CompressMode::Selective(count_extensions(matched.into_iter()));
        }
        CompressMode::Skip
    }

    fn matching<'f>(&'f self, files: &'f [FileEntry]) -> impl Iterator<Item = &'f FileEntry> + 'f {
        files
            .iter()
            .filter(move |f| self.target_types.matches(f.category))
    }
}

/// Every file is image, document or text, and at least one is an image.
pub fn extended_media_match(files: &[FileEntry]) -> bool {
    let mut has_image = false;
    for f in files {
        match f.category {
            Some(c) if c.is_extended_media() => has_image |= c == Category::Image,
            _ => return false,
        }
    }
    has_image
}

fn count_extensions<'f>(files: impl Iterator<Item = &'f FileEntry>) -> ExtensionCounts {
    let mut counts = ExtensionCounts::new();
    for ext in files.filter_map(|f| f.extension.as_deref()) {
        *counts.entry(ext.to_string()).or_insert(0) += 1;
    }
    counts
}

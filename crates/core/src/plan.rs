use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::category::{Category, TargetTypes};
use crate::error::{PlanError, Result};
use crate::filter::PathFilter;
use crate::model::{sibling_order, Census, ExtensionCounts, FolderNode};
use crate::resolver::{CompressMode, FolderFacts, ModeKind, Resolver};

/// One resolved folder as handed to the archiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    /// Written lossily when the name is not valid UTF-8.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    pub name: String,
    pub compress_mode: ModeKind,
    pub total_files: u64,
    #[serde(default)]
    pub file_types: Census,
    #[serde(default)]
    pub file_extensions: ExtensionCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Pre-order traversal yielding `(depth relative to self, node)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    /// Up to three most frequent categories, ties broken by name.
    pub fn dominant_types(&self) -> Vec<Category> {
        let mut types: Vec<(Category, u64)> =
            self.file_types.iter().map(|(c, n)| (*c, *n)).collect();
        types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        types.into_iter().take(3).map(|(c, _)| c).collect()
    }

    pub fn is_actionable(&self) -> bool {
        self.compress_mode != ModeKind::Skip
    }
}

fn serialize_path_lossy<S>(path: &Path, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match path.to_str() {
        Some(utf8) => serializer.serialize_str(utf8),
        None => {
            tracing::warn!(path = %path.display(), "path is not valid UTF-8, writing it lossily");
            serializer.serialize_str(&path.to_string_lossy())
        }
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a PlanNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a PlanNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub target_file_types: TargetTypes,
}

/// The serialized envelope: the resolved tree plus the settings of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub folder_tree: PlanNode,
    pub config: PlanConfig,
}

impl Plan {
    pub fn new(folder_tree: PlanNode, target_file_types: TargetTypes) -> Self {
        Self {
            folder_tree,
            config: PlanConfig {
                timestamp: Local::now().fixed_offset(),
                target_file_types,
            },
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PlanError::io(parent, e))?;
        }
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| PlanError::io(path, e))?;
        tracing::info!(path = %path.display(), "wrote plan");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
        Self::from_json(&raw)
    }

    /// `<dir>/<root name>_config.json`, where `dir` defaults to the root itself.
    pub fn default_path(root: &Path, output_dir: Option<&Path>) -> PathBuf {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        output_dir
            .unwrap_or(root)
            .join(format!("{name}_config.json"))
    }

    /// Every non-skip node, pre-order.
    pub fn actionable(&self) -> impl Iterator<Item = &PlanNode> {
        self.folder_tree
            .walk()
            .map(|(_, n)| n)
            .filter(|n| n.is_actionable())
    }
}

struct Assembled {
    node: PlanNode,
    archive_below: bool,
    active_below: bool,
}

/// Resolves a built tree bottom-up into plan nodes.
pub struct PlanAssembler<'a> {
    resolver: &'a Resolver,
    filter: &'a PathFilter,
}

impl<'a> PlanAssembler<'a> {
    pub fn new(resolver: &'a Resolver, filter: &'a PathFilter) -> Self {
        Self { resolver, filter }
    }

    pub fn assemble(&self, node: FolderNode) -> PlanNode {
        self.assemble_node(node).node
    }

    fn assemble_node(&self, mut folder: FolderNode) -> Assembled {
        folder
            .children
            .sort_by(|a, b| sibling_order(a.weight, &a.name, b.weight, &b.name));

        let mut archive_below = false;
        let mut active_below = false;
        let children: Vec<PlanNode> = std::mem::take(&mut folder.children)
            .into_iter()
            .map(|child| {
                let done = self.assemble_node(child);
                archive_below |= done.archive_below;
                active_below |= done.active_below;
                done.node
            })
            .collect();

        let mut mode = self.resolver.resolve(&FolderFacts {
            files: &folder.files,
            census: &folder.census,
            has_subdirs: folder.has_subdirs,
            excluded: self.filter.is_excluded(&folder.path),
            has_descendant_archive: archive_below,
        });

        if active_below && matches!(mode, CompressMode::Entire(_)) {
            tracing::debug!(
                path = %folder.path.display(),
                "subfolder needs its own archive, downgrading to selective"
            );
            mode = mode.downgrade();
        }

        let kind = mode.kind();
        tracing::debug!(path = %folder.path.display(), mode = %kind, "resolved");

        Assembled {
            archive_below: archive_below || folder.has_archive(),
            active_below: active_below || kind != ModeKind::Skip,
            node: PlanNode {
                total_files: folder.total_files(),
                path: folder.path,
                name: folder.name,
                compress_mode: kind,
                file_types: folder.census,
                file_extensions: mode.into_extensions(),
                children,
            },
        }
    }
}

use bytesize::ByteSize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::config::AnalyzerConfig;
use crate::plan::{Plan, PlanNode};
use crate::resolver::ModeKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveScope {
    /// Every direct and nested file of the folder.
    Entire { keep_folder_structure: bool },
    /// Direct files with one of these extensions only.
    Selective { extensions: BTreeSet<String> },
}

/// One unit of work for the archiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTask {
    pub source: PathBuf,
    pub archive: PathBuf,
    pub scope: ArchiveScope,
}

impl ArchiveTask {
    pub fn from_node(node: &PlanNode, keep_folder_structure: bool) -> Option<Self> {
        let file_name = format!("{}.zip", node.name);
        match node.compress_mode {
            ModeKind::Skip => None,
            ModeKind::Entire => {
                let parent = node
                    .path
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| node.path.clone());
                Some(Self {
                    source: node.path.clone(),
                    archive: parent.join(file_name),
                    scope: ArchiveScope::Entire {
                        keep_folder_structure,
                    },
                })
            }
            ModeKind::Selective => Some(Self {
                source: node.path.clone(),
                archive: node.path.join(file_name),
                scope: ArchiveScope::Selective {
                    extensions: node.file_extensions.keys().cloned().collect(),
                },
            }),
        }
    }

    /// Tasks for every non-skip folder of the plan, pre-order.
    pub fn from_plan(plan: &Plan, keep_folder_structure: bool) -> Vec<Self> {
        plan.actionable()
            .filter_map(|n| Self::from_node(n, keep_folder_structure))
            .collect()
    }

    /// Tasks for `plan` with the archive settings of `config`.
    pub fn from_plan_with_config(plan: &Plan, config: &AnalyzerConfig) -> Vec<Self> {
        Self::from_plan(plan, config.keep_folder_structure)
    }
}

impl fmt::Display for ArchiveTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            ArchiveScope::Entire { .. } => write!(
                f,
                "entire    {} -> {}",
                self.source.display(),
                self.archive.display()
            ),
            ArchiveScope::Selective { extensions } => write!(
                f,
                "selective {} -> {} [{}]",
                self.source.display(),
                self.archive.display(),
                extensions.iter().cloned().collect::<Vec<_>>().join(" ")
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub success: bool,
    pub original_size: u64,
    pub compressed_size: u64,
    pub message: Option<String>,
}

impl ArchiveOutcome {
    pub fn ok(original_size: u64, compressed_size: u64) -> Self {
        Self {
            success: true,
            original_size,
            compressed_size,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// The external tool that turns a task into an archive file.
pub trait Archiver {
    fn archive(&self, task: &ArchiveTask) -> ArchiveOutcome;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionStats {
    pub succeeded: u64,
    pub failed: u64,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

impl CompressionStats {
    pub fn add(&mut self, outcome: &ArchiveOutcome) {
        if outcome.success {
            self.succeeded += 1;
            self.original_bytes += outcome.original_size;
            self.compressed_bytes += outcome.compressed_size;
        } else {
            self.failed += 1;
        }
    }

    /// Compressed size as a percentage of the original, 0 when nothing succeeded.
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.compressed_bytes as f64 / self.original_bytes as f64 * 100.0
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.succeeded + self.failed;
        if total == 0 {
            return f.write_str("no archives created");
        }
        write!(
            f,
            "{}/{} succeeded, {} -> {} ({:.1}%)",
            self.succeeded,
            total,
            ByteSize(self.original_bytes),
            ByteSize(self.compressed_bytes),
            self.ratio()
        )
    }
}

/// Hands every task to the archiver in order; failures are counted, not fatal.
pub fn run_tasks(tasks: &[ArchiveTask], archiver: &dyn Archiver) -> CompressionStats {
    let mut stats = CompressionStats::default();
    for task in tasks {
        let outcome = archiver.archive(task);
        if outcome.success {
            tracing::info!(
                source = %task.source.display(),
                archive = %task.archive.display(),
                "archived"
            );
        } else {
            tracing::warn!(
                source = %task.source.display(),
                error = outcome.message.as_deref().unwrap_or("unknown"),
                "archiver failed"
            );
        }
        stats.add(&outcome);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::TargetTypes;
    use parking_lot::Mutex;
    use std::path::Path;

    fn node(path: &str, mode: ModeKind, exts: &[&str], children: Vec<PlanNode>) -> PlanNode {
        let path = PathBuf::from(path);
        PlanNode {
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            path,
            compress_mode: mode,
            total_files: exts.len() as u64,
            file_types: Default::default(),
            file_extensions: exts.iter().map(|e| (e.to_string(), 1)).collect(),
            children,
        }
    }

    fn sample() -> Plan {
        Plan::new(
            node(
                "/lib/set",
                ModeKind::Selective,
                &[".jpg"],
                vec![
                    node("/lib/set/a", ModeKind::Entire, &[".png", ".txt"], vec![]),
                    node("/lib/set/b", ModeKind::Skip, &[], vec![]),
                ],
            ),
            TargetTypes::default(),
        )
    }

    #[test]
    fn tasks_cover_actionable_nodes_only() {
        let tasks = ArchiveTask::from_plan(&sample(), true);
        assert_eq!(tasks.len(), 2);

        assert_eq!(tasks[0].archive, Path::new("/lib/set/set.zip"));
        assert_eq!(
            tasks[0].scope,
            ArchiveScope::Selective {
                extensions: [".jpg".to_string()].into_iter().collect()
            }
        );

        assert_eq!(tasks[1].source, Path::new("/lib/set/a"));
        assert_eq!(tasks[1].archive, Path::new("/lib/set/a.zip"));
        assert_eq!(
            tasks[1].scope,
            ArchiveScope::Entire {
                keep_folder_structure: true
            }
        );
        assert!(tasks[0].to_string().starts_with("selective"));
    }

    #[test]
    fn config_decides_folder_structure_of_entire_archives() {
        let flat = AnalyzerConfig::from_toml_str("keep_folder_structure = false").unwrap();
        let tasks = ArchiveTask::from_plan_with_config(&sample(), &flat);
        assert_eq!(
            tasks[1].scope,
            ArchiveScope::Entire {
                keep_folder_structure: false
            }
        );

        let tasks = ArchiveTask::from_plan_with_config(&sample(), &AnalyzerConfig::default());
        assert_eq!(
            tasks[1].scope,
            ArchiveScope::Entire {
                keep_folder_structure: true
            }
        );
    }

    struct FakeArchiver {
        seen: Mutex<Vec<PathBuf>>,
    }

    impl Archiver for FakeArchiver {
        fn archive(&self, task: &ArchiveTask) -> ArchiveOutcome {
            self.seen.lock().push(task.source.clone());
            match task.scope {
                ArchiveScope::Entire { .. } => ArchiveOutcome::ok(1000, 250),
                ArchiveScope::Selective { .. } => ArchiveOutcome::failed("7z exited with 2"),
            }
        }
    }

    #[test]
    fn run_tasks_aggregates_outcomes() {
        let archiver = FakeArchiver {
            seen: Mutex::new(Vec::new()),
        };
        let tasks = ArchiveTask::from_plan(&sample(), false);
        let stats = run_tasks(&tasks, &archiver);

        assert_eq!(archiver.seen.lock().len(), 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.original_bytes, 1000);
        assert!((stats.ratio() - 25.0).abs() < f64::EPSILON);
        assert_eq!(CompressionStats::default().to_string(), "no archives created");
    }
}

use std::fmt;

use crate::plan::PlanNode;
use crate::resolver::ModeKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeStats {
    pub folders: u64,
    pub files: u64,
}

/// Folder and direct-file totals per compression mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub entire: ModeStats,
    pub selective: ModeStats,
    pub skip: ModeStats,
}

impl PlanSummary {
    pub fn of(root: &PlanNode) -> Self {
        let mut summary = Self::default();
        for (_, node) in root.walk() {
            let stats = summary.get_mut(node.compress_mode);
            stats.folders += 1;
            stats.files += node.total_files;
        }
        summary
    }

    pub fn get(&self, mode: ModeKind) -> ModeStats {
        match mode {
            ModeKind::Entire => self.entire,
            ModeKind::Selective => self.selective,
            ModeKind::Skip => self.skip,
        }
    }

    fn get_mut(&mut self, mode: ModeKind) -> &mut ModeStats {
        match mode {
            ModeKind::Entire => &mut self.entire,
            ModeKind::Selective => &mut self.selective,
            ModeKind::Skip => &mut self.skip,
        }
    }

    pub fn actionable_folders(&self) -> u64 {
        self.entire.folders + self.selective.folders
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>8} {:>8}", "mode", "folders", "files")?;
        for mode in [ModeKind::Entire, ModeKind::Selective, ModeKind::Skip] {
            let s = self.get(mode);
            writeln!(f, "{:<10} {:>8} {:>8}", mode.as_str(), s.folders, s.files)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn node(mode: ModeKind, files: u64, children: Vec<PlanNode>) -> PlanNode {
        PlanNode {
            path: PathBuf::from("/x"),
            name: "x".into(),
            compress_mode: mode,
            total_files: files,
            file_types: Default::default(),
            file_extensions: Default::default(),
            children,
        }
    }

    #[test]
    fn totals_per_mode() {
        let tree = node(
            ModeKind::Selective,
            4,
            vec![
                node(ModeKind::Entire, 10, vec![]),
                node(ModeKind::Skip, 1, vec![node(ModeKind::Entire, 2, vec![])]),
            ],
        );
        let s = PlanSummary::of(&tree);
        assert_eq!(s.entire, ModeStats { folders: 2, files: 12 });
        assert_eq!(s.selective, ModeStats { folders: 1, files: 4 });
        assert_eq!(s.skip, ModeStats { folders: 1, files: 1 });
        assert_eq!(s.actionable_folders(), 3);
        assert!(s.to_string().contains("selective"));
    }
}

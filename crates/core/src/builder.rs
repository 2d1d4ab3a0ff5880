use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::path::Path;

use crate::classifier::ExtensionClassifier;
use crate::filter::PathFilter;
use crate::model::{census_of, folder_weight, sibling_order, FolderNode};
use crate::progress::ScanProgress;
use crate::scanner::{DirScanner, ScanMsg};

/// Builds the unresolved folder tree. Subdirectories are built in parallel on the
/// current rayon pool and every parent joins all of its children before returning.
pub struct TreeBuilder<'a> {
    classifier: &'a ExtensionClassifier,
    filter: &'a PathFilter,
    progress: Option<&'a ScanProgress>,
    tx: Option<&'a Sender<ScanMsg>>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(classifier: &'a ExtensionClassifier, filter: &'a PathFilter) -> Self {
        Self {
            classifier,
            filter,
            progress: None,
            tx: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a ScanProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_sender(mut self, tx: Option<&'a Sender<ScanMsg>>) -> Self {
        self.tx = tx;
        self
    }

    /// Returns `None` when `path` itself is blacklisted.
    pub fn build(&self, path: &Path, depth: usize) -> Option<FolderNode> {
        if self.filter.is_excluded(path) {
            tracing::debug!(path = %path.display(), "blacklisted, not visited");
            return None;
        }

        let listing = self.scanner().scan(path);

        let mut children: Vec<FolderNode> = listing
            .subdirs
            .par_iter()
            .filter_map(|sub| self.build(sub, depth + 1))
            .collect();
        children.sort_by(|a, b| sibling_order(a.weight, &a.name, b.weight, &b.name));

        let size = listing.bytes() + children.iter().map(|c| c.size).sum::<u64>();
        let census = census_of(&listing.files);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::trace!(
            path = %path.display(),
            files = listing.files.len(),
            children = children.len(),
            "built folder"
        );

        Some(FolderNode {
            path: path.to_path_buf(),
            name,
            depth,
            weight: folder_weight(depth, size),
            size,
            has_subdirs: listing.dir_count > 0,
            files: listing.files,
            census,
            children,
        })
    }

    fn scanner(&self) -> DirScanner<'a> {
        let scanner = DirScanner::new(self.classifier, self.filter).with_sender(self.tx);
        match self.progress {
            Some(progress) => scanner.with_progress(progress),
            None => scanner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path, bytes: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn builds_nested_tree_with_depth_and_census() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("album");
        touch(&root.join("cover.jpg"), 10);
        touch(&root.join("disc1").join("01.mp3"), 20);
        touch(&root.join("disc1").join("scans").join("a.png"), 30);
        touch(&root.join("cache").join("junk.bin"), 40);

        let classifier = ExtensionClassifier::default();
        let filter = PathFilter::default();
        let tree = TreeBuilder::new(&classifier, &filter).build(&root, 0).unwrap();

        assert_eq!(tree.name, "album");
        assert_eq!(tree.depth, 0);
        assert_eq!(tree.size, 60);
        assert!(tree.has_subdirs);
        assert_eq!(tree.census.get(&Category::Image), Some(&1));
        assert_eq!(tree.children.len(), 1);

        let disc = &tree.children[0];
        assert_eq!(disc.depth, 1);
        assert_eq!(disc.children[0].name, "scans");
        assert_eq!(disc.children[0].depth, 2);
        assert!(!disc.children[0].has_subdirs);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn blacklisted_root_is_none() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("node_modules");
        fs::create_dir(&root).unwrap();
        let classifier = ExtensionClassifier::default();
        let filter = PathFilter::default();
        assert!(TreeBuilder::new(&classifier, &filter).build(&root, 0).is_none());
    }

    #[test]
    fn siblings_sorted_by_name_when_weights_tie() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for name in ["delta", "alpha", "charlie", "bravo"] {
            fs::create_dir(root.join(name)).unwrap();
        }
        let classifier = ExtensionClassifier::default();
        let filter = PathFilter::default();
        let tree = TreeBuilder::new(&classifier, &filter).build(root, 0).unwrap();
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alpha", "bravo", "charlie", "delta"]);
    }

    #[test]
    fn vanished_subfolder_is_empty_and_siblings_resolve() {
        use crate::category::TargetTypes;
        use crate::plan::PlanAssembler;
        use crate::resolver::{ModeKind, Resolver};

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("shoot");
        touch(&root.join("keep").join("a.jpg"), 1);
        touch(&root.join("keep").join("b.jpg"), 1);
        touch(&root.join("gone").join("c.jpg"), 1);
        touch(&root.join("gone").join("d.jpg"), 1);

        let classifier = ExtensionClassifier::default();
        let filter = PathFilter::default();
        let progress = ScanProgress::default();
        // Rendezvous channel: the builder waits on every send until it is received.
        let (tx, rx) = crossbeam_channel::bounded(0);

        let (tree, errors) = std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let tx = tx;
                TreeBuilder::new(&classifier, &filter)
                    .with_progress(&progress)
                    .with_sender(Some(&tx))
                    .build(&root, 0)
            });

            // The root listing is done and the builder is parked on its progress
            // message, so "gone" is listed but not yet scanned.
            assert!(matches!(rx.recv(), Ok(ScanMsg::DirDone { ref path, .. }) if path == &root));
            fs::remove_dir_all(root.join("gone")).unwrap();

            let errors: Vec<std::path::PathBuf> = rx
                .iter()
                .filter_map(|msg| match msg {
                    ScanMsg::Error { path, .. } => Some(path),
                    _ => None,
                })
                .collect();
            (handle.join().unwrap(), errors)
        });

        let tree = tree.unwrap();
        assert_eq!(errors, vec![root.join("gone")]);
        assert_eq!(progress.snapshot().errors, 1);

        let gone = tree.children.iter().find(|c| c.name == "gone").unwrap();
        assert!(gone.files.is_empty());
        assert!(gone.children.is_empty());

        let resolver = Resolver::new(TargetTypes::new([Category::Image]), false);
        let plan = PlanAssembler::new(&resolver, &filter).assemble(tree);
        let mode_of = |name: &str| {
            plan.children
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.compress_mode)
                .unwrap()
        };
        assert_eq!(mode_of("gone"), ModeKind::Skip);
        assert_eq!(mode_of("keep"), ModeKind::Entire);
    }
}

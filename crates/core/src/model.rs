use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::category::Category;
use crate::scanner::FileEntry;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub type Census = BTreeMap<Category, u64>;
pub type ExtensionCounts = BTreeMap<String, u64>;

/// A scanned directory whose compression mode is not decided yet.
#[derive(Debug, Clone)]
pub struct FolderNode {
    pub path: PathBuf,
    pub name: String,
    pub depth: usize,
    pub weight: f64,
    /// Bytes of every file in the reachable subtree.
    pub size: u64,
    pub files: Vec<FileEntry>,
    pub census: Census,
    /// Whether the directory had any subdirectory on disk, pruned ones included.
    pub has_subdirs: bool,
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn total_files(&self) -> u64 {
        self.files.len() as u64
    }

    pub fn has_archive(&self) -> bool {
        self.census.get(&Category::Archive).copied().unwrap_or(0) > 0
    }

    /// Count of every node in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(FolderNode::node_count).sum::<usize>()
    }
}

pub fn census_of(files: &[FileEntry]) -> Census {
    let mut census = Census::new();
    for category in files.iter().filter_map(|f| f.category) {
        *census.entry(category).or_insert(0) += 1;
    }
    census
}

/// Deeper folders first, larger ones next among equal depth.
pub fn folder_weight(depth: usize, size_bytes: u64) -> f64 {
    depth as f64 + 0.1 * (size_bytes as f64 / BYTES_PER_GB)
}

/// Weight descending, then name ascending.
pub fn sibling_order(a_weight: f64, a_name: &str, b_weight: f64, b_name: &str) -> Ordering {
    b_weight
        .total_cmp(&a_weight)
        .then_with(|| a_name.cmp(b_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, category: Option<Category>) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            extension: None,
            size: 0,
            category,
        }
    }

    #[test]
    fn census_skips_unknown_categories() {
        let c = census_of(&[
            file("a", Some(Category::Image)),
            file("b", Some(Category::Image)),
            file("c", None),
            file("d", Some(Category::Archive)),
        ]);
        assert_eq!(c.get(&Category::Image), Some(&2));
        assert_eq!(c.get(&Category::Archive), Some(&1));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn weight_is_depth_plus_tenth_of_gigabytes() {
        assert_eq!(folder_weight(2, 0), 2.0);
        let w = folder_weight(1, 5 * 1024 * 1024 * 1024);
        assert!((w - 1.5).abs() < 1e-9);
    }

    #[test]
    fn ordering_breaks_ties_by_name() {
        assert_eq!(sibling_order(2.0, "b", 1.0, "a"), Ordering::Less);
        assert_eq!(sibling_order(1.0, "a", 1.0, "b"), Ordering::Less);
        assert_eq!(sibling_order(1.0, "b", 1.0, "a"), Ordering::Greater);
    }
}

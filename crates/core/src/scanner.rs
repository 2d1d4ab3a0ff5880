use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::category::Category;
use crate::classifier::{extension_of, ExtensionClassifier};
use crate::filter::PathFilter;
use crate::plan::Plan;
use crate::progress::{Progress, ScanProgress};

#[derive(Debug, Clone)]
pub enum ScanMsg {
    Progress(Progress),
    DirDone {
        path: PathBuf,
        files: u64,
        bytes: u64,
    },
    Error {
        path: PathBuf,
        message: String,
    },
    Done(Box<Plan>),
}

/// A direct file of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    /// Lower-cased with its leading dot.
    pub extension: Option<String>,
    pub size: u64,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub files: Vec<FileEntry>,
    /// Subdirectories that passed the path filter, sorted by path.
    pub subdirs: Vec<PathBuf>,
    /// Subdirectories present on disk, excluded ones included.
    pub dir_count: usize,
}

impl DirListing {
    pub fn bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Lists one directory level. Never recurses.
pub struct DirScanner<'a> {
    classifier: &'a ExtensionClassifier,
    filter: &'a PathFilter,
    progress: Option<&'a ScanProgress>,
    tx: Option<&'a Sender<ScanMsg>>,
}

impl<'a> DirScanner<'a> {
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

    /// Directory-level failures yield an empty listing; a failing entry is skipped.
    pub fn scan(&self, path: &Path) -> DirListing {
        let mut listing = DirListing::default();
        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let failed = e.path().map(Path::to_path_buf);
                    if failed.as_deref().map_or(true, |p| p == path) {
                        self.fail(path, &e.to_string());
                        return DirListing::default();
                    }
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                listing.dir_count += 1;
                let name = entry.file_name().to_string_lossy();
                if self.filter.is_excluded_name(&name) {
                    tracing::debug!(path = %entry.path().display(), "pruned blacklisted directory");
                    continue;
                }
                listing.subdirs.push(entry.into_path());
            } else if let Some(size) = file_size(&entry) {
                let extension = extension_of(entry.path());
                let category = extension
                    .as_deref()
                    .and_then(|ext| self.classifier.classify(ext));
                listing.files.push(FileEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    extension,
                    size,
                    category,
                });
            }
        }

        listing.subdirs.sort();
        listing.files.sort_by(|a, b| a.name.cmp(&b.name));

        let bytes = listing.bytes();
        let files = listing.files.len() as u64;
        if let Some(progress) = self.progress {
            progress.record_dir(files, bytes);
        }
        if let Some(tx) = self.tx {
            let _ = tx.send(ScanMsg::DirDone {
                path: path.to_path_buf(),
                files,
                bytes,
            });
            if let Some(progress) = self.progress {
                let _ = tx.send(ScanMsg::Progress(progress.snapshot()));
            }
        }
        listing
    }

    fn fail(&self, path: &Path, message: &str) {
        tracing::warn!(
            path = %path.display(),
            error = %message,
            "cannot scan directory, treating as empty"
        );
        if let Some(progress) = self.progress {
            progress.record_failure(path.to_path_buf(), message.to_string());
        }
        if let Some(tx) = self.tx {
            let _ = tx.send(ScanMsg::Error {
                path: path.to_path_buf(),
                message: message.to_string(),
            });
        }
    }
}

/// Size of a regular file or of the file a symlink points at; `None` for anything else.
fn file_size(entry: &DirEntry) -> Option<u64> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        let size = entry.metadata().map(|md| md.len()).unwrap_or_else(|e| {
            tracing::debug!(path = %entry.path().display(), error = %e, "no metadata, size 0");
            0
        });
        return Some(size);
    }
    if file_type.is_symlink() {
        return std::fs::metadata(entry.path())
            .ok()
            .filter(|md| md.is_file())
            .map(|md| md.len());
    }
    None
}

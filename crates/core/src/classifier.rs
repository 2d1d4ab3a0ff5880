use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::category::Category;

const DEFAULT_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Text,
        &[
            ".txt", ".md", ".log", ".ini", ".cfg", ".conf", ".json", ".xml", ".yml", ".yaml",
            ".csv", ".convert",
        ],
    ),
    (
        Category::Image,
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp", ".svg", ".ico", ".raw",
            ".jxl", ".avif", ".psd",
        ],
    ),
    (
        Category::Video,
        &[
            ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg",
            ".nov",
        ],
    ),
    (
        Category::Audio,
        &[".mp3", ".wav", ".ogg", ".flac", ".aac", ".wma", ".m4a", ".opus"],
    ),
    (
        Category::Document,
        &[
            ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp",
        ],
    ),
    (
        Category::Archive,
        &[
            ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".iso", ".cbz", ".cbr",
        ],
    ),
    (
        Category::Code,
        &[
            ".py", ".js", ".html", ".css", ".java", ".c", ".cpp", ".cs", ".php", ".go", ".rs",
            ".rb", ".ts",
        ],
    ),
    (Category::Font, &[".ttf", ".otf", ".woff", ".woff2", ".eot"]),
    (
        Category::Executable,
        &[".exe", ".dll", ".bat", ".sh", ".msi", ".app", ".apk"],
    ),
    (
        Category::Model,
        &[
            ".pth", ".h5", ".pb", ".onnx", ".tflite", ".mlmodel", ".pt", ".bin", ".caffemodel",
        ],
    ),
];

const TEXT_FILE_NAMES: &[&str] = &["readme", "license", "changelog"];

/// Extension to category lookup, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
    index: HashMap<String, Category>,
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        Self::with_extra(&BTreeMap::new())
    }
}

impl ExtensionClassifier {
    /// Builds the reverse index from the built-in table plus extra extensions.
    /// An extension already owned by a category keeps its first owner.
    pub fn with_extra(extra: &BTreeMap<Category, Vec<String>>) -> Self {
        let mut index = HashMap::with_capacity(128);
        for (category, exts) in DEFAULT_TABLE {
            for ext in *exts {
                index.entry(ext.to_string()).or_insert(*category);
            }
        }
        for (category, exts) in extra {
            for ext in exts {
                let Some(ext) = normalize_extension(ext) else {
                    continue;
                };
                if let Some(owner) = index.get(&ext) {
                    if owner != category {
                        tracing::debug!(
                            %ext,
                            %owner,
                            wanted = %category,
                            "extension already classified"
                        );
                    }
                    continue;
                }
                index.insert(ext, *category);
            }
        }
        Self { index }
    }

    /// Looks up an extension (with or without the leading dot, any case).
    pub fn classify(&self, extension: &str) -> Option<Category> {
        let ext = normalize_extension(extension)?;
        self.index.get(&ext).copied()
    }

    /// Single-file classification: extension first, then well-known file names.
    pub fn classify_path(&self, path: &Path) -> Option<Category> {
        if let Some(category) = extension_of(path).and_then(|ext| self.classify(&ext)) {
            return Some(category);
        }
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        TEXT_FILE_NAMES
            .iter()
            .any(|keyword| name.contains(keyword))
            .then_some(Category::Text)
    }

    pub fn extensions_of(&self, category: Category) -> Vec<&str> {
        let mut exts: Vec<&str> = self
            .index
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(e, _)| e.as_str())
            .collect();
        exts.sort_unstable();
        exts
    }
}

/// Lower-cased extension with its leading dot, `None` when the path has none.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}

fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

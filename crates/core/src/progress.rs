use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub dirs: u64,
    pub files: u64,
    pub bytes: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters shared by every scan task of one run.
#[derive(Debug, Default)]
pub struct ScanProgress {
    dirs: AtomicU64,
    files: AtomicU64,
    bytes: AtomicU64,
    errors: AtomicU64,
    failures: Mutex<Vec<ScanFailure>>,
}

impl ScanProgress {
    pub fn record_dir(&self, files: u64, bytes: u64) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
        self.files.fetch_add(files, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self, path: PathBuf, reason: String) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.failures.lock().push(ScanFailure { path, reason });
    }

    pub fn snapshot(&self) -> Progress {
        Progress {
            dirs: self.dirs.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Recovered failures, sorted by path.
    pub fn failures(&self) -> Vec<ScanFailure> {
        let mut out = self.failures.lock().clone();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let p = ScanProgress::default();
        p.record_dir(3, 300);
        p.record_dir(2, 20);
        p.record_failure(PathBuf::from("/b"), "denied".into());
        p.record_failure(PathBuf::from("/a"), "gone".into());
        assert_eq!(
            p.snapshot(),
            Progress {
                dirs: 2,
                files: 5,
                bytes: 320,
                errors: 2
            }
        );
        let failures = p.failures();
        assert_eq!(failures[0].path, PathBuf::from("/a"));
        assert_eq!(failures[1].reason, "denied");
    }
}

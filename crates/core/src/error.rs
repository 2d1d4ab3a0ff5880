use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown file category `{0}`")]
    UnknownCategory(String),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("root is excluded by the blacklist: {0}")]
    RootExcluded(PathBuf),

    #[error("plan JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl PlanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlanError::Io {
            path: path.into(),
            source,
        }
    }
}

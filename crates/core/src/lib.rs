pub mod analyzer;
pub mod builder;
pub mod category;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod plan;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod summary;
pub mod tasks;

pub use analyzer::Analyzer;
pub use category::{Category, TargetTypes};
pub use config::AnalyzerConfig;
pub use error::{PlanError, Result};
pub use plan::{Plan, PlanNode};
pub use progress::*;
pub use resolver::{CompressMode, ModeKind, MIN_MATCH};
pub use scanner::ScanMsg;

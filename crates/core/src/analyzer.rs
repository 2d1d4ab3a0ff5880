use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::builder::TreeBuilder;
use crate::category::TargetTypes;
use crate::classifier::ExtensionClassifier;
use crate::config::AnalyzerConfig;
use crate::error::{PlanError, Result};
use crate::filter::PathFilter;
use crate::plan::{Plan, PlanAssembler};
use crate::progress::ScanProgress;
use crate::resolver::Resolver;
use crate::scanner::ScanMsg;
use crate::summary::PlanSummary;

/// Scans folder trees and turns them into compression plans.
pub struct Analyzer {
    config: AnalyzerConfig,
    classifier: ExtensionClassifier,
    filter: PathFilter,
    pool: rayon::ThreadPool,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let workers = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("repacku-scan-{i}"))
            .build()?;
        tracing::debug!(workers, "analyzer ready");
        Ok(Self {
            classifier: config.classifier(),
            filter: config.path_filter(),
            config,
            pool,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ExtensionClassifier {
        &self.classifier
    }

    pub fn analyze(&self, root: &Path, targets: &TargetTypes) -> Result<Plan> {
        self.analyze_with(root, targets, &ScanProgress::default(), None)
    }

    /// Like [`Analyzer::analyze`], reporting per-directory progress along the way.
    /// The finished plan is not sent; callers forward it themselves.
    pub fn analyze_with(
        &self,
        root: &Path,
        targets: &TargetTypes,
        progress: &ScanProgress,
        tx: Option<&Sender<ScanMsg>>,
    ) -> Result<Plan> {
        let meta = std::fs::metadata(root).map_err(|e| PlanError::io(root, e))?;
        if !meta.is_dir() {
            return Err(PlanError::NotADirectory(root.to_path_buf()));
        }

        let started = Instant::now();
        let builder = TreeBuilder::new(&self.classifier, &self.filter)
            .with_progress(progress)
            .with_sender(tx);
        let tree = self
            .pool
            .install(|| builder.build(root, 0))
            .ok_or_else(|| PlanError::RootExcluded(root.to_path_buf()))?;
        let folders = tree.node_count();

        let resolver = Resolver::new(targets.clone(), self.config.single_image_rule);
        let folder_tree = PlanAssembler::new(&resolver, &self.filter).assemble(tree);
        let plan = Plan::new(folder_tree, targets.clone());

        let summary = PlanSummary::of(&plan.folder_tree);
        tracing::info!(
            root = %root.display(),
            folders,
            entire = summary.entire.folders,
            selective = summary.selective.folders,
            errors = progress.snapshot().errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis finished"
        );
        Ok(plan)
    }

    /// Analyzes each root and writes its plan; one failing root does not stop the rest.
    pub fn analyze_many(
        &self,
        roots: &[PathBuf],
        targets: &TargetTypes,
        output_dir: Option<&Path>,
    ) -> Vec<(PathBuf, Result<PathBuf>)> {
        roots
            .iter()
            .map(|root| {
                let result = self.analyze(root, targets).and_then(|plan| {
                    let out = Plan::default_path(root, output_dir);
                    plan.write_to(&out)?;
                    Ok(out)
                });
                if let Err(e) = &result {
                    tracing::error!(root = %root.display(), error = %e, "analysis failed");
                }
                (root.clone(), result)
            })
            .collect()
    }
}

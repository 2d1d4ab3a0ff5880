mod display;
mod logging;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand};
use repacku_core::tasks::ArchiveTask;
use repacku_core::{
    export, Analyzer, AnalyzerConfig, Category, Plan, Progress, ScanMsg, ScanProgress, TargetTypes,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "repacku", about = "Plan which folders to archive whole, partly, or not at all")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan folder trees and write a compression plan for each
    Analyze(AnalyzeArgs),
    /// Show the category of individual files
    Classify {
        #[arg(required_unless_present = "list")]
        files: Vec<PathBuf>,
        /// Print every category with its extensions
        #[arg(long)]
        list: bool,
        /// TOML config with extra extensions
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the archive tasks a saved plan describes
    Tasks {
        plan: PathBuf,
        /// Archive whole folders without their top-level directory
        #[arg(long)]
        flatten: bool,
        /// TOML config; `keep_folder_structure = false` flattens like `--flatten`
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Root directories to analyze
    #[arg(required = true)]
    roots: Vec<PathBuf>,
    /// Categories to extract, comma separated, e.g. image,video
    #[arg(short, long)]
    types: Option<String>,
    /// Plan output path (single root only)
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,
    /// Directory receiving `<root name>_config.json` for every root
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// TOML analyzer config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Archive a lone image in a leaf folder
    #[arg(long)]
    single_image: bool,
    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,
    /// Also export the plan as CSV (single root only)
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print the resolved tree and a per-mode summary
    #[arg(short, long)]
    display: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
    if let Err(e) = run(cli.command) {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Analyze(args) => analyze(args),
        Command::Classify {
            files,
            list,
            config,
        } => classify(&files, list, config.as_deref()),
        Command::Tasks {
            plan,
            flatten,
            config,
        } => tasks(&plan, flatten, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(p) => {
            AnalyzerConfig::load(p).with_context(|| format!("loading config {}", p.display()))
        }
        None => Ok(AnalyzerConfig::default()),
    }
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let targets = match &args.types {
        Some(list) => TargetTypes::parse_list(list)?,
        None => TargetTypes::default(),
    };
    if args.roots.len() > 1 && (args.output.is_some() || args.csv.is_some()) {
        bail!("--output and --csv take a single root; use --output-dir for several");
    }

    let mut config = load_config(args.config.as_deref())?;
    if args.single_image {
        config.single_image_rule = true;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    let analyzer = Arc::new(Analyzer::new(config)?);

    let mut failed = 0usize;
    for root in &args.roots {
        if let Err(e) = analyze_root(&analyzer, root, &targets, &args) {
            tracing::error!(root = %root.display(), "{e:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} roots failed", args.roots.len());
    }
    Ok(())
}

/// Scans one root and writes its outputs. Failures stay with this root.
fn analyze_root(
    analyzer: &Arc<Analyzer>,
    root: &Path,
    targets: &TargetTypes,
    args: &AnalyzeArgs,
) -> Result<()> {
    let (plan, progress) = scan_root(analyzer, root, targets)?;
    println!(
        "{}: {} folders, {} files, {}{}",
        root.display(),
        progress.dirs,
        progress.files,
        ByteSize(progress.bytes),
        if progress.errors > 0 {
            format!(", {} unreadable", progress.errors)
        } else {
            String::new()
        }
    );

    let out = args
        .output
        .clone()
        .unwrap_or_else(|| Plan::default_path(root, args.output_dir.as_deref()));
    plan.write_to(&out)
        .with_context(|| format!("writing plan {}", out.display()))?;
    println!("plan written to {}", out.display());

    if let Some(csv_path) = &args.csv {
        let file = std::fs::File::create(csv_path)
            .with_context(|| format!("creating {}", csv_path.display()))?;
        export::to_csv(&plan, std::io::BufWriter::new(file))?;
    }
    if args.display {
        display::print_plan(&plan);
    }
    Ok(())
}

/// Runs one analysis on a worker thread while this thread follows its progress.
fn scan_root(
    analyzer: &Arc<Analyzer>,
    root: &Path,
    targets: &TargetTypes,
) -> Result<(Plan, Progress)> {
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let progress = Arc::new(ScanProgress::default());

    let worker = std::thread::spawn({
        let analyzer = Arc::clone(analyzer);
        let progress = Arc::clone(&progress);
        let root = root.to_path_buf();
        let targets = targets.clone();
        move || -> repacku_core::Result<()> {
            let plan = analyzer.analyze_with(&root, &targets, &progress, Some(&tx))?;
            let _ = tx.send(ScanMsg::Done(Box::new(plan)));
            Ok(())
        }
    });

    let mut plan = None;
    while let Ok(msg) = rx.recv() {
        match msg {
            ScanMsg::DirDone { path, files, .. } => {
                tracing::trace!(path = %path.display(), files, "scanned");
            }
            ScanMsg::Progress(p) => {
                if p.dirs % 500 == 0 {
                    tracing::debug!(dirs = p.dirs, files = p.files, "scanning");
                }
            }
            ScanMsg::Error { path, message } => {
                tracing::warn!(path = %path.display(), "{message}");
            }
            ScanMsg::Done(done) => {
                plan = Some(*done);
            }
        }
    }

    match worker.join() {
        Ok(result) => result?,
        Err(_) => bail!("scan thread panicked for {}", root.display()),
    }
    let plan = plan.with_context(|| format!("no plan produced for {}", root.display()))?;
    Ok((plan, progress.snapshot()))
}

fn classify(files: &[PathBuf], list: bool, config: Option<&Path>) -> Result<()> {
    let classifier = load_config(config)?.classifier();
    if list {
        for category in Category::ALL {
            println!("{category:<10} {}", classifier.extensions_of(category).join(" "));
        }
    }
    for file in files {
        let category = classifier
            .classify_path(file)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{category:<10} {}", file.display());
    }
    Ok(())
}

fn tasks(plan_path: &Path, flatten: bool, config: Option<&Path>) -> Result<()> {
    let mut config = load_config(config)?;
    if flatten {
        config.keep_folder_structure = false;
    }
    let plan = Plan::load(plan_path)
        .with_context(|| format!("reading plan {}", plan_path.display()))?;
    let tasks = ArchiveTask::from_plan_with_config(&plan, &config);
    for task in &tasks {
        println!("{task}");
    }
    println!("{} archive task(s)", tasks.len());
    Ok(())
}

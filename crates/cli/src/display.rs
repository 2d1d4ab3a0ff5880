use repacku_core::plan::PlanNode;
use repacku_core::summary::PlanSummary;
use repacku_core::{ModeKind, Plan};

fn marker(mode: ModeKind) -> &'static str {
    match mode {
        ModeKind::Entire => "[E]",
        ModeKind::Selective => "[S]",
        ModeKind::Skip => "[-]",
    }
}

fn line(depth: usize, node: &PlanNode) -> String {
    let types = node
        .dominant_types()
        .iter()
        .map(|c| format!("{c}:{}", node.file_types.get(c).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join(" ");
    let exts = if node.compress_mode == ModeKind::Selective {
        format!(
            " <{}>",
            node.file_extensions.keys().cloned().collect::<Vec<_>>().join(" ")
        )
    } else {
        String::new()
    };
    format!(
        "{}{} {} ({} files{}{}){}",
        "  ".repeat(depth),
        marker(node.compress_mode),
        node.name,
        node.total_files,
        if types.is_empty() { "" } else { ", " },
        types,
        exts
    )
}

pub fn print_plan(plan: &Plan) {
    for (depth, node) in plan.folder_tree.walk() {
        println!("{}", line(depth, node));
    }
    let summary = PlanSummary::of(&plan.folder_tree);
    println!();
    print!("{summary}");
    println!("{} folder(s) to archive", summary.actionable_folders());
}

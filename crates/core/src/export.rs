use crate::model::{Census, ExtensionCounts};
use crate::plan::Plan;

fn join_census(census: &Census) -> String {
    census
        .iter()
        .map(|(c, n)| format!("{c}:{n}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn join_extensions(exts: &ExtensionCounts) -> String {
    exts.iter()
        .map(|(e, n)| format!("{e}:{n}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// One row per folder, pre-order.
pub fn to_csv(plan: &Plan, mut w: impl std::io::Write) -> crate::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record([
        "path",
        "name",
        "depth",
        "compress_mode",
        "total_files",
        "file_types",
        "file_extensions",
    ])?;
    for (depth, n) in plan.folder_tree.walk() {
        writer.write_record([
            n.path.display().to_string(),
            n.name.clone(),
            depth.to_string(),
            n.compress_mode.to_string(),
            n.total_files.to_string(),
            join_census(&n.file_types),
            join_extensions(&n.file_extensions),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn to_json(plan: &Plan) -> crate::Result<serde_json::Value> {
    Ok(serde_json::to_value(plan)?)
}

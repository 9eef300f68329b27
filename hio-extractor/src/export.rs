//! JSON export of one extraction run

use anyhow::Context;
use hio_core::ExportResult;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DIRECTORY_FILE: &str = "directory.json";

/// What a call to [`write_export`] changed on disk
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: usize,
    pub removed: Vec<String>,
}

/// Write `directory.json` and one `<id>.json` per event list into `dir`.
///
/// Event files left over from earlier runs are removed first. Only `.json`
/// files are candidates; hidden entries such as `.git` are never touched.
///
/// # Returns
/// How many event files were written and which stale ones were removed.
pub fn write_export(dir: &Path, export: &ExportResult) -> anyhow::Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    let directory = serde_json::to_string_pretty(&export.directories)?;
    fs::write(dir.join(DIRECTORY_FILE), directory)
        .with_context(|| format!("writing {} in {}", DIRECTORY_FILE, dir.display()))?;

    let current: HashSet<String> = export
        .events
        .keys()
        .map(|id| format!("{}.json", id))
        .collect();

    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.')
            || !name.ends_with(".json")
            || name == DIRECTORY_FILE
            || current.contains(&name)
        {
            continue;
        }
        if entry.file_type()?.is_file() {
            fs::remove_file(entry.path()).with_context(|| format!("removing stale {}", name))?;
            summary.removed.push(name);
        }
    }
    if !summary.removed.is_empty() {
        tracing::info!("Deleted old event files: {}", summary.removed.join(", "));
    }

    for (id, events) in &export.events {
        let path = dir.join(format!("{}.json", id));
        fs::write(&path, serde_json::to_string_pretty(events)?)
            .with_context(|| format!("writing {}", path.display()))?;
        summary.written += 1;
    }

    tracing::info!(
        "Exported {} event files to {}",
        summary.written,
        dir.display()
    );

    Ok(summary)
}

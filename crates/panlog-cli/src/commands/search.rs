//! Search command - full-field search over the cached config log

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use panlog_core::normalize::{normalize_config, ConfigEntry};
use panlog_core::query;
use panlog_core::LogKind;

use crate::commands::App;
use crate::output::{OutputContext, SearchRow};

/// Search the cached config log and optionally export the matches.
pub fn search(app: &App, term: &str, export: bool, ctx: &OutputContext) -> Result<()> {
    let session = app.session()?;
    let store = app.store(&session)?;

    let raw = store.load(LogKind::Config)?;
    let entries = normalize_config(&raw);
    let matches = query::search(&entries, term);
    if matches.is_empty() {
        ctx.info(&format!("No entries match {term:?}"));
        return Ok(());
    }

    let rows: Vec<SearchRow> = matches.iter().map(|entry| SearchRow::from(*entry)).collect();
    ctx.print(&rows);

    if export {
        let path = next_export_path(store.root());
        write_export(&path, term, &matches)
            .with_context(|| format!("failed to write {}", path.display()))?;
        ctx.success(&format!(
            "Saved {} matches to {}",
            matches.len(),
            path.display()
        ));
    }
    Ok(())
}

/// First free `search_results_NNN.txt` name under the cache root.
fn next_export_path(root: &Path) -> PathBuf {
    (1..)
        .map(|i| root.join(format!("search_results_{i:03}.txt")))
        .find(|path| !path.exists())
        .unwrap_or_else(|| root.join("search_results_overflow.txt"))
}

fn write_export(path: &Path, term: &str, matches: &[&ConfigEntry]) -> Result<()> {
    use std::io::Write;

    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    writeln!(
        out,
        "Search results for {:?} ({} matches, {})",
        term,
        matches.len(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    for entry in matches {
        writeln!(out, "{}", "-".repeat(40))?;
        for (label, value) in entry.fields() {
            writeln!(out, "{label}: {value}")?;
        }
    }
    out.flush()?;
    Ok(())
}

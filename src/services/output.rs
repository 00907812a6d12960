//! Output collaborators: directory preparation, copying kept archives, and reports.
//!
//! These run once after the batch has finished. Errors here are application errors and are
//! returned with context rather than folded into records.

use crate::models::{ScanRecord, Signal};
use crate::services::batch::BatchOutcome;
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt::Write as _;
use std::fs;

pub const SCAN_REPORT_FILE: &str = "scan_report.csv";
pub const EXCLUDED_REPORT_FILE: &str = "excluded.csv";
pub const SUMMARY_FILE: &str = "summary.txt";

/// Columns preceding the per-signal counters in both CSV reports.
const BASE_COLUMNS: &[&str] = &[
    "file",
    "size_bytes",
    "score",
    "keep",
    "reason",
    "mod_id",
    "display_name",
    "loader",
    "has_data",
    "has_assets",
    "infra_keyword",
];

/// Locations of the written report files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub scan_report: Utf8PathBuf,
    pub excluded_report: Utf8PathBuf,
    pub summary: Utf8PathBuf,
}

/// Remove and recreate the output and report directories.
///
/// Refuses to touch anything if either directory is, or contains, the input directory.
pub fn prepare_directories(
    input_dir: &Utf8Path,
    output_dir: &Utf8Path,
    report_dir: &Utf8Path,
) -> Result<()> {
    let input = resolve(input_dir)?;
    for dir in [output_dir, report_dir] {
        let resolved = resolve(dir)?;
        if input.starts_with(&resolved) {
            bail!(
                "Refusing to clear {}: it is or contains the input directory {}",
                dir,
                input_dir
            );
        }
    }

    for dir in [output_dir, report_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to clear directory: {}", dir))?;
            tracing::debug!("Cleared {}", dir);
        }
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir))?;
    }

    Ok(())
}

/// Absolute form of `path`, canonical when it already exists.
fn resolve(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.exists() {
        return path
            .canonicalize_utf8()
            .with_context(|| format!("Failed to resolve path: {}", path));
    }

    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve path: {}", path))?;
    Utf8PathBuf::try_from(absolute).with_context(|| format!("Path is not UTF-8: {}", path))
}

/// Copy every kept archive from `input_dir` into `output_dir`, overwriting existing files.
///
/// # Returns
/// The number of archives copied
pub fn copy_kept(
    outcome: &BatchOutcome,
    input_dir: &Utf8Path,
    output_dir: &Utf8Path,
) -> Result<usize> {
    let mut copied = 0;
    for record in outcome.kept() {
        let source = input_dir.join(record.file_name());
        let target = output_dir.join(record.file_name());
        fs::copy(&source, &target)
            .with_context(|| format!("Failed to copy {} to {}", source, target))?;
        copied += 1;
    }

    tracing::info!("Copied {} archives to {}", copied, output_dir);
    Ok(copied)
}

/// Write the full report, the excluded-only report, and the summary text.
pub fn write_reports(
    outcome: &BatchOutcome,
    report_dir: &Utf8Path,
    summary_text: &str,
) -> Result<ReportPaths> {
    let paths = ReportPaths {
        scan_report: report_dir.join(SCAN_REPORT_FILE),
        excluded_report: report_dir.join(EXCLUDED_REPORT_FILE),
        summary: report_dir.join(SUMMARY_FILE),
    };

    write_records_csv(&paths.scan_report, outcome.records().iter())?;
    write_records_csv(&paths.excluded_report, outcome.excluded())?;
    fs::write(&paths.summary, summary_text)
        .with_context(|| format!("Failed to write summary: {}", paths.summary))?;

    tracing::info!("Reports written to {}", report_dir);
    Ok(paths)
}

/// Header row shared by both CSV reports.
pub fn csv_header() -> Vec<&'static str> {
    BASE_COLUMNS
        .iter()
        .copied()
        .chain(Signal::ALL.iter().map(|s| s.as_str()))
        .collect()
}

/// One CSV row exposing every record field.
pub fn csv_row(record: &ScanRecord) -> Vec<String> {
    let mut row = vec![
        record.file_name().to_string(),
        record.size_bytes().to_string(),
        record.score().to_string(),
        record.keep().to_string(),
        record.reason(),
        record.mod_id().to_string(),
        record.display_name().to_string(),
        record.loader().to_string(),
        record.has_data_root().to_string(),
        record.has_assets_root().to_string(),
        record.infra_keyword().unwrap_or_default().to_string(),
    ];
    row.extend(record.counts().iter().map(|(_, count)| count.to_string()));
    row
}

fn write_records_csv<'a, I>(path: &Utf8Path, records: I) -> Result<()>
where
    I: Iterator<Item = &'a ScanRecord>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create report: {}", path))?;

    wtr.write_record(csv_header())?;
    for record in records {
        wtr.write_record(csv_row(record))?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write report: {}", path))?;
    Ok(())
}

/// Human-readable run summary.
pub fn render_summary(outcome: &BatchOutcome, min_signal: usize, dry_run: bool) -> String {
    let summary = outcome.summary();
    let mut text = String::new();

    let _ = writeln!(text, "modsieve summary");
    let _ = writeln!(text, "min signal: {}", min_signal);
    let _ = writeln!(text, "dry run: {}", dry_run);
    let _ = writeln!(text);
    let _ = writeln!(text, "total archives: {}", summary.total_archives);
    let _ = writeln!(text, "kept archives: {}", summary.kept_archives);
    let _ = writeln!(text, "excluded archives: {}", summary.excluded_archives());
    let _ = writeln!(text, "total bytes: {}", summary.total_bytes);
    let _ = writeln!(text, "kept bytes: {}", summary.kept_bytes);

    let reasons = outcome.reason_counts();
    if !reasons.is_empty() {
        let _ = writeln!(text);
        let _ = writeln!(text, "exclusion reasons:");
        for (reason, count) in &reasons {
            let _ = writeln!(text, "  {}: {}", reason, count);
        }
    }

    let loaders = outcome.loader_counts();
    if !loaders.is_empty() {
        let _ = writeln!(text);
        let _ = writeln!(text, "loaders:");
        for (loader, count) in &loaders {
            let _ = writeln!(text, "  {}: {}", loader, count);
        }
    }

    text
}

//! Batch triage of an input directory.
//!
//! [`BatchDriver`] lists archives (non-recursive, one extension, sorted by name), scans and
//! classifies each one in turn, and collects the records into a [`BatchOutcome`]. A single
//! archive never aborts the batch; only a missing input directory is fatal.

use crate::metrics::ScanMetrics;
use crate::models::config::extension_matches;
use crate::models::{ExclusionReason, LoaderKind, ScanRecord, Settings};
use crate::services::archive::{ArchiveReader, ZipArchiveReader};
use crate::services::classifier::Classifier;
use crate::services::keywords::InfraKeywords;
use crate::services::signals::SignalExtractor;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use std::time::Instant;
use thiserror::Error;

/// Errors that abort a whole run
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input directory not found: {0}")]
    InputDirMissing(Utf8PathBuf),

    #[error("Failed to list input directory {path}: {source}")]
    ListDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An archive file found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub file_name: String,
    pub path: Utf8PathBuf,
    pub size_bytes: u64,
}

/// List archives directly inside `dir` whose extension matches, sorted by file name.
pub fn list_archives(dir: &Utf8Path, extension: &str) -> Result<Vec<ArchiveFile>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::InputDirMissing(dir.to_path_buf()));
    }

    let read_dir = fs::read_dir(dir).map_err(|source| ScanError::ListDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ScanError::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let Ok(path) = Utf8PathBuf::try_from(entry.path()) else {
            tracing::warn!("Skipping non UTF-8 path: {}", entry.path().display());
            continue;
        };
        let Some(file_name) = path.file_name().map(str::to_string) else {
            continue;
        };
        if !extension_matches(&file_name, extension) {
            continue;
        }

        // Follows symlinks, so linked archives are included
        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path, e);
                continue;
            }
        };

        files.push(ArchiveFile {
            file_name,
            path,
            size_bytes: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// Aggregate counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total_archives: usize,
    pub kept_archives: usize,
    pub total_bytes: u64,
    pub kept_bytes: u64,
}

impl BatchSummary {
    pub fn excluded_archives(&self) -> usize {
        self.total_archives - self.kept_archives
    }
}

/// All records from one batch, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    records: Vec<ScanRecord>,
}

impl BatchOutcome {
    pub fn new(records: Vec<ScanRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn kept(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter().filter(|r| r.keep())
    }

    pub fn excluded(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter().filter(|r| !r.keep())
    }

    /// Split into kept and excluded records; every record lands in exactly one side.
    pub fn partition(&self) -> (Vec<&ScanRecord>, Vec<&ScanRecord>) {
        self.records.iter().partition(|r| r.keep())
    }

    pub fn summary(&self) -> BatchSummary {
        self.records
            .iter()
            .fold(BatchSummary::default(), |mut summary, record| {
                summary.total_archives += 1;
                summary.total_bytes += record.size_bytes();
                if record.keep() {
                    summary.kept_archives += 1;
                    summary.kept_bytes += record.size_bytes();
                }
                summary
            })
    }

    /// Excluded record counts per reason text, in first-seen order.
    pub fn reason_counts(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for record in self.excluded() {
            *counts.entry(record.reason()).or_insert(0) += 1;
        }
        counts
    }

    /// Record counts per loader kind, in first-seen order.
    pub fn loader_counts(&self) -> IndexMap<LoaderKind, usize> {
        let mut counts = IndexMap::new();
        for record in &self.records {
            *counts.entry(record.loader()).or_insert(0) += 1;
        }
        counts
    }
}

/// Runs the reader, extractor and classifier over every archive in a directory.
pub struct BatchDriver<R: ArchiveReader> {
    reader: R,
    extractor: SignalExtractor,
    classifier: Classifier,
    extension: String,
}

impl BatchDriver<ZipArchiveReader> {
    /// Driver reading zip archives, configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let keywords = InfraKeywords::with_extra(&settings.extra_infra_keywords);
        Self::new(
            ZipArchiveReader::new(),
            SignalExtractor::new(settings.metadata_limit_bytes),
            Classifier::new(keywords, settings.min_signal),
            settings.archive_extension.clone(),
        )
    }
}

impl<R: ArchiveReader> BatchDriver<R> {
    pub fn new(
        reader: R,
        extractor: SignalExtractor,
        classifier: Classifier,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            extractor,
            classifier,
            extension: extension.into(),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Triage every archive in `input_dir`.
    ///
    /// # Errors
    ///
    /// Fails only if the directory is missing or cannot be listed.
    pub fn run(
        &self,
        input_dir: &Utf8Path,
        metrics: &ScanMetrics,
    ) -> Result<BatchOutcome, ScanError> {
        let files = list_archives(input_dir, &self.extension)?;
        tracing::info!(
            "Scanning {} .{} archives in {} (min signal {})",
            files.len(),
            self.extension.trim_start_matches('.'),
            input_dir,
            self.classifier.min_signal()
        );

        let records = files
            .iter()
            .map(|file| self.scan_archive(file, metrics))
            .collect();

        let outcome = BatchOutcome::new(records);
        let summary = outcome.summary();
        tracing::info!(
            "Batch complete: {} kept, {} excluded",
            summary.kept_archives,
            summary.excluded_archives()
        );
        Ok(outcome)
    }

    /// Scan and classify one archive. Never fails; unreadable archives become excluded records.
    pub fn scan_archive(&self, file: &ArchiveFile, metrics: &ScanMetrics) -> ScanRecord {
        let start = Instant::now();

        let record = match self.reader.open(&file.path) {
            Ok(mut archive) => {
                let acc = self.extractor.scan(&mut archive);
                // Release the handle before classifying
                drop(archive);
                metrics.record_metadata_failures(acc.metadata_failures());
                self.classifier.finalize(&file.file_name, file.size_bytes, acc)
            }
            Err(e) => {
                tracing::warn!("{}: {}", ExclusionReason::ArchiveOpenFailed, e);
                metrics.record_open_failure();
                ScanRecord::unreadable(&file.file_name, file.size_bytes)
            }
        };

        metrics.record_scan_time(start.elapsed());
        metrics.record_archive(record.keep());
        record
    }
}

//! Services module - the archive triage pipeline.
//!
//! Leaf to root:
//!
//! - [`archive`]: Opens mod jars as zip containers and lists their entries ([`ArchiveReader`])
//! - [`metadata`]: Reads mod id and display name from `mods.toml`, `fabric.mod.json`, and
//!   `quilt.mod.json`
//! - [`signals`]: Single-pass structural signal extraction driven by ordered path rule tables
//!   ([`SignalExtractor`])
//! - [`keywords`]: Whole-word infrastructure keyword matching ([`InfraKeywords`])
//! - [`classifier`]: Keep/exclude policy and record finalization ([`Classifier`])
//! - [`batch`]: Directory iteration and aggregation ([`BatchDriver`], [`BatchOutcome`])
//! - [`output`]: Directory preparation, copying kept archives, CSV and summary reports
//!
//! Nothing in the pipeline executes archive contents. Per-archive problems (corrupt zips,
//! unreadable metadata) are converted into record data; only a missing input directory
//! ([`ScanError::InputDirMissing`]) stops a run.
//!
//! # Usage Example
//!
//! ```ignore
//! use modsieve::metrics::ScanMetrics;
//! use modsieve::services::BatchDriver;
//! use modsieve::Settings;
//!
//! let settings = Settings::default();
//! let driver = BatchDriver::from_settings(&settings);
//! let outcome = driver.run(&settings.input_dir, &ScanMetrics::new())?;
//!
//! for record in outcome.kept() {
//!     println!("{} (score {})", record.file_name(), record.score());
//! }
//! ```

pub mod archive;
pub mod batch;
pub mod classifier;
pub mod keywords;
pub mod metadata;
pub mod output;
pub mod signals;

pub use archive::{ArchiveEntry, ArchiveError, ArchiveReader, OpenedArchive, ZipArchiveReader};
pub use batch::{ArchiveFile, BatchDriver, BatchOutcome, BatchSummary, ScanError, list_archives};
pub use classifier::{Classifier, PolicyInput, decide};
pub use keywords::InfraKeywords;
pub use metadata::{MetadataError, MetadataFormat, MetadataReader};
pub use signals::{ScanAccumulator, SignalExtractor};

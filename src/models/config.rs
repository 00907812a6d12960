use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Runtime settings for a triage run.
///
/// Loaded from `modsieve.yaml` and `MODSIEVE_*` environment variables by
/// [`crate::config::ConfigManager`]; command-line flags are applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the archives to triage
    pub input_dir: Utf8PathBuf,

    /// Directory receiving copies of kept archives (recreated each run)
    pub output_dir: Utf8PathBuf,

    /// Directory receiving CSV and summary reports (recreated each run)
    pub report_dir: Utf8PathBuf,

    /// Minimum signal score that keeps an archive outright
    pub min_signal: usize,

    /// Skip the copy step
    pub dry_run: bool,

    /// Archive file extension, without the dot
    pub archive_extension: String,

    /// Keywords added to the builtin infrastructure list
    pub extra_infra_keywords: Vec<String>,

    /// Upper bound on bytes read from a single metadata entry
    pub metadata_limit_bytes: u64,
}

pub const DEFAULT_MIN_SIGNAL: usize = 2;
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "jar";
pub const DEFAULT_METADATA_LIMIT_BYTES: u64 = 1024 * 1024;

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: Utf8PathBuf::from("mods"),
            output_dir: Utf8PathBuf::from("mods_content"),
            report_dir: Utf8PathBuf::from("reports"),
            min_signal: DEFAULT_MIN_SIGNAL,
            dry_run: false,
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            extra_infra_keywords: Vec::new(),
            metadata_limit_bytes: DEFAULT_METADATA_LIMIT_BYTES,
        }
    }
}

impl Settings {
    /// Whether a file name carries the configured archive extension (case-insensitive).
    pub fn matches_extension(&self, file_name: &str) -> bool {
        extension_matches(file_name, &self.archive_extension)
    }
}

/// Whether `file_name` ends in `extension` (leading dot optional, case-insensitive).
pub fn extension_matches(file_name: &str, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    camino::Utf8Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

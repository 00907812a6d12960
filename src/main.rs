//! modsieve - Triage Minecraft mod archives into content and library sets
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and initialize logging → `<log-dir>/modsieve.<date>`
//! 2. Load settings: defaults → `modsieve.yaml` → `MODSIEVE_*` env → CLI flags
//! 3. Verify the input directory exists (the only fatal per-run condition)
//! 4. Scan and classify every archive in the input directory
//! 5. Recreate the output and report directories
//! 6. Copy kept archives (skipped with `--dry-run`)
//! 7. Write `scan_report.csv`, `excluded.csv` and `summary.txt`

use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use modsieve::config::DEFAULT_CONFIG_FILE;
use modsieve::logging::LogOptions;
use modsieve::metrics::ScanMetrics;
use modsieve::services::output;
use modsieve::{APP_NAME, BatchDriver, ConfigManager, Settings, VERSION};

#[derive(Parser, Debug)]
#[command(name = "modsieve", version)]
#[command(
    about = "Sort mod archives into gameplay content and library/infrastructure sets",
    long_about = None
)]
struct Cli {
    /// Directory containing the mod archives
    #[arg(short, long)]
    input: Option<Utf8PathBuf>,

    /// Directory that receives copies of kept archives (recreated on each run)
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Directory that receives the CSV and summary reports (recreated on each run)
    #[arg(short, long)]
    reports: Option<Utf8PathBuf>,

    /// Minimum signal score that keeps an archive regardless of its name
    #[arg(long)]
    min_signal: Option<usize>,

    /// Classify and report without copying archives
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Archive file extension to scan
    #[arg(long)]
    extension: Option<String>,

    /// Extra infrastructure keyword (repeatable)
    #[arg(short = 'k', long = "keyword")]
    keywords: Vec<String>,

    /// Settings file
    #[arg(short, long, env = "MODSIEVE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: Utf8PathBuf,

    /// Write the effective settings to the settings file and exit
    #[arg(long, default_value_t = false)]
    write_config: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: Utf8PathBuf,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(input) = &self.input {
            settings.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(reports) = &self.reports {
            settings.report_dir = reports.clone();
        }
        if let Some(min_signal) = self.min_signal {
            settings.min_signal = min_signal;
        }
        if let Some(extension) = &self.extension {
            settings.archive_extension = extension.clone();
        }
        if self.dry_run {
            settings.dry_run = true;
        }
        settings
            .extra_infra_keywords
            .extend(self.keywords.iter().cloned());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_options = LogOptions::new(&cli.log_dir, APP_NAME).with_debug(cli.debug);
    let _log_guard = modsieve::logging::init(&log_options)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config_manager = ConfigManager::new(&cli.config);
    let mut settings = config_manager.load_settings()?;
    cli.apply(&mut settings);

    if cli.write_config {
        config_manager.save_settings(&settings)?;
        println!("Wrote settings to {}", config_manager.config_path());
        return Ok(());
    }

    tracing::info!(
        "input={} output={} reports={} min_signal={} dry_run={}",
        settings.input_dir,
        settings.output_dir,
        settings.report_dir,
        settings.min_signal,
        settings.dry_run
    );

    if !settings.input_dir.is_dir() {
        tracing::error!("Input directory not found: {}", settings.input_dir);
        bail!(
            "Input directory not found: {} (nothing was written)",
            settings.input_dir
        );
    }

    let metrics = ScanMetrics::new();
    let driver = BatchDriver::from_settings(&settings);
    let outcome = driver.run(&settings.input_dir, &metrics)?;

    output::prepare_directories(
        &settings.input_dir,
        &settings.output_dir,
        &settings.report_dir,
    )?;

    if settings.dry_run {
        tracing::info!("Dry run: skipping copy of {} archives", outcome.kept().count());
    } else {
        output::copy_kept(&outcome, &settings.input_dir, &settings.output_dir)?;
    }

    let summary_text = output::render_summary(&outcome, settings.min_signal, settings.dry_run);
    let paths = output::write_reports(&outcome, &settings.report_dir, &summary_text)?;

    metrics.log_summary();

    print!("{}", summary_text);
    println!();
    println!("Full report: {}", paths.scan_report);
    println!("Excluded:    {}", paths.excluded_report);

    Ok(())
}

//! Integration tests for ConfigManager and settings file handling
//!
//! These tests verify:
//! - Settings loading and saving
//! - Defaults for missing files and missing fields
//! - Settings feeding into a batch run

use camino::Utf8PathBuf;
use modsieve::metrics::ScanMetrics;
use modsieve::{BatchDriver, ConfigManager, Settings};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_dir)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let path = config_dir.join("modsieve.yaml");
    let manager = ConfigManager::new(&path);

    assert_eq!(manager.config_path(), path);
}

#[test]
fn test_load_defaults_without_file() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("modsieve.yaml"));

    let settings = manager.load_settings().unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.input_dir, "mods");
    assert_eq!(settings.output_dir, "mods_content");
    assert_eq!(settings.report_dir, "reports");
    assert!(!settings.dry_run);
}

#[test]
fn test_save_creates_parent_directories() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let path = config_dir.join("nested").join("dir").join("modsieve.yaml");
    let manager = ConfigManager::new(&path);

    manager.save_settings(&Settings::default()).unwrap();
    assert!(path.exists());

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("min_signal: 2"));
    assert!(content.contains("archive_extension: jar"));
}

#[test]
fn test_roundtrip_preserves_every_field() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let manager = ConfigManager::new(config_dir.join("modsieve.yaml"));

    let settings = Settings {
        input_dir: "instance/mods".into(),
        output_dir: "instance/content".into(),
        report_dir: "instance/reports".into(),
        min_signal: 7,
        dry_run: true,
        archive_extension: "zip".to_string(),
        extra_infra_keywords: vec!["houselib".to_string(), "sharedcode".to_string()],
        metadata_limit_bytes: 4096,
    };
    manager.save_settings(&settings).unwrap();

    assert_eq!(manager.load_settings().unwrap(), settings);
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let path = config_dir.join("modsieve.yaml");
    fs::write(&path, "min_signal: [not, a, number]\n").unwrap();

    let manager = ConfigManager::new(&path);
    assert!(manager.load_settings().is_err());
}

#[test]
fn test_loaded_settings_drive_a_batch() {
    let (_temp_dir, config_dir) = create_test_config_dir();
    let input = config_dir.join("jars");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("a.zip"), b"not a zip").unwrap();
    fs::write(input.join("b.jar"), b"not a zip").unwrap();

    let path = config_dir.join("modsieve.yaml");
    fs::write(
        &path,
        format!("input_dir: {}\narchive_extension: zip\n", input),
    )
    .unwrap();

    let settings = ConfigManager::new(&path).load_settings().unwrap();
    let outcome = BatchDriver::from_settings(&settings)
        .run(&settings.input_dir, &ScanMetrics::new())
        .unwrap();

    // Only the configured extension is scanned
    assert_eq!(outcome.len(), 1);
    assert_eq!(outcome.records()[0].file_name(), "a.zip");
}

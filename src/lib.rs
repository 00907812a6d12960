// modsieve - Triage Minecraft mod archives into content and library sets
//
// This is the library crate containing the scanning and classification logic.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{Decision, ExclusionReason, LoaderKind, ScanRecord, Settings, Signal};
pub use services::{BatchDriver, BatchOutcome, Classifier, InfraKeywords, ScanError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

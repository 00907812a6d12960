//! Data models for modsieve.
//!
//! - [`ScanRecord`]: The immutable classification result for one archive
//! - [`SignalCounts`] / [`Signal`]: Per-category structural counters in canonical order
//! - [`Decision`] / [`ExclusionReason`]: Keep/exclude outcome and its report text
//! - [`Settings`]: Run configuration loaded from `modsieve.yaml`, the environment, and CLI flags

pub mod config;
pub mod record;

pub use config::Settings;
pub use record::{
    Decision, ExclusionReason, LoaderKind, ModIdentity, ScanRecord, Signal, SignalCounts,
};

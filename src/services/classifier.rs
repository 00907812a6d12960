//! Keep/exclude policy.
//!
//! A strong structural signal always keeps an archive. Below the threshold, an archive with
//! any `data/` or `assets/` presence is kept unless its file stem or mod id matches an
//! infrastructure keyword; an archive with neither root is excluded.

use crate::models::{Decision, ExclusionReason, ScanRecord};
use crate::services::keywords::InfraKeywords;
use crate::services::signals::ScanAccumulator;
use camino::Utf8Path;

/// Inputs to the keep/exclude policy for one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyInput {
    pub score: usize,
    pub has_data_root: bool,
    pub has_assets_root: bool,
    pub infra: bool,
    pub threshold: usize,
}

/// Apply the keep/exclude policy.
pub fn decide(input: PolicyInput) -> Decision {
    let keep = if input.score >= input.threshold {
        true
    } else if input.has_data_root || input.has_assets_root {
        !input.infra
    } else {
        false
    };

    if keep {
        return Decision::Keep;
    }

    let reason = if input.infra {
        ExclusionReason::InfraKeyword
    } else if !input.has_data_root && !input.has_assets_root {
        ExclusionReason::NoAssetsOrData
    } else if input.score < input.threshold {
        ExclusionReason::LowSignal {
            threshold: input.threshold,
        }
    } else {
        ExclusionReason::HeuristicSkip
    };

    Decision::Exclude(reason)
}

/// Classifies scanned archives against a keyword set and signal threshold.
#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: InfraKeywords,
    min_signal: usize,
}

impl Classifier {
    pub fn new(keywords: InfraKeywords, min_signal: usize) -> Self {
        Self {
            keywords,
            min_signal,
        }
    }

    pub fn min_signal(&self) -> usize {
        self.min_signal
    }

    pub fn keywords(&self) -> &InfraKeywords {
        &self.keywords
    }

    /// Keyword matched by the file stem, or failing that by the mod id.
    pub fn infra_match(&self, file_stem: &str, mod_id: Option<&str>) -> Option<String> {
        self.keywords
            .find_match(file_stem)
            .or_else(|| mod_id.and_then(|id| self.keywords.find_match(id)))
            .map(str::to_string)
    }

    /// Turn a finished scan into an immutable record.
    pub fn finalize(&self, file_name: &str, size_bytes: u64, acc: ScanAccumulator) -> ScanRecord {
        let stem = Utf8Path::new(file_name).file_stem().unwrap_or(file_name);
        let infra_keyword = self.infra_match(stem, acc.mod_id());

        let decision = decide(PolicyInput {
            score: acc.score(),
            has_data_root: acc.has_data_root(),
            has_assets_root: acc.has_assets_root(),
            infra: infra_keyword.is_some(),
            threshold: self.min_signal,
        });

        tracing::debug!(
            "{}: score={} data={} assets={} infra={:?} -> {:?}",
            file_name,
            acc.score(),
            acc.has_data_root(),
            acc.has_assets_root(),
            infra_keyword,
            decision
        );

        let (counts, has_data_root, has_assets_root, identity, loader) = acc.into_parts();
        ScanRecord::new(
            file_name.to_string(),
            size_bytes,
            counts,
            has_data_root,
            has_assets_root,
            identity,
            loader,
            infra_keyword,
            decision,
        )
    }
}

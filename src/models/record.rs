use indexmap::IndexMap;
use std::fmt;

/// Structural signal categories counted while walking an archive.
///
/// Declaration order is the canonical order used for records and report columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Recipes,
    Loot,
    Advancements,
    Tag,
    TagEntity,
    TagBiome,
    TagStructure,
    WorldgenBiome,
    WorldgenFeature,
    WorldgenPlacedFeature,
    WorldgenStructure,
    WorldgenStructureSet,
    WorldgenDimensionType,
    WorldgenDimension,
    Model,
    Lang,
    Sound,
}

impl Signal {
    /// Every category, in canonical order.
    pub const ALL: [Signal; 17] = [
        Signal::Recipes,
        Signal::Loot,
        Signal::Advancements,
        Signal::Tag,
        Signal::TagEntity,
        Signal::TagBiome,
        Signal::TagStructure,
        Signal::WorldgenBiome,
        Signal::WorldgenFeature,
        Signal::WorldgenPlacedFeature,
        Signal::WorldgenStructure,
        Signal::WorldgenStructureSet,
        Signal::WorldgenDimensionType,
        Signal::WorldgenDimension,
        Signal::Model,
        Signal::Lang,
        Signal::Sound,
    ];

    /// Report name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Recipes => "recipes",
            Signal::Loot => "loot",
            Signal::Advancements => "advancements",
            Signal::Tag => "tag",
            Signal::TagEntity => "tag:entity",
            Signal::TagBiome => "tag:biome",
            Signal::TagStructure => "tag:structure",
            Signal::WorldgenBiome => "worldgen:biome",
            Signal::WorldgenFeature => "worldgen:feature",
            Signal::WorldgenPlacedFeature => "worldgen:placed-feature",
            Signal::WorldgenStructure => "worldgen:structure",
            Signal::WorldgenStructureSet => "worldgen:structure-set",
            Signal::WorldgenDimensionType => "worldgen:dimension-type",
            Signal::WorldgenDimension => "worldgen:dimension",
            Signal::Model => "model",
            Signal::Lang => "lang",
            Signal::Sound => "sound",
        }
    }

    /// Whether the category contributes to the total signal score.
    ///
    /// Advancements and the tag refinements are informational only.
    pub fn is_scored(&self) -> bool {
        !matches!(
            self,
            Signal::Advancements | Signal::TagEntity | Signal::TagBiome | Signal::TagStructure
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category entry counts for one archive.
///
/// Always holds every [`Signal`] in canonical order, so iteration order is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCounts {
    counts: IndexMap<Signal, usize>,
}

impl SignalCounts {
    pub fn new() -> Self {
        Self {
            counts: Signal::ALL.iter().map(|s| (*s, 0)).collect(),
        }
    }

    pub fn increment(&mut self, signal: Signal) {
        *self.counts.entry(signal).or_insert(0) += 1;
    }

    pub fn get(&self, signal: Signal) -> usize {
        self.counts.get(&signal).copied().unwrap_or(0)
    }

    /// Sum of the scored categories.
    pub fn score(&self) -> usize {
        self.counts
            .iter()
            .filter(|(signal, _)| signal.is_scored())
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signal, usize)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }
}

impl Default for SignalCounts {
    fn default() -> Self {
        Self::new()
    }
}

/// Mod loader ecosystem indicated by the metadata format found in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoaderKind {
    Forge,
    Fabric,
    Quilt,
    #[default]
    Unknown,
}

impl LoaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderKind::Forge => "forge",
            LoaderKind::Fabric => "fabric",
            LoaderKind::Quilt => "quilt",
            LoaderKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an archive was left out of the output set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    ArchiveOpenFailed,
    InfraKeyword,
    NoAssetsOrData,
    LowSignal { threshold: usize },
    HeuristicSkip,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::ArchiveOpenFailed => f.write_str("archive open failed"),
            ExclusionReason::InfraKeyword => f.write_str("infra/library keyword match"),
            ExclusionReason::NoAssetsOrData => f.write_str("no assets/data present"),
            ExclusionReason::LowSignal { threshold } => {
                write!(f, "low signal (score<{})", threshold)
            }
            ExclusionReason::HeuristicSkip => f.write_str("heuristic skip"),
        }
    }
}

/// Keep/exclude outcome for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Exclude(ExclusionReason),
}

impl Decision {
    pub fn is_keep(&self) -> bool {
        matches!(self, Decision::Keep)
    }

    pub fn reason(&self) -> Option<&ExclusionReason> {
        match self {
            Decision::Keep => None,
            Decision::Exclude(reason) => Some(reason),
        }
    }
}

/// Identity fields read from an archive's metadata entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModIdentity {
    pub mod_id: Option<String>,
    pub display_name: Option<String>,
}

impl ModIdentity {
    pub fn is_empty(&self) -> bool {
        self.mod_id.is_none() && self.display_name.is_none()
    }
}

/// Classification result for a single archive.
///
/// Built once by [`crate::services::Classifier::finalize`] (or [`ScanRecord::unreadable`])
/// and read-only afterwards. The signal score is derived from the counters on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    file_name: String,
    size_bytes: u64,
    counts: SignalCounts,
    has_data_root: bool,
    has_assets_root: bool,
    mod_id: String,
    display_name: String,
    loader: LoaderKind,
    infra_keyword: Option<String>,
    decision: Decision,
}

impl ScanRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        file_name: String,
        size_bytes: u64,
        counts: SignalCounts,
        has_data_root: bool,
        has_assets_root: bool,
        identity: ModIdentity,
        loader: LoaderKind,
        infra_keyword: Option<String>,
        decision: Decision,
    ) -> Self {
        Self {
            file_name,
            size_bytes,
            counts,
            has_data_root,
            has_assets_root,
            mod_id: identity.mod_id.unwrap_or_default(),
            display_name: identity.display_name.unwrap_or_default(),
            loader,
            infra_keyword,
            decision,
        }
    }

    /// Record for an archive that could not be opened.
    pub fn unreadable(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self::new(
            file_name.into(),
            size_bytes,
            SignalCounts::new(),
            false,
            false,
            ModIdentity::default(),
            LoaderKind::Unknown,
            None,
            Decision::Exclude(ExclusionReason::ArchiveOpenFailed),
        )
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn counts(&self) -> &SignalCounts {
        &self.counts
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.counts.get(signal)
    }

    pub fn score(&self) -> usize {
        self.counts.score()
    }

    pub fn has_data_root(&self) -> bool {
        self.has_data_root
    }

    pub fn has_assets_root(&self) -> bool {
        self.has_assets_root
    }

    pub fn mod_id(&self) -> &str {
        &self.mod_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn loader(&self) -> LoaderKind {
        self.loader
    }

    /// Keyword that flagged the archive as infrastructure, if any.
    pub fn infra_keyword(&self) -> Option<&str> {
        self.infra_keyword.as_deref()
    }

    pub fn is_infra(&self) -> bool {
        self.infra_keyword.is_some()
    }

    pub fn keep(&self) -> bool {
        self.decision.is_keep()
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    /// Exclusion reason text, empty when the archive is kept.
    pub fn reason(&self) -> String {
        self.decision
            .reason()
            .map(|r| r.to_string())
            .unwrap_or_default()
    }
}

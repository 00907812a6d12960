//! Structural signal extraction.
//!
//! [`SignalExtractor`] walks an archive listing once. Paths under `data/` and `assets/` are
//! matched against ordered rule tables (first match wins, one scored counter per entry);
//! known metadata entries are read for mod identity. Everything else is ignored.

use crate::models::config::DEFAULT_METADATA_LIMIT_BYTES;
use crate::models::{LoaderKind, ModIdentity, Signal, SignalCounts};
use crate::services::archive::OpenedArchive;
use crate::services::metadata::{MetadataFormat, MetadataReader};
use regex::Regex;

const DATA_ROOT: &str = "data/";
const ASSETS_ROOT: &str = "assets/";

/// Rules for entries under `data/<namespace>/`, in priority order.
///
/// Singular folder names are what newer game versions use.
const DATA_RULES: &[(&str, Signal)] = &[
    (r"^data/[^/]+/recipes?/", Signal::Recipes),
    (r"^data/[^/]+/loot_tables?/", Signal::Loot),
    (r"^data/[^/]+/advancements?/", Signal::Advancements),
    (r"^data/[^/]+/tags/", Signal::Tag),
    (r"^data/[^/]+/worldgen/biome/", Signal::WorldgenBiome),
    (r"^data/[^/]+/worldgen/configured_feature/", Signal::WorldgenFeature),
    (r"^data/[^/]+/worldgen/placed_feature/", Signal::WorldgenPlacedFeature),
    (r"^data/[^/]+/worldgen/structure/", Signal::WorldgenStructure),
    (r"^data/[^/]+/worldgen/structure_set/", Signal::WorldgenStructureSet),
    (r"^data/[^/]+/dimension_type/", Signal::WorldgenDimensionType),
    (r"^data/[^/]+/dimension/", Signal::WorldgenDimension),
];

/// Informational refinements applied to entries matched by the `tags/` rule.
const TAG_REFINEMENTS: &[(&str, Signal)] = &[
    (r"^data/[^/]+/tags/entity_types?/", Signal::TagEntity),
    (r"^data/[^/]+/tags/worldgen/biome/", Signal::TagBiome),
    (r"^data/[^/]+/tags/worldgen/structure/", Signal::TagStructure),
];

/// Rules for entries under `assets/<namespace>/`, in priority order.
const ASSET_RULES: &[(&str, Signal)] = &[
    (r"^assets/[^/]+/models/", Signal::Model),
    (r"^assets/[^/]+/lang/.+\.(?i:json)$", Signal::Lang),
    (r"^assets/[^/]+/sounds\.json$", Signal::Sound),
];

/// One entry of a rule table: a path pattern and the counter it feeds.
#[derive(Debug, Clone)]
pub struct PathRule {
    pattern: Regex,
    signal: Signal,
    refinements: Vec<(Regex, Signal)>,
}

impl PathRule {
    fn compile(pattern: &str, signal: Signal) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("Invalid path rule regex"),
            signal,
            refinements: Vec::new(),
        }
    }

    fn with_refinements(mut self, refinements: &[(&str, Signal)]) -> Self {
        self.refinements = refinements
            .iter()
            .map(|(p, s)| (Regex::new(p).expect("Invalid refinement regex"), *s))
            .collect();
        self
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Informational sub-categories that also apply to `path`.
    pub fn refinements_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = Signal> + 'a {
        self.refinements
            .iter()
            .filter(move |(p, _)| p.is_match(path))
            .map(|(_, s)| *s)
    }
}

/// Mutable state for one archive scan, finalized into a [`crate::models::ScanRecord`].
#[derive(Debug, Clone, Default)]
pub struct ScanAccumulator {
    counts: SignalCounts,
    has_data_root: bool,
    has_assets_root: bool,
    identity: ModIdentity,
    identity_loader: Option<LoaderKind>,
    first_descriptor: Option<LoaderKind>,
    metadata_failures: usize,
}

impl ScanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, signal: Signal) {
        self.counts.increment(signal);
    }

    pub fn mark_data_root(&mut self) {
        self.has_data_root = true;
    }

    pub fn mark_assets_root(&mut self) {
        self.has_assets_root = true;
    }

    /// Note that a metadata entry of `format` exists, whether or not it can be read.
    pub fn note_descriptor(&mut self, format: MetadataFormat) {
        self.first_descriptor.get_or_insert(format.loader());
    }

    /// Merge identity read from a metadata entry.
    ///
    /// Fields already set are kept; only empty fields are filled. The loader kind is the
    /// format of the first successful read.
    pub fn merge_identity(&mut self, format: MetadataFormat, identity: ModIdentity) {
        if self.identity.mod_id.is_none() {
            self.identity.mod_id = identity.mod_id;
        }
        if self.identity.display_name.is_none() {
            self.identity.display_name = identity.display_name;
        }
        self.identity_loader.get_or_insert(format.loader());
    }

    pub fn note_metadata_failure(&mut self) {
        self.metadata_failures += 1;
    }

    pub fn counts(&self) -> &SignalCounts {
        &self.counts
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

    pub fn identity(&self) -> &ModIdentity {
        &self.identity
    }

    pub fn mod_id(&self) -> Option<&str> {
        self.identity.mod_id.as_deref()
    }

    /// Loader of the first successful metadata read, else of the first descriptor seen.
    pub fn loader(&self) -> LoaderKind {
        self.identity_loader
            .or(self.first_descriptor)
            .unwrap_or(LoaderKind::Unknown)
    }

    pub fn metadata_failures(&self) -> usize {
        self.metadata_failures
    }

    pub(crate) fn into_parts(self) -> (SignalCounts, bool, bool, ModIdentity, LoaderKind) {
        let loader = self.loader();
        (
            self.counts,
            self.has_data_root,
            self.has_assets_root,
            self.identity,
            loader,
        )
    }
}

/// Walks archive listings and counts structural signals.
pub struct SignalExtractor {
    data_rules: Vec<PathRule>,
    asset_rules: Vec<PathRule>,
    metadata: MetadataReader,
    metadata_limit: u64,
}

impl SignalExtractor {
    /// Create an extractor with compiled rule tables.
    pub fn new(metadata_limit: u64) -> Self {
        let data_rules = DATA_RULES
            .iter()
            .map(|(pattern, signal)| {
                let rule = PathRule::compile(pattern, *signal);
                if *signal == Signal::Tag {
                    rule.with_refinements(TAG_REFINEMENTS)
                } else {
                    rule
                }
            })
            .collect();

        let asset_rules = ASSET_RULES
            .iter()
            .map(|(pattern, signal)| PathRule::compile(pattern, *signal))
            .collect();

        Self {
            data_rules,
            asset_rules,
            metadata: MetadataReader::new(),
            metadata_limit,
        }
    }

    /// First matching rule for a normalized entry path, if any.
    pub fn match_rule(&self, path: &str) -> Option<&PathRule> {
        let rules = if path.starts_with(DATA_ROOT) {
            &self.data_rules
        } else if path.starts_with(ASSETS_ROOT) {
            &self.asset_rules
        } else {
            return None;
        };
        rules.iter().find(|rule| rule.is_match(path))
    }

    /// Count signals in a single pass over the archive's entries.
    pub fn scan(&self, archive: &mut OpenedArchive) -> ScanAccumulator {
        let mut acc = ScanAccumulator::new();
        let (entries, reader) = archive.split_mut();

        for entry in entries.iter().filter(|e| !e.is_dir) {
            let path = entry.path.as_str();

            if path.starts_with(DATA_ROOT) {
                acc.mark_data_root();
                self.count_path(&mut acc, path);
            } else if path.starts_with(ASSETS_ROOT) {
                acc.mark_assets_root();
                self.count_path(&mut acc, path);
            } else if let Some(format) = MetadataFormat::from_entry_path(path) {
                acc.note_descriptor(format);

                let identity = reader
                    .read_text(entry, self.metadata_limit)
                    .map_err(|e| e.to_string())
                    .and_then(|text| {
                        self.metadata
                            .read(format, &text)
                            .map_err(|e| e.to_string())
                    });

                match identity {
                    Ok(identity) => acc.merge_identity(format, identity),
                    Err(reason) => {
                        tracing::debug!("Ignoring unreadable metadata {}: {}", path, reason);
                        acc.note_metadata_failure();
                    }
                }
            }
        }

        acc
    }

    fn count_path(&self, acc: &mut ScanAccumulator, path: &str) {
        if let Some(rule) = self.match_rule(path) {
            acc.record(rule.signal());
            for refinement in rule.refinements_for(path) {
                acc.record(refinement);
            }
        }
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_LIMIT_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(files: Vec<(&str, &str)>) -> ScanAccumulator {
        let mut archive = OpenedArchive::from_memory(files);
        SignalExtractor::default().scan(&mut archive)
    }

    #[test]
    fn test_data_rules_first_match() {
        let extractor = SignalExtractor::default();
        let cases = [
            ("data/ns/recipes/a.json", Signal::Recipes),
            ("data/ns/recipe/a.json", Signal::Recipes),
            ("data/ns/loot_tables/blocks/a.json", Signal::Loot),
            ("data/ns/loot_table/a.json", Signal::Loot),
            ("data/ns/advancements/a.json", Signal::Advancements),
            ("data/ns/tags/items/a.json", Signal::Tag),
            ("data/ns/tags/worldgen/biome/a.json", Signal::Tag),
            ("data/ns/worldgen/biome/a.json", Signal::WorldgenBiome),
            ("data/ns/worldgen/configured_feature/a.json", Signal::WorldgenFeature),
            ("data/ns/worldgen/placed_feature/a.json", Signal::WorldgenPlacedFeature),
            ("data/ns/worldgen/structure/a.json", Signal::WorldgenStructure),
            ("data/ns/worldgen/structure_set/a.json", Signal::WorldgenStructureSet),
            ("data/ns/dimension_type/a.json", Signal::WorldgenDimensionType),
            ("data/ns/dimension/a.json", Signal::WorldgenDimension),
        ];

        for (path, expected) in cases {
            let rule = extractor.match_rule(path).unwrap();
            assert_eq!(rule.signal(), expected, "path {}", path);
        }
    }

    #[test]
    fn test_asset_rules() {
        let extractor = SignalExtractor::default();
        assert_eq!(
            extractor
                .match_rule("assets/ns/models/block/a.json")
                .map(|r| r.signal()),
            Some(Signal::Model)
        );
        assert_eq!(
            extractor
                .match_rule("assets/ns/lang/en_us.json")
                .map(|r| r.signal()),
            Some(Signal::Lang)
        );
        assert_eq!(
            extractor
                .match_rule("assets/ns/sounds.json")
                .map(|r| r.signal()),
            Some(Signal::Sound)
        );
        // Legacy .lang files are not JSON
        assert!(extractor.match_rule("assets/ns/lang/en_us.lang").is_none());
        assert!(extractor.match_rule("assets/ns/textures/a.png").is_none());
        assert!(extractor.match_rule("com/example/Main.class").is_none());
    }

    #[test]
    fn test_scan_counts_and_roots() {
        let acc = scan(vec![
            ("data/ns/recipes/a.json", "{}"),
            ("data/ns/recipes/b.json", "{}"),
            ("data/ns/advancements/c.json", "{}"),
            ("data/ns/tags/entity_types/d.json", "{}"),
            ("data/ns/tags/worldgen/structure/e.json", "{}"),
            ("assets/ns/models/item/f.json", "{}"),
            ("assets/ns/textures/g.png", ""),
            ("com/example/Main.class", ""),
        ]);

        assert!(acc.has_data_root());
        assert!(acc.has_assets_root());
        assert_eq!(acc.counts().get(Signal::Recipes), 2);
        assert_eq!(acc.counts().get(Signal::Advancements), 1);
        assert_eq!(acc.counts().get(Signal::Tag), 2);
        assert_eq!(acc.counts().get(Signal::TagEntity), 1);
        assert_eq!(acc.counts().get(Signal::TagStructure), 1);
        assert_eq!(acc.counts().get(Signal::Model), 1);
        // recipes 2 + tag 2 + model 1
        assert_eq!(acc.score(), 5);
    }

    #[test]
    fn test_scan_skips_directory_entries() {
        let acc = scan(vec![("data/", ""), ("data/ns/recipes/", "")]);
        assert!(!acc.has_data_root());
        assert_eq!(acc.score(), 0);
    }

    #[test]
    fn test_data_root_without_matching_rule() {
        let acc = scan(vec![("data/ns/functions/tick.mcfunction", "say hi")]);
        assert!(acc.has_data_root());
        assert_eq!(acc.score(), 0);
    }

    #[test]
    fn test_scan_reads_identity() {
        let acc = scan(vec![(
            "fabric.mod.json",
            r#"{"id":"wilder","name":"Wilder Wild"}"#,
        )]);
        assert_eq!(acc.mod_id(), Some("wilder"));
        assert_eq!(acc.identity().display_name.as_deref(), Some("Wilder Wild"));
        assert_eq!(acc.loader(), LoaderKind::Fabric);
    }

    #[test]
    fn test_first_identity_source_wins() {
        let acc = scan(vec![
            ("META-INF/mods.toml", "modId=\"forgeside\"\n"),
            (
                "fabric.mod.json",
                r#"{"id":"fabricside","name":"Fabric Side"}"#,
            ),
        ]);
        assert_eq!(acc.mod_id(), Some("forgeside"));
        // Name was still empty, so the later source fills it
        assert_eq!(acc.identity().display_name.as_deref(), Some("Fabric Side"));
        assert_eq!(acc.loader(), LoaderKind::Forge);
    }

    #[test]
    fn test_broken_metadata_is_ignored() {
        let acc = scan(vec![
            ("quilt.mod.json", "garbage"),
            ("data/ns/recipes/a.json", "{}"),
            ("fabric.mod.json", r#"{"id":"later"}"#),
        ]);
        assert_eq!(acc.metadata_failures(), 1);
        assert_eq!(acc.mod_id(), Some("later"));
        assert_eq!(acc.loader(), LoaderKind::Fabric);
        assert_eq!(acc.counts().get(Signal::Recipes), 1);
    }

    #[test]
    fn test_loader_falls_back_to_first_descriptor() {
        let acc = scan(vec![("quilt.mod.json", "garbage")]);
        assert_eq!(acc.mod_id(), None);
        assert_eq!(acc.loader(), LoaderKind::Quilt);
    }

    #[test]
    fn test_nested_metadata_paths_are_not_metadata() {
        let acc = scan(vec![("META-INF/jars/inner/fabric.mod.json", r#"{"id":"inner"}"#)]);
        assert_eq!(acc.mod_id(), None);
        assert_eq!(acc.loader(), LoaderKind::Unknown);
    }
}

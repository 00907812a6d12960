use modsieve::models::{ExclusionReason, Signal, SignalCounts};
use modsieve::services::{InfraKeywords, OpenedArchive, PolicyInput, SignalExtractor, decide};
use proptest::prelude::*;

fn policy_input() -> impl Strategy<Value = PolicyInput> {
    (0usize..20, any::<bool>(), any::<bool>(), any::<bool>(), 0usize..10).prop_map(
        |(score, has_data_root, has_assets_root, infra, threshold)| PolicyInput {
            score,
            has_data_root,
            has_assets_root,
            infra,
            threshold,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        max_global_rejects: 65536,
        ..ProptestConfig::default()
    })]

    #[test]
    fn strong_signal_is_always_kept(input in policy_input()) {
        prop_assume!(input.score >= input.threshold);
        prop_assert!(decide(input).is_keep());
    }

    #[test]
    fn excluded_archives_carry_a_reason(input in policy_input()) {
        let decision = decide(input);
        prop_assert_eq!(decision.is_keep(), decision.reason().is_none());
    }

    #[test]
    fn rootless_weak_archives_are_excluded(input in policy_input()) {
        prop_assume!(input.score < input.threshold);
        prop_assume!(!input.has_data_root && !input.has_assets_root);

        let expected = if input.infra {
            ExclusionReason::InfraKeyword
        } else {
            ExclusionReason::NoAssetsOrData
        };
        let decision = decide(input);
        prop_assert_eq!(decision.reason(), Some(&expected));
    }

    #[test]
    fn weak_archives_with_content_follow_the_keyword(input in policy_input()) {
        prop_assume!(input.score < input.threshold);
        prop_assume!(input.has_data_root || input.has_assets_root);
        prop_assert_eq!(decide(input).is_keep(), !input.infra);
    }

    #[test]
    fn score_is_sum_of_scored_counters(
        ref hits in prop::collection::vec(0usize..Signal::ALL.len(), 0..60)
    ) {
        let mut counts = SignalCounts::new();
        for &i in hits {
            counts.increment(Signal::ALL[i]);
        }

        let expected = hits.iter().filter(|&&i| Signal::ALL[i].is_scored()).count();
        prop_assert_eq!(counts.score(), expected);
    }

    #[test]
    fn keyword_glued_to_alphanumerics_does_not_match(
        keyword in "[a-z]{3,8}",
        prefix in "[a-z0-9]{0,4}",
        suffix in "[a-z0-9]{0,4}"
    ) {
        prop_assume!(!prefix.is_empty() || !suffix.is_empty());
        let candidate = format!("{prefix}{keyword}{suffix}");

        let keywords = InfraKeywords::from_keywords([keyword.as_str()]);
        prop_assert!(!keywords.matches(&candidate));
    }

    #[test]
    fn keyword_between_separators_matches(
        keyword in "[a-z]{3,8}",
        prefix in "[a-z0-9]{1,6}",
        suffix in "[a-z0-9]{1,6}",
        sep in prop::sample::select(vec!["-", "_", ".", " "])
    ) {
        let candidate = format!("{prefix}{sep}{keyword}{sep}{suffix}");
        let keywords = InfraKeywords::from_keywords([keyword.as_str()]);
        prop_assert!(keywords.matches(&candidate));
        prop_assert!(keywords.matches(&candidate.to_uppercase()));
    }

    #[test]
    fn each_entry_feeds_at_most_one_scored_counter(
        ref recipes in prop::collection::vec("[a-z]{1,8}", 0..10),
        ref models in prop::collection::vec("[a-z]{1,8}", 0..10),
        ref classes in prop::collection::vec("[a-z]{1,8}", 0..10)
    ) {
        let files = recipes
            .iter()
            .enumerate()
            .map(|(i, n)| format!("data/ns/recipes/{n}{i}.json"))
            .chain(
                models
                    .iter()
                    .enumerate()
                    .map(|(i, n)| format!("assets/ns/models/item/{n}{i}.json")),
            )
            .chain(
                classes
                    .iter()
                    .enumerate()
                    .map(|(i, n)| format!("com/example/{n}{i}.class")),
            )
            .map(|path| (path, Vec::new()));

        let mut archive = OpenedArchive::from_memory(files);
        let acc = SignalExtractor::default().scan(&mut archive);

        prop_assert_eq!(acc.counts().get(Signal::Recipes), recipes.len());
        prop_assert_eq!(acc.counts().get(Signal::Model), models.len());
        prop_assert_eq!(acc.score(), recipes.len() + models.len());
        prop_assert_eq!(acc.has_data_root(), !recipes.is_empty());
        prop_assert_eq!(acc.has_assets_root(), !models.is_empty());
    }
}

//! Property-based tests for the scoring and adaptation core.
//!
//! Invariants under test:
//! - Style scores stay in [0, 1] under arbitrary EMA update sequences
//! - Forgetting probability is bounded and monotone in elapsed days
//! - Content scores stay in [0, 1] for arbitrary profiles/items/contexts
//! - Epsilon follows the multiplicative decay schedule exactly
//! - Online weight adjustment preserves the unit sum
//! - Ranking returns a bounded subset of the candidate set

use proptest::prelude::*;

use adaptive_backend_rust::als::agent::AdaptationAgent;
use adaptive_backend_rust::als::analyzer::StyleSignalAnalyzer;
use adaptive_backend_rust::als::config::{AgentParams, ScoreWeights};
use adaptive_backend_rust::als::forgetting::ForgettingModel;
use adaptive_backend_rust::als::recommend::{rank, ContentScorer};
use adaptive_backend_rust::als::types::{
    ContentItem, EnergyLevel, InteractionCounts, LearningProfile, SessionContext, SessionRecord,
};

fn arb_f64_0_1() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_content_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("video".to_string()),
        Just("diagram".to_string()),
        Just("audio".to_string()),
        Just("lecture".to_string()),
        Just("interactive".to_string()),
        Just("text".to_string()),
        Just("simulation".to_string()),
        Just("podcast".to_string()),
    ]
}

fn arb_session() -> impl Strategy<Value = SessionRecord> {
    (
        arb_content_type(),
        arb_f64_0_1(),
        arb_f64_0_1(),
        arb_f64_0_1(),
        (0u64..=7200u64),
        any::<bool>(),
        (0i32..=5i32),
        (0i32..=8i32),
    )
        .prop_map(
            |(
                content_type,
                performance,
                engagement,
                difficulty,
                duration,
                note_taking,
                audio_replays,
                interactive_elements,
            )| SessionRecord {
                content_id: "c".to_string(),
                content_type,
                performance,
                engagement,
                difficulty,
                duration_secs: duration as f64,
                interactions: InteractionCounts {
                    note_taking,
                    audio_replays,
                    interactive_elements,
                },
                ..SessionRecord::default()
            },
        )
}

fn arb_item(id: usize) -> impl Strategy<Value = ContentItem> {
    (
        arb_content_type(),
        arb_f64_0_1(),
        (1u64..=120u64),
        (0i32..=10i32),
        (0i32..=5i32),
    )
        .prop_map(
            move |(content_type, difficulty, duration, interactive, gamification)| ContentItem {
                id: format!("item_{id}"),
                content_type,
                difficulty,
                estimated_duration_min: duration as f64,
                interactive_elements: interactive,
                gamification_elements: gamification,
                topics: vec![format!("topic_{}", id % 4)],
                ..ContentItem::default()
            },
        )
}

fn arb_profile() -> impl Strategy<Value = LearningProfile> {
    (
        arb_f64_0_1(),
        arb_f64_0_1(),
        arb_f64_0_1(),
        arb_f64_0_1(),
        any::<bool>(),
    )
        .prop_map(|(visual, auditory, kinesthetic, skill, sensitive)| {
            let mut profile = LearningProfile::default();
            profile.style_scores.visual = visual;
            profile.style_scores.auditory = auditory;
            profile.style_scores.kinesthetic = kinesthetic;
            profile.primary_style = profile.style_scores.primary();
            profile.skill_level = skill;
            profile.accommodations.sensitive_to_distractions = sensitive;
            profile
        })
}

proptest! {
    #[test]
    fn ema_updates_keep_style_scores_in_unit_interval(
        sessions in proptest::collection::vec(arb_session(), 1..40)
    ) {
        let analyzer = StyleSignalAnalyzer::default();
        let mut profile = LearningProfile::default();

        for session in &sessions {
            analyzer.update_profile(&mut profile, session);

            for value in [
                profile.style_scores.visual,
                profile.style_scores.auditory,
                profile.style_scores.kinesthetic,
            ] {
                prop_assert!((0.0..=1.0).contains(&value), "style score out of bounds: {value}");
            }
            prop_assert!((0.0..=1.0).contains(&profile.confidence));
        }
    }

    #[test]
    fn aggregate_profile_is_always_bounded(
        sessions in proptest::collection::vec(arb_session(), 0..40)
    ) {
        let analyzer = StyleSignalAnalyzer::default();
        let profile = analyzer.aggregate_profile(&sessions);

        for value in [
            profile.style_scores.visual,
            profile.style_scores.auditory,
            profile.style_scores.kinesthetic,
        ] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        prop_assert!((0.0..=1.0).contains(&profile.confidence));
    }

    #[test]
    fn forgetting_probability_is_bounded_and_monotone(
        days_a in 0.0f64..365.0,
        days_b in 0.0f64..365.0,
        scores in proptest::collection::vec(arb_f64_0_1(), 0..10)
    ) {
        let model = ForgettingModel::default();
        let (early, late) = if days_a <= days_b { (days_a, days_b) } else { (days_b, days_a) };

        let p_early = model.probability(early, &scores);
        let p_late = model.probability(late, &scores);

        prop_assert!((0.0..=1.0).contains(&p_early));
        prop_assert!((0.0..=1.0).contains(&p_late));
        prop_assert!(p_late >= p_early - 1e-12, "forgetting not monotone: {p_early} > {p_late}");
    }

    #[test]
    fn content_scores_stay_in_unit_interval(
        profile in arb_profile(),
        item in arb_item(0),
        time_available in 1u64..=180u64,
        performance in proptest::option::of(arb_f64_0_1()),
        energy_pick in 0u8..3u8,
    ) {
        let scorer = ContentScorer::default();
        let context = SessionContext {
            time_available_min: time_available as f64,
            current_performance: performance,
            energy: match energy_pick {
                0 => Some(EnergyLevel::Low),
                1 => Some(EnergyLevel::High),
                _ => None,
            },
        };

        let bare = scorer.score(&profile, &item, None);
        let contextual = scorer.score(&profile, &item, Some(&context));
        prop_assert!((0.0..=1.0).contains(&bare));
        prop_assert!((0.0..=1.0).contains(&contextual));
    }

    #[test]
    fn epsilon_matches_decay_formula(episodes in 0i32..400) {
        let mut agent = AdaptationAgent::new(AgentParams::default());
        for _ in 0..episodes {
            agent.finish_episode(0.5);
        }
        let expected = (0.1 * 0.995f64.powi(episodes)).max(0.01);
        prop_assert!((agent.epsilon() - expected).abs() < 1e-9);
    }

    #[test]
    fn feedback_keeps_weights_normalized(ratings in proptest::collection::vec(1i32..=5, 1..60)) {
        let mut scorer = ContentScorer::new(ScoreWeights::default());
        for rating in ratings {
            scorer.apply_feedback(rating);
            prop_assert!((scorer.weights().sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ranking_returns_a_bounded_subset(
        profile in arb_profile(),
        k in 1usize..8,
    ) {
        let scorer = ContentScorer::default();
        let items: Vec<ContentItem> = (0..12)
            .map(|i| ContentItem {
                id: format!("item_{i}"),
                content_type: if i % 2 == 0 { "video".to_string() } else { "text".to_string() },
                difficulty: (i as f64) / 12.0,
                topics: vec![format!("topic_{}", i % 4)],
                ..ContentItem::default()
            })
            .collect();

        let recs = rank(&scorer, &profile, &items, None, k, 2);
        prop_assert!(recs.len() <= k);

        let mut seen = std::collections::HashSet::new();
        for rec in &recs {
            prop_assert!(items.iter().any(|i| i.id == rec.content_id));
            prop_assert!(seen.insert(rec.content_id.clone()), "duplicate recommendation");
            prop_assert!((0.0..=1.0).contains(&rec.score));
        }
    }
}

//! Ranking with a greedy diversity pass.
//!
//! The filter walks the score-sorted candidates and accepts unconditionally
//! until half the target count is filled, then only items that add at most
//! one already-used topic and a content type not yet used. Greedy by design,
//! not globally-optimal diversity.

use std::collections::HashSet;

use crate::als::recommend::explain;
use crate::als::recommend::scorer::ContentScorer;
use crate::als::types::{ContentItem, LearningProfile, Recommendation, SessionContext};

/// Score, diversify, and explain up to `k` recommendations from the
/// candidate pool. `pool_factor` bounds how deep into the score-sorted list
/// the diversity filter may look.
pub fn rank(
    scorer: &ContentScorer,
    profile: &LearningProfile,
    items: &[ContentItem],
    context: Option<&SessionContext>,
    k: usize,
    pool_factor: usize,
) -> Vec<Recommendation> {
    if items.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(&ContentItem, f64)> = items
        .iter()
        .map(|item| (item, scorer.score(profile, item, context)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k * pool_factor.max(1));

    diversity_filter(&scored, k)
        .into_iter()
        .map(|(item, score)| Recommendation {
            content_id: item.id.clone(),
            score,
            reasoning: explain::build_reasoning(scorer, profile, item, score),
            estimated_benefit: explain::estimate_benefit(scorer, profile, item),
            confidence: explain::recommendation_confidence(profile),
        })
        .collect()
}

fn diversity_filter<'a>(
    scored: &[(&'a ContentItem, f64)],
    k: usize,
) -> Vec<(&'a ContentItem, f64)> {
    let mut chosen: Vec<(&ContentItem, f64)> = Vec::with_capacity(k);
    let mut used_topics: HashSet<&str> = HashSet::new();
    let mut used_types: HashSet<&str> = HashSet::new();

    for &(item, score) in scored {
        let topic_overlap = item
            .topics
            .iter()
            .filter(|t| used_topics.contains(t.as_str()))
            .count();
        let type_used = used_types.contains(item.content_type.as_str());

        if chosen.len() < k / 2 || (topic_overlap <= 1 && !type_used) {
            for topic in &item.topics {
                used_topics.insert(topic.as_str());
            }
            used_types.insert(item.content_type.as_str());
            chosen.push((item, score));

            if chosen.len() >= k {
                break;
            }
        }
    }

    chosen
}

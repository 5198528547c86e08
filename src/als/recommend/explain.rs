//! Rule-based recommendation reasoning.

use std::collections::HashSet;

use crate::als::recommend::scorer::ContentScorer;
use crate::als::types::{ConfidenceBucket, ContentItem, LearningProfile, Reasoning};

/// Reasoning shown alongside a recommendation: one primary reason, a list of
/// supporting factors, and a coarse confidence bucket.
pub fn build_reasoning(
    scorer: &ContentScorer,
    profile: &LearningProfile,
    item: &ContentItem,
    score: f64,
) -> Reasoning {
    let style_match = scorer.style_match_score(profile, item);
    let gap_set: HashSet<&str> = profile.knowledge_gaps.iter().map(String::as_str).collect();
    let covers_gap = item.topics.iter().any(|t| gap_set.contains(t.as_str()));

    let primary_reason = if style_match > 0.8 {
        format!(
            "Matches your {} learning style",
            profile.primary_style.as_str()
        )
    } else if covers_gap {
        "Addresses your knowledge gaps".to_string()
    } else {
        "Recommended based on your recent learning patterns".to_string()
    };

    let mut supporting_factors = Vec::new();
    if item.difficulty > 0.7 {
        supporting_factors.push("Provides appropriate challenge".to_string());
    }
    if item.interactive_elements > 0 {
        supporting_factors.push("Includes interactive elements".to_string());
    }
    if profile.accommodations.prefers_structure && item.structured {
        supporting_factors.push("Well-structured content".to_string());
    }

    Reasoning {
        primary_reason,
        supporting_factors,
        confidence_level: ConfidenceBucket::from_score(score),
    }
}

/// Expected learning benefit in [0, 1]: gap coverage, skill advancement
/// headroom, style-driven retention, and an engagement term.
pub fn estimate_benefit(
    scorer: &ContentScorer,
    profile: &LearningProfile,
    item: &ContentItem,
) -> f64 {
    let mut benefit = 0.0;

    if !profile.knowledge_gaps.is_empty() && !item.topics.is_empty() {
        let gap_set: HashSet<&str> = profile.knowledge_gaps.iter().map(String::as_str).collect();
        let overlap = item
            .topics
            .iter()
            .filter(|t| gap_set.contains(t.as_str()))
            .count();
        benefit += (overlap as f64 / gap_set.len() as f64) * 0.4;
    }

    if item.difficulty > profile.skill_level {
        benefit += (item.difficulty - profile.skill_level).min(0.3);
    }

    benefit += scorer.style_match_score(profile, item) * 0.2;
    benefit += scorer.predict_engagement(profile, item) * 0.1;

    benefit.min(1.0)
}

/// Confidence in the recommendation itself: profile maturity blended with
/// how much completed-content history backs the estimate.
pub fn recommendation_confidence(profile: &LearningProfile) -> f64 {
    let history_factor = (profile.completed_content.len() as f64 / 10.0).min(1.0);
    ((profile.confidence + history_factor) / 2.0).clamp(0.0, 1.0)
}

//! Multi-factor content scoring.
//!
//! Five independently computed sub-scores combined through a renormalized
//! weight vector, with an optional second pass that adjusts for the live
//! session context.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::als::config::ScoreWeights;
use crate::als::types::{ContentItem, EnergyLevel, LearningProfile, SessionContext};

/// Content types that demand physical involvement from the learner.
fn is_physically_demanding(content_type: &str) -> bool {
    matches!(content_type, "interactive" | "hands_on")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentScorer {
    weights: ScoreWeights,
}

impl ContentScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        let mut weights = weights;
        weights.normalize();
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Composite score in [0, 1] for one candidate item.
    pub fn score(
        &self,
        profile: &LearningProfile,
        item: &ContentItem,
        context: Option<&SessionContext>,
    ) -> f64 {
        let style = self.style_match_score(profile, item);
        let difficulty = Self::difficulty_score(profile.skill_level, item.difficulty);
        let gaps = Self::gap_relevance(&profile.knowledge_gaps, &item.topics);
        let engagement = self.predict_engagement(profile, item);
        let novelty = Self::novelty(profile, item);

        let mut total = style * self.weights.style_match
            + difficulty * self.weights.difficulty_fit
            + gaps * self.weights.gap_relevance
            + engagement * self.weights.engagement
            + novelty * self.weights.novelty;

        if let Some(ctx) = context {
            total = Self::apply_session_context(total, ctx, item);
        }

        total.clamp(0.0, 1.0)
    }

    pub fn style_match_score(&self, profile: &LearningProfile, item: &ContentItem) -> f64 {
        profile.primary_style.content_affinity(&item.content_type)
    }

    /// Zone-of-proximal-development heuristic: optimal difficulty sits just
    /// above the learner's level, with fixed step-downs past 0.1/0.2/0.3.
    pub fn difficulty_score(user_level: f64, content_difficulty: f64) -> f64 {
        let optimal = user_level + 0.1;
        let diff = (content_difficulty - optimal).abs();

        if diff <= 0.1 {
            1.0
        } else if diff <= 0.2 {
            0.8
        } else if diff <= 0.3 {
            0.6
        } else {
            0.3
        }
    }

    /// Fraction of the learner's knowledge gaps the item addresses. Neutral
    /// 0.5 when either side is empty, 0.2 floor when gaps exist but nothing
    /// overlaps.
    pub fn gap_relevance(user_gaps: &[String], topics: &[String]) -> f64 {
        if user_gaps.is_empty() || topics.is_empty() {
            return 0.5;
        }

        let gap_set: HashSet<&str> = user_gaps.iter().map(String::as_str).collect();
        let overlap = topics
            .iter()
            .filter(|t| gap_set.contains(t.as_str()))
            .collect::<HashSet<_>>()
            .len();

        if overlap == 0 {
            return 0.2;
        }

        (overlap as f64 / gap_set.len() as f64).min(1.0)
    }

    /// Predicted engagement from content features, dampened for
    /// distraction-sensitive learners and nudged by historical performance on
    /// similar material.
    pub fn predict_engagement(&self, profile: &LearningProfile, item: &ContentItem) -> f64 {
        let mut multimedia = item.media_types.len() as f64 * 0.1;
        if profile.accommodations.sensitive_to_distractions {
            multimedia *= 0.5;
        }

        let base = item.interactive_elements as f64 * 0.3
            + multimedia
            + item.personalization * 0.2
            + item.social_features as f64 * 0.1
            + item.gamification_elements as f64 * 0.2;

        (base + profile.avg_performance * 0.1).min(1.0)
    }

    /// Novelty relative to completed material: 0 for repeats, 1 for fresh
    /// users, otherwise the unexplored fraction of the item's topics.
    pub fn novelty(profile: &LearningProfile, item: &ContentItem) -> f64 {
        if profile.completed_content.iter().any(|id| id == &item.id) {
            return 0.0;
        }
        if profile.completed_topics.is_empty() {
            return 1.0;
        }
        if item.topics.is_empty() {
            return 0.5;
        }

        let completed: HashSet<&str> = profile.completed_topics.iter().map(String::as_str).collect();
        let overlap = item
            .topics
            .iter()
            .filter(|t| completed.contains(t.as_str()))
            .count();

        1.0 - overlap as f64 / item.topics.len() as f64
    }

    fn apply_session_context(base: f64, ctx: &SessionContext, item: &ContentItem) -> f64 {
        let mut adjusted = base;

        if item.estimated_duration_min > ctx.time_available_min {
            adjusted *= 0.3;
        } else if item.estimated_duration_min <= ctx.time_available_min * 0.5 {
            adjusted *= 1.1;
        }

        if let Some(performance) = ctx.current_performance {
            if performance < 0.5 && item.difficulty > 0.6 {
                adjusted *= 0.7;
            } else if performance > 0.8 && item.difficulty < 0.4 {
                adjusted *= 0.8;
            }
        }

        match ctx.energy {
            Some(EnergyLevel::Low) if is_physically_demanding(&item.content_type) => {
                adjusted *= 0.8;
            }
            Some(EnergyLevel::High) if is_physically_demanding(&item.content_type) => {
                adjusted *= 1.2;
            }
            _ => {}
        }

        adjusted
    }

    /// Online weight adjustment from explicit recommendation feedback: all
    /// weights drift together, stay within [0.05, 0.5], then renormalize.
    pub fn apply_feedback(&mut self, rating: i32) {
        let adjustment = if rating >= 4 {
            0.01
        } else if rating <= 2 {
            -0.01
        } else {
            return;
        };

        self.weights.style_match = (self.weights.style_match + adjustment).clamp(0.05, 0.5);
        self.weights.difficulty_fit = (self.weights.difficulty_fit + adjustment).clamp(0.05, 0.5);
        self.weights.gap_relevance = (self.weights.gap_relevance + adjustment).clamp(0.05, 0.5);
        self.weights.engagement = (self.weights.engagement + adjustment).clamp(0.05, 0.5);
        self.weights.novelty = (self.weights.novelty + adjustment).clamp(0.05, 0.5);
        self.weights.normalize();
    }
}

impl Default for ContentScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}
